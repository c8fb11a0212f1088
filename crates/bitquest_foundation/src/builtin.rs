//! Identity of the host-exposed builtins.
//!
//! Scripts can only reach the callables enumerated here. The behaviour of
//! each builtin lives in the language crate; this enum is just the closed
//! capability list plus the metadata needed to describe a call.

use std::fmt;

use crate::types::Arity;

/// A builtin callable reachable from scripts by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `print(*values)` - sends one message to the host's speech display.
    Print,
    /// `input(prompt="")` - asks the host for a line of text.
    Input,
    /// `abs(x)`
    Abs,
    /// `min(a, b, ...)` or `min(iterable)`
    Min,
    /// `max(a, b, ...)` or `max(iterable)`
    Max,
    /// `len(s)` for strings and ranges.
    Len,
    /// `str(x)`
    Str,
    /// `int(x)`
    Int,
    /// `float(x)`
    Float,
    /// `round(x, ndigits=None)`
    Round,
    /// `range(stop)`, `range(start, stop)`, `range(start, stop, step)`
    Range,
}

impl Builtin {
    /// Every builtin, in a stable order.
    pub const ALL: [Self; 11] = [
        Self::Print,
        Self::Input,
        Self::Abs,
        Self::Min,
        Self::Max,
        Self::Len,
        Self::Str,
        Self::Int,
        Self::Float,
        Self::Round,
        Self::Range,
    ];

    /// Returns the name scripts use to refer to this builtin.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Input => "input",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Len => "len",
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Round => "round",
            Self::Range => "range",
        }
    }

    /// Looks up a builtin by its script name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Returns the accepted argument counts.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Print => Arity::Variadic(0),
            Self::Input => Arity::Range(0, 1),
            Self::Abs | Self::Len | Self::Str | Self::Int | Self::Float => Arity::Exact(1),
            Self::Min | Self::Max => Arity::Variadic(1),
            Self::Round => Arity::Range(1, 2),
            Self::Range => Arity::Range(1, 3),
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
