//! Runtime values of the BitQuest script language.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::builtin::Builtin;
use crate::types::Type;

/// A runtime value.
///
/// Values are cheaply cloneable; strings share their storage.
#[derive(Clone)]
pub enum Value {
    /// The "no value" sentinel (`None`).
    None,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    Str(Arc<str>),
    /// A host-provided callable.
    Builtin(Builtin),
    /// A `range(...)` object.
    Range(RangeValue),
    /// Iteration state pushed by `GET_ITER` and advanced by `FOR_ITER`.
    Iter(IterState),
}

/// An arithmetic progression produced by `range(...)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RangeValue {
    /// First value.
    pub start: i64,
    /// Exclusive bound.
    pub stop: i64,
    /// Non-zero increment.
    pub step: i64,
}

impl RangeValue {
    /// Creates a range, returning `None` if `step` is zero.
    #[must_use]
    pub const fn new(start: i64, stop: i64, step: i64) -> Option<Self> {
        if step == 0 {
            None
        } else {
            Some(Self { start, stop, step })
        }
    }

    /// Returns the number of values the range yields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn len(&self) -> usize {
        let (start, stop, step) = (
            i128::from(self.start),
            i128::from(self.stop),
            i128::from(self.step),
        );
        let count = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && start > stop {
            (start - stop - 1) / (-step) + 1
        } else {
            0
        };
        count as usize
    }

    /// Returns true if the range yields nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts iterating over this range.
    #[must_use]
    pub const fn iter(&self) -> IterState {
        IterState::Range {
            next: self.start,
            stop: self.stop,
            step: self.step,
        }
    }
}

/// The position of an in-progress iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IterState {
    /// Iterating a range.
    Range {
        /// Next value to yield.
        next: i64,
        /// Exclusive bound.
        stop: i64,
        /// Non-zero increment.
        step: i64,
    },
    /// Iterating the characters of a string.
    Chars {
        /// The string being iterated.
        text: Arc<str>,
        /// Byte offset of the next character.
        offset: usize,
    },
}

impl IterState {
    /// Starts iterating over the characters of `text`.
    #[must_use]
    pub fn chars(text: Arc<str>) -> Self {
        Self::Chars { text, offset: 0 }
    }

    /// Advances the iteration, returning the next item.
    pub fn advance(&mut self) -> Option<Value> {
        match self {
            Self::Range { next, stop, step } => {
                let more = if *step > 0 { *next < *stop } else { *next > *stop };
                if !more {
                    return None;
                }
                let current = *next;
                // On overflow the range cannot continue past i64 anyway.
                *next = next.checked_add(*step).unwrap_or(*stop);
                Some(Value::Int(current))
            }
            Self::Chars { text, offset } => {
                let c = text[*offset..].chars().next()?;
                *offset += c.len_utf8();
                Some(Value::from(c.to_string()))
            }
        }
    }
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub const fn value_type(&self) -> Type {
        match self {
            Self::None => Type::NoneType,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::Str,
            Self::Builtin(_) => Type::Builtin,
            Self::Range(_) => Type::Range,
            Self::Iter(_) => Type::Iterator,
        }
    }

    /// Returns true if this value is `None`.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the truthiness used by conditionals and `not`.
    ///
    /// `None`, `False`, zero, the empty string and the empty range are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Range(r) => !r.is_empty(),
            Self::Builtin(_) | Self::Iter(_) => true,
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    ///
    /// Note: Converting large i64 values to f64 may lose precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a builtin.
    #[must_use]
    pub const fn as_builtin(&self) -> Option<Builtin> {
        match self {
            Self::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the source-like representation (strings are quoted).
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => quote_str(s),
            other => other.to_string(),
        }
    }
}

/// Formats a float the way the student's editor expects (`14.0`, `0.5`, `1e+16`).
#[must_use]
pub fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = n.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{n:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => formatted,
        };
    }
    if n.fract() == 0.0 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

// Numbers compare across int/float; otherwise values are equal only to
// values of the same type.
impl PartialEq for Value {
    #[allow(clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Range(a), Self::Range(b)) => a == b,
            (Self::Iter(a), Self::Iter(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            // Cross-type numeric comparison intentionally loses precision for large i64
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Str(a), Self::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => f.write_str(&format_float(*n)),
            Self::Str(s) => f.write_str(s),
            Self::Builtin(b) => write!(f, "<built-in function {b}>"),
            Self::Range(r) if r.step == 1 => write!(f, "range({}, {})", r.start, r.stop),
            Self::Range(r) => write!(f, "range({}, {}, {})", r.start, r.stop, r.step),
            Self::Iter(IterState::Range { .. }) => write!(f, "<range_iterator>"),
            Self::Iter(IterState::Chars { .. }) => write!(f, "<str_iterator>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<Builtin> for Value {
    fn from(b: Builtin) -> Self {
        Self::Builtin(b)
    }
}

impl From<RangeValue> for Value {
    fn from(r: RangeValue) -> Self {
        Self::Range(r)
    }
}
