//! Error types for the BitQuest interpreter.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every failure, whether found while tokenizing or while executing, is
//! terminal for the current run and surfaces as an [`Error`].

use std::fmt;

use thiserror::Error;

use crate::types::{Arity, Type};

/// Result alias used throughout the interpreter.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for interpreter operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Where in the program the error occurred (runtime errors only).
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a syntax error at the given position.
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: u32, column: u32, context: String) -> Self {
        Self::new(ErrorKind::SyntaxError {
            message: message.into(),
            line,
            column,
            context,
        })
    }

    /// Creates a name resolution error.
    #[must_use]
    pub fn name_error(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameError(name.into()))
    }

    /// Creates a stack underflow error for the given opcode mnemonic.
    #[must_use]
    pub fn stack_underflow(opcode: &'static str) -> Self {
        Self::new(ErrorKind::StackUnderflow { opcode })
    }

    /// Creates an arithmetic error.
    #[must_use]
    pub fn arithmetic(fault: ArithmeticFault) -> Self {
        Self::new(ErrorKind::Arithmetic(fault))
    }

    /// Creates a call error.
    #[must_use]
    pub fn call(fault: CallFault) -> Self {
        Self::new(ErrorKind::Call(fault))
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: &'static str, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an arity mismatch error for a named callable.
    #[must_use]
    pub fn arity_mismatch(name: &'static str, expected: Arity, actual: usize) -> Self {
        Self::call(CallFault::ArityMismatch {
            name,
            expected,
            actual,
        })
    }

    /// Creates an invalid argument error for a named callable.
    #[must_use]
    pub fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::call(CallFault::InvalidArgument {
            name,
            message: message.into(),
        })
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an error for a script file that could not be read.
    #[must_use]
    pub fn io(path: impl Into<String>, source: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io {
            path: path.into(),
            message: source.to_string(),
        })
    }

    /// Creates an internal error (an executor/compiler mismatch).
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns the taxonomy name shown to the student.
    #[must_use]
    pub fn category(&self) -> &'static str {
        self.kind.category()
    }

    /// Returns the 1-based source line this error points at, if known.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match &self.kind {
            ErrorKind::SyntaxError { line, .. } => Some(*line),
            _ => self.context.as_ref().and_then(|ctx| ctx.line),
        }
    }

    /// Returns true if this error was raised before execution started.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::SyntaxError { .. })
    }

    /// Returns true if this error points at an interpreter defect rather
    /// than a mistake in the student's script.
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::StackUnderflow { .. } | ErrorKind::Internal(_)
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// Malformed source detected during tokenization.
    #[error("line {line}:{column}: {message}")]
    SyntaxError {
        /// Description of the problem.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// Identifier not bound in the local or builtin tables.
    #[error("name '{0}' is not defined")]
    NameError(String),

    /// An instruction needed more values than the stack held.
    #[error("stack underflow in {opcode}")]
    StackUnderflow {
        /// Mnemonic of the instruction that underflowed.
        opcode: &'static str,
    },

    /// The dispatcher reached an instruction it does not implement.
    #[error("unknown opcode {opcode}{}", .arg.as_ref().map(|a| format!(" {a}")).unwrap_or_default())]
    UnknownOpcode {
        /// The unrecognised mnemonic.
        opcode: String,
        /// Its operand text, if any.
        arg: Option<String>,
    },

    /// Division by zero, overflow, or unsupported operand types.
    #[error("{0}")]
    Arithmetic(ArithmeticFault),

    /// Calling a non-callable value, or a bad call to a builtin.
    #[error("{0}")]
    Call(CallFault),

    /// A value of the wrong type outside of arithmetic.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// Description of what was expected.
        expected: &'static str,
        /// The type actually encountered.
        actual: Type,
    },

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// A script file could not be read.
    #[error("cannot read {path}: {message}")]
    Io {
        /// The path as given.
        path: String,
        /// The operating system's description of the failure.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the taxonomy name for this kind.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::SyntaxError { .. } => "SyntaxError",
            Self::NameError(_) => "NameError",
            Self::StackUnderflow { .. } => "StackUnderflow",
            Self::UnknownOpcode { .. } => "UnknownOpcode",
            Self::Arithmetic(_) => "ArithmeticError",
            Self::Call(_) => "CallError",
            Self::TypeMismatch { .. } => "TypeError",
            Self::LimitExceeded(_) => "LimitExceeded",
            Self::Io { .. } => "IoError",
            Self::Internal(_) => "InternalError",
        }
    }
}

/// Failures of arithmetic and comparison instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticFault {
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer result does not fit in 64 bits.
    #[error("integer overflow in '{op}'")]
    Overflow {
        /// The operator symbol.
        op: &'static str,
    },

    /// The operator is not defined for this pair of types.
    #[error("unsupported operand types for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        /// The operator symbol.
        op: &'static str,
        /// Type of the left operand.
        left: Type,
        /// Type of the right operand.
        right: Type,
    },

    /// The unary operator is not defined for this type.
    #[error("bad operand type for unary {op}: '{operand}'")]
    UnsupportedOperand {
        /// The operator symbol.
        op: &'static str,
        /// Type of the operand.
        operand: Type,
    },
}

/// Failures of `CALL_FUNCTION`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFault {
    /// The callee is not callable.
    #[error("'{0}' object is not callable")]
    NotCallable(Type),

    /// Wrong number of arguments.
    #[error("{name}() takes {expected} argument(s) but {actual} were given")]
    ArityMismatch {
        /// Name of the callable.
        name: &'static str,
        /// Accepted argument counts.
        expected: Arity,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// An argument had an acceptable type but an unusable value.
    #[error("{name}(): {message}")]
    InvalidArgument {
        /// Name of the callable.
        name: &'static str,
        /// What was wrong with the argument.
        message: String,
    },

    /// The host does not provide this capability.
    #[error("{capability}() is not available here")]
    HostUnavailable {
        /// Name of the missing capability.
        capability: &'static str,
    },
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// The run executed more instructions than its step budget.
    MaxSteps {
        /// The configured limit.
        limit: u64,
    },
    /// The value stack grew past its configured depth.
    MaxStackDepth {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxSteps { limit } => {
                write!(f, "step budget ({limit}) exhausted; is there an endless loop?")
            }
            Self::MaxStackDepth { limit } => {
                write!(f, "max stack depth ({limit}) exceeded")
            }
        }
    }
}

/// Context about where a runtime error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// 1-based source line of the failing instruction.
    pub line: Option<u32>,
    /// Index of the failing instruction in the program.
    pub offset: Option<usize>,
    /// Mnemonic of the failing instruction.
    pub opcode: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source line.
    #[must_use]
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the instruction offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the opcode mnemonic.
    #[must_use]
    pub fn with_opcode(mut self, opcode: impl Into<String>) -> Self {
        self.opcode = Some(opcode.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(line) = self.line {
            write!(f, "line {line}")?;
            wrote = true;
        }
        if let Some(opcode) = &self.opcode {
            if wrote {
                write!(f, ", ")?;
            }
            write!(f, "in {opcode}")?;
            wrote = true;
        }
        if let Some(offset) = self.offset {
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "@{offset}")?;
        }
        Ok(())
    }
}
