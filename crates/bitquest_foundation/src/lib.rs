//! Core types for the BitQuest script interpreter.
//!
//! This crate provides:
//! - [`Value`] - Runtime values held on the VM stack and in name tables
//! - [`Type`] and [`Arity`] - Type and arity descriptors used in errors
//! - [`Builtin`] - The closed set of host-exposed callables
//! - [`Error`] - The error taxonomy reported to the host
//! - [`VmConfig`] - Execution limits (step budget, stack depth)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod builtin;
mod config;
mod error;
mod types;
mod value;

pub use builtin::Builtin;
pub use config::VmConfig;
pub use error::{
    ArithmeticFault, CallFault, Error, ErrorContext, ErrorKind, Result, SemanticLimit,
};
pub use types::{Arity, Type};
pub use value::{IterState, RangeValue, Value, format_float};
