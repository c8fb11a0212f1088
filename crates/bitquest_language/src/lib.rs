//! Lexer, compiler, and bytecode VM for BitQuest scripts.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of script source, with indentation tokens
//! - [`compile`] - Single-pass compilation of editor lines to a [`Program`]
//! - [`assemble`] - Loading a `MNEMONIC [operand]` listing into a [`Program`]
//! - [`Vm`] - Stack-based bytecode interpreter
//! - [`Host`] and [`Builtins`] - The binding surface scripts run against
//!
//! A host typically tokenizes and runs in two steps so it can report the
//! two outcomes separately:
//!
//! ```
//! use bitquest_language::{Builtins, RecordingHost, Vm, compile};
//!
//! let program = compile(&["for i in range(2):", "    print('woof', i)"]).unwrap();
//! let mut host = RecordingHost::new();
//! Vm::default().run(&program, &Builtins::standard(), &mut host).unwrap();
//! assert_eq!(host.messages(), ["woof 0", "woof 1"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod assemble;
mod compiler;
mod lexer;
mod opcode;
mod program;
mod span;
mod token;
mod vm;

pub use assemble::assemble;
pub use compiler::{compile, compile_source};
pub use lexer::Lexer;
pub use opcode::{Bytecode, CompareOp, Instruction, Opcode};
pub use program::Program;
pub use span::Span;
pub use token::{Token, TokenKind};
pub use vm::{Builtins, Host, NameTable, RecordingHost, ValueStack, Vm};

use bitquest_foundation::{Result, Value};

/// Compiles and runs a script with the default limits and every builtin.
///
/// # Errors
/// Returns the `SyntaxError` from compilation, or the first runtime error.
pub fn run_lines<S: AsRef<str>>(lines: &[S], host: &mut dyn Host) -> Result<Value> {
    let program = compile(lines)?;
    Vm::default().run(&program, &Builtins::standard(), host)
}
