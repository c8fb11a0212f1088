//! BitQuest - the script interpreter that drives BIT the robot dog
//!
//! This crate re-exports all layers of the BitQuest interpreter for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: bitquest_runtime    - Console host, editor REPL, CLI
//! Layer 1: bitquest_language   - Lexer, compiler, assembler, bytecode VM, host bindings
//! Layer 0: bitquest_foundation - Core types (Value, Builtin, Error, VmConfig)
//! ```

pub use bitquest_foundation as foundation;
pub use bitquest_language as language;
pub use bitquest_runtime as runtime;
