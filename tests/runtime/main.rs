//! Integration tests for Layer 2: Runtime
//!
//! Tests for sessions, the console host, outcomes, and the editor REPL.

mod console;
mod repl;
mod session;
