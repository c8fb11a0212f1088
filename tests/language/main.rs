//! Integration tests for Layer 1: Language
//!
//! Tests for the lexer, compiler, assembler, and VM working together.

mod lexer;
mod properties;
mod vm;
