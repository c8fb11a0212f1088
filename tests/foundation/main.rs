//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Builtin, Error, and VmConfig.

mod errors;
mod values;
