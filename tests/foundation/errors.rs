//! Integration tests for Error types
//!
//! Tests error construction, display, categories, and context.

use bitquest_foundation::{
    ArithmeticFault, Arity, Builtin, CallFault, Error, ErrorContext, ErrorKind, SemanticLimit,
    Type, VmConfig,
};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_syntax() {
    let err = Error::syntax("unexpected character '$'", 2, 5, "x = $".to_string());
    assert!(err.is_syntax());
    assert!(!err.is_defect());
    assert_eq!(err.category(), "SyntaxError");
    assert_eq!(err.line(), Some(2));
    assert_eq!(err.to_string(), "line 2:5: unexpected character '$'");
}

#[test]
fn error_name() {
    let err = Error::name_error("treats");
    assert!(matches!(err.kind, ErrorKind::NameError(_)));
    assert_eq!(err.category(), "NameError");
    assert_eq!(err.to_string(), "name 'treats' is not defined");
}

#[test]
fn error_stack_underflow_is_defect() {
    let err = Error::stack_underflow("BINARY_ADD");
    assert!(err.is_defect());
    assert_eq!(err.category(), "StackUnderflow");
    assert!(err.to_string().contains("BINARY_ADD"));
}

#[test]
fn error_internal_is_defect() {
    let err = Error::internal("jump target out of range");
    assert!(err.is_defect());
    assert_eq!(err.category(), "InternalError");
}

#[test]
fn error_io_is_not_defect() {
    let source = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
    let err = Error::io("/scripts/fetch.bq", &source);
    assert!(matches!(err.kind, ErrorKind::Io { ref path, .. } if path == "/scripts/fetch.bq"));
    assert!(!err.is_defect());
    assert_eq!(err.category(), "IoError");
    assert!(err.to_string().starts_with("cannot read /scripts/fetch.bq: "));
}

#[test]
fn error_unknown_opcode() {
    let err = Error::new(ErrorKind::UnknownOpcode {
        opcode: "BARK".to_string(),
        arg: Some("3".to_string()),
    });
    assert_eq!(err.category(), "UnknownOpcode");
    assert_eq!(err.to_string(), "unknown opcode BARK 3");

    let bare = Error::new(ErrorKind::UnknownOpcode {
        opcode: "WAG".to_string(),
        arg: None,
    });
    assert_eq!(bare.to_string(), "unknown opcode WAG");
}

// =============================================================================
// Arithmetic and Call Faults
// =============================================================================

#[test]
fn error_arithmetic_messages() {
    assert_eq!(
        Error::arithmetic(ArithmeticFault::DivisionByZero).to_string(),
        "division by zero"
    );
    assert_eq!(
        Error::arithmetic(ArithmeticFault::Overflow { op: "+" }).to_string(),
        "integer overflow in '+'"
    );
    let err = Error::arithmetic(ArithmeticFault::UnsupportedOperands {
        op: "+",
        left: Type::Str,
        right: Type::Int,
    });
    assert_eq!(err.category(), "ArithmeticError");
    assert_eq!(
        err.to_string(),
        "unsupported operand types for +: 'str' and 'int'"
    );
}

#[test]
fn error_call_messages() {
    let err = Error::call(CallFault::NotCallable(Type::Int));
    assert_eq!(err.category(), "CallError");
    assert_eq!(err.to_string(), "'int' object is not callable");

    let err = Error::arity_mismatch("len", Builtin::Len.arity(), 2);
    assert_eq!(err.to_string(), "len() takes 1 argument(s) but 2 were given");

    let err = Error::invalid_argument("input", "end of input");
    assert_eq!(err.to_string(), "input(): end of input");
}

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch("an iterable", Type::Int);
    assert_eq!(err.category(), "TypeError");
    assert!(err.to_string().contains("int"));
}

#[test]
fn error_limit_exceeded() {
    let err = Error::limit_exceeded(SemanticLimit::MaxSteps { limit: 50 });
    assert_eq!(err.category(), "LimitExceeded");
    assert!(err.to_string().contains("50"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_context_supplies_line() {
    let err = Error::arithmetic(ArithmeticFault::DivisionByZero).with_context(
        ErrorContext::new()
            .with_line(4)
            .with_offset(12)
            .with_opcode("BINARY_MODULO"),
    );
    assert_eq!(err.line(), Some(4));
    let ctx = err.context.as_ref().unwrap();
    assert_eq!(ctx.offset, Some(12));
    assert_eq!(ctx.opcode.as_deref(), Some("BINARY_MODULO"));
    // Context does not change the message itself
    assert_eq!(err.to_string(), "division by zero");
}

#[test]
fn error_without_context_has_no_line() {
    assert_eq!(Error::name_error("x").line(), None);
}

// =============================================================================
// Builtins, Arity and Config
// =============================================================================

#[test]
fn builtin_names_round_trip() {
    for builtin in Builtin::ALL {
        assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
    }
    assert_eq!(Builtin::from_name("exec"), None);
}

#[test]
fn arity_display() {
    assert_eq!(Arity::Exact(1).to_string(), "1");
    assert_eq!(Arity::Range(1, 3).to_string(), "1 to 3");
    assert_eq!(Arity::Variadic(0).to_string(), "at least 0");
}

#[test]
fn config_presets() {
    let default = VmConfig::default();
    assert_eq!(default.max_steps, Some(100_000));
    assert_eq!(default.max_stack_depth, 1024);
    assert!(!default.trace);

    assert_eq!(VmConfig::classroom().max_steps, Some(10_000));
    assert_eq!(VmConfig::unbounded().max_steps, None);

    let custom = VmConfig::default()
        .with_max_steps(Some(5))
        .with_max_stack_depth(8)
        .with_trace(true);
    assert_eq!(custom.max_steps, Some(5));
    assert_eq!(custom.max_stack_depth, 8);
    assert!(custom.trace);
}
