//! Integration tests for Value types
//!
//! Tests Value variants, truthiness, equality, display, and iteration state.

use bitquest_foundation::{Builtin, IterState, RangeValue, Type, Value, format_float};
use std::sync::Arc;

// =============================================================================
// Value Construction
// =============================================================================

#[test]
fn value_none() {
    let v = Value::None;
    assert!(v.is_none());
    assert!(!v.is_truthy());
    assert_eq!(v.value_type(), Type::NoneType);
}

#[test]
fn value_from_primitives() {
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(42_i64), Value::Int(42));
    assert_eq!(Value::from(2.5), Value::Float(2.5));
    assert_eq!(Value::from("woof").as_str(), Some("woof"));
    assert_eq!(Value::from(String::from("sit")).as_str(), Some("sit"));
    assert_eq!(Value::from(Builtin::Len).as_builtin(), Some(Builtin::Len));
}

#[test]
fn value_accessors_reject_other_types() {
    assert_eq!(Value::Int(1).as_bool(), None);
    assert_eq!(Value::Bool(true).as_int(), None);
    assert_eq!(Value::from("1").as_float(), None);
    assert_eq!(Value::Float(1.0).as_str(), None);
    assert_eq!(Value::Int(3).as_number(), Some(3.0));
    assert_eq!(Value::Float(0.5).as_number(), Some(0.5));
}

// =============================================================================
// Truthiness
// =============================================================================

#[test]
fn falsy_values() {
    for v in [
        Value::None,
        Value::Bool(false),
        Value::Int(0),
        Value::Float(0.0),
        Value::from(""),
        Value::from(RangeValue::new(3, 3, 1).unwrap()),
    ] {
        assert!(!v.is_truthy(), "{v:?} should be falsy");
    }
}

#[test]
fn truthy_values() {
    for v in [
        Value::Bool(true),
        Value::Int(-1),
        Value::Float(0.1),
        Value::from("0"),
        Value::from(Builtin::Print),
        Value::from(RangeValue::new(0, 1, 1).unwrap()),
    ] {
        assert!(v.is_truthy(), "{v:?} should be truthy");
    }
}

// =============================================================================
// Equality and Ordering
// =============================================================================

#[test]
fn numbers_compare_across_int_and_float() {
    assert_eq!(Value::Int(2), Value::Float(2.0));
    assert!(Value::Int(1) < Value::Float(1.5));
    assert!(Value::Float(2.5) > Value::Int(2));
}

#[test]
fn different_types_are_not_equal() {
    assert_ne!(Value::Int(1), Value::Bool(true));
    assert_ne!(Value::from("1"), Value::Int(1));
    assert_ne!(Value::None, Value::Bool(false));
}

#[test]
fn strings_order_lexicographically() {
    assert!(Value::from("apple") < Value::from("bone"));
    assert_eq!(Value::from("a").partial_cmp(&Value::Int(1)), None);
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn display_matches_script_output() {
    assert_eq!(Value::None.to_string(), "None");
    assert_eq!(Value::Bool(true).to_string(), "True");
    assert_eq!(Value::Int(-7).to_string(), "-7");
    assert_eq!(Value::Float(14.0).to_string(), "14.0");
    assert_eq!(Value::from("raw text").to_string(), "raw text");
    assert_eq!(Value::from(Builtin::Abs).to_string(), "<built-in function abs>");
}

#[test]
fn display_ranges() {
    assert_eq!(
        Value::from(RangeValue::new(0, 3, 1).unwrap()).to_string(),
        "range(0, 3)"
    );
    assert_eq!(
        Value::from(RangeValue::new(10, 0, -2).unwrap()).to_string(),
        "range(10, 0, -2)"
    );
}

#[test]
fn repr_quotes_strings() {
    assert_eq!(Value::from("bone").repr(), "'bone'");
    assert_eq!(Value::from("it's").repr(), "\"it's\"");
    assert_eq!(Value::from("a\nb").repr(), "'a\\nb'");
    assert_eq!(Value::Int(5).repr(), "5");
}

#[test]
fn float_formatting() {
    assert_eq!(format_float(0.5), "0.5");
    assert_eq!(format_float(6.0), "6.0");
    assert_eq!(format_float(1e16), "1e+16");
    assert_eq!(format_float(1.5e-5), "1.5e-05");
    assert_eq!(format_float(f64::INFINITY), "inf");
    assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    assert_eq!(format_float(f64::NAN), "nan");
}

// =============================================================================
// Ranges and Iteration
// =============================================================================

#[test]
fn range_rejects_zero_step() {
    assert!(RangeValue::new(0, 10, 0).is_none());
}

#[test]
fn range_len() {
    assert_eq!(RangeValue::new(0, 10, 3).unwrap().len(), 4);
    assert_eq!(RangeValue::new(5, 0, -2).unwrap().len(), 3);
    assert_eq!(RangeValue::new(5, 0, 1).unwrap().len(), 0);
    assert!(RangeValue::new(5, 0, 1).unwrap().is_empty());
}

#[test]
fn range_iteration_yields_progression() {
    let mut iter = RangeValue::new(5, 0, -2).unwrap().iter();
    let mut seen = Vec::new();
    while let Some(v) = iter.advance() {
        seen.push(v);
    }
    assert_eq!(seen, vec![Value::Int(5), Value::Int(3), Value::Int(1)]);
    assert!(iter.advance().is_none());
}

#[test]
fn range_iteration_near_i64_max_terminates() {
    let mut iter = RangeValue::new(i64::MAX - 1, i64::MAX, 5).unwrap().iter();
    assert_eq!(iter.advance(), Some(Value::Int(i64::MAX - 1)));
    assert_eq!(iter.advance(), None);
}

#[test]
fn string_iteration_yields_characters() {
    let mut iter = IterState::chars(Arc::from("dög"));
    assert_eq!(iter.advance(), Some(Value::from("d")));
    assert_eq!(iter.advance(), Some(Value::from("ö")));
    assert_eq!(iter.advance(), Some(Value::from("g")));
    assert_eq!(iter.advance(), None);
}

#[test]
fn iterator_type_name() {
    let v = Value::Iter(IterState::chars(Arc::from("x")));
    assert_eq!(v.value_type(), Type::Iterator);
    assert_eq!(v.value_type().name(), "iterator");
    assert_eq!(v.to_string(), "<str_iterator>");
}
