//! Property-based tests for the language layer
//!
//! Tests end-to-end behaviour over generated scripts.

use bitquest_foundation::Value;
use bitquest_language::{Builtins, RecordingHost, Vm, assemble, compile, run_lines};
use proptest::prelude::*;

fn speech(lines: &[String]) -> Vec<String> {
    let mut host = RecordingHost::new();
    run_lines(lines, &mut host).expect("script failed");
    host.take_messages()
}

/// Identifiers that cannot collide with keywords or builtins.
fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_map(|s| format!("v_{s}"))
}

fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?]{0,24}"
}

/// Literal values, including the awkward ones: signed zeros, quotes and
/// escaped control characters.
fn literal() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(Value::Float),
        Just(Value::Float(-0.0)),
        Just(Value::Float(0.0)),
        "[a-zA-Z0-9 '\"\\\\\t\n\ré名]{0,16}".prop_map(|s| Value::from(s.as_str())),
        any::<bool>().prop_map(Value::Bool),
        // i64::MIN has no source literal; it only arises from negation
        (i64::MIN + 1..=i64::MAX).prop_map(Value::Int),
    ]
}

/// Equal values of the same type; floats must match bit for bit.
fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()),
        _ => a.value_type() == b.value_type() && a == b,
    }
}

/// Runs `program` and returns its result alongside the final value of `x`.
fn result_and_x(program: &bitquest_language::Program) -> (Value, Option<Value>) {
    let mut vm = Vm::default();
    let returned = vm
        .run(program, &Builtins::standard(), &mut RecordingHost::new())
        .expect("program failed");
    (returned, vm.local("x").cloned())
}

proptest! {
    #[test]
    fn stored_int_is_printed_back(name in identifier(), n in -1_000_000i64..1_000_000) {
        let lines = vec![format!("{name} = {n}"), format!("print({name})")];
        prop_assert_eq!(speech(&lines), vec![n.to_string()]);
    }

    #[test]
    fn string_literals_print_verbatim(text in plain_text()) {
        let lines = vec![format!("print('{text}')")];
        prop_assert_eq!(speech(&lines), vec![text]);
    }

    #[test]
    fn one_message_per_print(count in 0usize..20) {
        let lines: Vec<String> = (0..count).map(|i| format!("print({i})")).collect();
        let messages = speech(&lines);
        prop_assert_eq!(messages.len(), count);
        for (i, message) in messages.iter().enumerate() {
            prop_assert_eq!(message, &i.to_string());
        }
    }

    #[test]
    fn for_loop_prints_each_item(stop in 0i64..30) {
        let lines = vec![
            format!("for i in range({stop}):"),
            "    print(i)".to_string(),
        ];
        prop_assert_eq!(speech(&lines).len(), usize::try_from(stop).unwrap());
    }

    #[test]
    fn runs_are_deterministic(a in -1000i64..1000, b in 1i64..1000) {
        let lines = vec![
            format!("x = {a}"),
            format!("y = {b}"),
            "print(x // y, x % y, x / y, x * y)".to_string(),
        ];
        let program = compile(&lines).unwrap();
        let mut vm = Vm::default();
        let mut first = RecordingHost::new();
        let mut second = RecordingHost::new();
        vm.run(&program, &Builtins::standard(), &mut first).unwrap();
        let first_steps = vm.steps();
        vm.run(&program, &Builtins::standard(), &mut second).unwrap();
        prop_assert_eq!(first.messages(), second.messages());
        prop_assert_eq!(first_steps, vm.steps());
    }

    #[test]
    fn floor_division_and_modulo_agree(a in -1000i64..1000, b in prop_oneof![-50i64..-1, 1i64..50]) {
        let lines = vec![format!("print(({a}) // ({b}) * ({b}) + ({a}) % ({b}))")];
        prop_assert_eq!(speech(&lines), vec![a.to_string()]);
    }

    #[test]
    fn reassembled_listing_behaves_the_same(values in prop::collection::vec(-100i64..100, 1..6)) {
        let mut lines = vec!["total = 0".to_string()];
        for v in &values {
            lines.push(format!("total += {v}"));
            lines.push("print(total)".to_string());
        }
        let program = compile(&lines).unwrap();
        let reassembled = assemble(&program.to_listing()).unwrap();

        let mut original = RecordingHost::new();
        let mut loaded = RecordingHost::new();
        let a = Vm::default().run(&program, &Builtins::standard(), &mut original).unwrap();
        let b = Vm::default().run(&reassembled, &Builtins::standard(), &mut loaded).unwrap();
        prop_assert_eq!(a, Value::None);
        prop_assert_eq!(b, Value::None);
        prop_assert_eq!(original.messages(), loaded.messages());
    }

    #[test]
    fn stored_literal_loads_back_unchanged(value in literal()) {
        let program = compile(&[format!("x = {}", value.repr())]).unwrap();
        let (_, stored) = result_and_x(&program);
        let stored = stored.expect("x was not stored");
        prop_assert!(identical(&stored, &value), "{} came back as {}", value.repr(), stored.repr());
    }

    #[test]
    fn listed_literal_is_returned_unchanged(
        value in prop_oneof![
            literal(),
            Just(Value::Float(f64::INFINITY)),
            Just(Value::Float(f64::NEG_INFINITY)),
            Just(Value::Float(f64::NAN)),
        ]
    ) {
        let listing = [
            format!("LOAD_CONST {}", value.repr()),
            "STORE_NAME x".to_string(),
            "LOAD_NAME x".to_string(),
            "RETURN_VALUE".to_string(),
        ];
        let (returned, stored) = result_and_x(&assemble(&listing).unwrap());
        prop_assert!(identical(&returned, &value), "{} came back as {}", value.repr(), returned.repr());
        prop_assert!(stored.is_some_and(|v| identical(&v, &value)));
    }
}
