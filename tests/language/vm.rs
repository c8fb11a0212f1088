//! Integration tests for the VM
//!
//! Tests whole scripts run against a recording host.

use bitquest_foundation::{
    ArithmeticFault, Builtin, CallFault, ErrorKind, SemanticLimit, Value, VmConfig,
};
use bitquest_language::{Builtins, Opcode, Program, RecordingHost, Vm, assemble, compile, run_lines};

fn speech(lines: &[&str]) -> Vec<String> {
    let mut host = RecordingHost::new();
    run_lines(lines, &mut host).expect("script failed");
    host.take_messages()
}

// =============================================================================
// Example Programs
// =============================================================================

#[test]
fn fizzbuzz() {
    let messages = speech(&[
        "for n in range(1, 16):",
        "    if n % 15 == 0:",
        "        print('FizzBuzz')",
        "    elif n % 3 == 0:",
        "        print('Fizz')",
        "    elif n % 5 == 0:",
        "        print('Buzz')",
        "    else:",
        "        print(n)",
    ]);
    assert_eq!(messages.len(), 15);
    assert_eq!(messages[2], "Fizz");
    assert_eq!(messages[4], "Buzz");
    assert_eq!(messages[14], "FizzBuzz");
    assert_eq!(messages[6], "7");
}

#[test]
fn collatz_steps() {
    let messages = speech(&[
        "n = 6",
        "steps = 0",
        "while n != 1:",
        "    if n % 2 == 0:",
        "        n = n // 2",
        "    else:",
        "        n = 3 * n + 1",
        "    steps += 1",
        "print('steps:', steps)",
    ]);
    assert_eq!(messages, vec!["steps: 8"]);
}

#[test]
fn guessing_game_reads_input() {
    let mut host = RecordingHost::with_inputs(["3", "9", "7"]);
    run_lines(
        &[
            "secret = 7",
            "guess = int(input('guess? '))",
            "while guess != secret:",
            "    if guess < secret:",
            "        print('higher')",
            "    else:",
            "        print('lower')",
            "    guess = int(input('guess? '))",
            "print('found it')",
        ],
        &mut host,
    )
    .unwrap();
    assert_eq!(host.messages(), ["higher", "lower", "found it"]);
    assert_eq!(host.prompts().len(), 3);
}

#[test]
fn string_building() {
    let messages = speech(&[
        "bark = ''",
        "for c in 'wof':",
        "    bark += c * 2",
        "print(bark, len(bark))",
        "print(str(1.5) + '!', 'ab' < 'b')",
    ]);
    assert_eq!(messages, vec!["wwooff 6", "1.5! True"]);
}

#[test]
fn numeric_builtins() {
    let messages = speech(&[
        "print(abs(-3), min(4, 2, 8), max(range(5)))",
        "print(round(2.5), round(3.14159, 2), float(3))",
        "print(7 / 2, -7 // 2, -7 % 3)",
    ]);
    assert_eq!(messages, vec!["3 2 4", "2 3.14 3.0", "3.5 -4 2"]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn syntax_error_runs_nothing() {
    let mut host = RecordingHost::new();
    let err = run_lines(&["print('a')", "print('b'"], &mut host).unwrap_err();
    assert!(err.is_syntax());
    assert!(host.messages().is_empty());
}

#[test]
fn runtime_error_keeps_earlier_speech() {
    let mut host = RecordingHost::new();
    let err = run_lines(&["print('sit')", "print(1 // 0)", "print('stay')"], &mut host)
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Arithmetic(ArithmeticFault::DivisionByZero)
    ));
    assert_eq!(err.line(), Some(2));
    assert_eq!(host.messages(), ["sit"]);
}

#[test]
fn undefined_name_reports_line() {
    let mut host = RecordingHost::new();
    let err = run_lines(&["x = 1", "print(y)"], &mut host).unwrap_err();
    assert_eq!(err.category(), "NameError");
    assert_eq!(err.line(), Some(2));
}

#[test]
fn calling_a_number_is_call_error() {
    let mut host = RecordingHost::new();
    let err = run_lines(&["treats = 3", "treats()"], &mut host).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Call(CallFault::NotCallable(_))));
}

#[test]
fn endless_loop_hits_step_budget() {
    let program = compile(&["while True:", "    pass"]).unwrap();
    let mut vm = Vm::new(VmConfig::classroom());
    let err = vm
        .run(&program, &Builtins::standard(), &mut RecordingHost::new())
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxSteps { limit: 10_000 })
    ));
    assert_eq!(vm.steps(), 10_001);
}

#[test]
fn restricted_builtins() {
    let program = compile(&["print(len('abc'))"]).unwrap();
    let builtins = Builtins::only(&[Builtin::Print]);
    let err = Vm::default()
        .run(&program, &builtins, &mut RecordingHost::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NameError(ref name) if name == "len"));
}

// =============================================================================
// Hand-Assembled Programs
// =============================================================================

#[test]
fn assembled_program_runs() {
    let program = assemble(&[
        "LOAD_NAME print",
        "LOAD_CONST 'woof'",
        "CALL_FUNCTION 1",
        "POP_TOP",
        "LOAD_CONST 42",
        "RETURN_VALUE",
    ])
    .unwrap();
    let mut host = RecordingHost::new();
    let value = Vm::default()
        .run(&program, &Builtins::standard(), &mut host)
        .unwrap();
    assert_eq!(value, Value::Int(42));
    assert_eq!(host.messages(), ["woof"]);
}

#[test]
fn unknown_opcode_stops_after_effects() {
    let program = assemble(&[
        "LOAD_NAME print",
        "LOAD_CONST 'before'",
        "CALL_FUNCTION 1",
        "POP_TOP",
        "BUILD_LIST 2",
        "LOAD_NAME print",
    ])
    .unwrap();
    let mut host = RecordingHost::new();
    let err = Vm::default()
        .run(&program, &Builtins::standard(), &mut host)
        .unwrap_err();
    assert_eq!(err.category(), "UnknownOpcode");
    assert_eq!(err.line(), Some(5));
    assert_eq!(host.messages(), ["before"]);
}

#[test]
fn empty_program_returns_none() {
    let value = Vm::default()
        .run(&Program::new(), &Builtins::standard(), &mut RecordingHost::new())
        .unwrap();
    assert_eq!(value, Value::None);
}

#[test]
fn locals_visible_after_run() {
    let program = compile(&["a = 1", "b = 'two'"]).unwrap();
    let mut vm = Vm::default();
    vm.run(&program, &Builtins::standard(), &mut RecordingHost::new())
        .unwrap();
    let names: Vec<&str> = vm.locals().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(vm.local("b"), Some(&Value::from("two")));
}

#[test]
fn fast_opcodes_use_the_same_names() {
    let mut program = Program::new();
    let x = program.add_name("x").unwrap();
    let seven = program.add_constant(Value::Int(7)).unwrap();
    program.code.emit(Opcode::LoadConst(seven), 1);
    program.code.emit(Opcode::StoreFast(x), 1);
    program.code.emit(Opcode::LoadName(x), 2);
    program.code.emit(Opcode::ReturnValue, 2);
    let value = Vm::default()
        .run(&program, &Builtins::standard(), &mut RecordingHost::new())
        .unwrap();
    assert_eq!(value, Value::Int(7));
}
