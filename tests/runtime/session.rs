//! Integration tests for Session
//!
//! Tests the script buffer and how each run is reported.

use bitquest_foundation::{Builtin, VmConfig};
use bitquest_language::{Builtins, RecordingHost};
use bitquest_runtime::{Outcome, Session, describe_error};

fn session(lines: &[&str]) -> Session {
    let mut session = Session::new();
    for line in lines {
        session.push_line(*line);
    }
    session
}

// =============================================================================
// Running
// =============================================================================

#[test]
fn finished_run_counts_steps() {
    let mut session = session(&["x = 1"]);
    let outcome = session.run(&mut RecordingHost::new());
    assert_eq!(outcome, Outcome::Finished { steps: 4 });
    assert_eq!(outcome.to_string(), "finished in 4 steps");
}

#[test]
fn rejected_script_has_syntax_error_line() {
    let mut session = session(&["print('ok')", "x = = 2"]);
    let mut host = RecordingHost::new();
    let outcome = session.run(&mut host);
    assert!(matches!(outcome, Outcome::Rejected(_)));
    assert_eq!(outcome.error_line(), Some(2));
    assert!(outcome.to_string().starts_with("SyntaxError on line 2: "));
    assert!(host.messages().is_empty());
}

#[test]
fn failed_run_reports_steps_and_line() {
    let mut session = session(&["print('sit')", "print(10 % 0)"]);
    let mut host = RecordingHost::new();
    let outcome = session.run(&mut host);
    match &outcome {
        Outcome::Failed { error, steps } => {
            assert_eq!(error.category(), "ArithmeticError");
            assert!(*steps > 0);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(
        outcome.to_string(),
        "ArithmeticError on line 2: division by zero"
    );
    assert_eq!(host.messages(), ["sit"]);
}

#[test]
fn runs_start_from_fresh_state() {
    let mut session = session(&["print('woof')"]);
    let mut host = RecordingHost::new();
    assert!(session.run(&mut host).is_success());

    session.clear();
    session.push_line("print(x)");
    session.push_line("x = 1");
    let outcome = session.run(&mut host);
    assert_eq!(outcome.error().map(|e| e.category()), Some("NameError"));
}

#[test]
fn classroom_config_limits_loops() {
    let mut session = session(&["n = 0", "while n >= 0:", "    n += 1"])
        .with_config(VmConfig::classroom());
    let outcome = session.run(&mut RecordingHost::new());
    assert_eq!(outcome.error().map(|e| e.category()), Some("LimitExceeded"));
    assert_eq!(session.config().max_steps, Some(10_000));
}

#[test]
fn disabled_input_is_unbound() {
    let mut session =
        session(&["name = input('name? ')"]).with_builtins(Builtins::standard().without(Builtin::Input));
    let outcome = session.run(&mut RecordingHost::with_inputs(["BIT"]));
    assert_eq!(
        outcome.to_string(),
        "NameError on line 1: name 'input' is not defined"
    );
}

// =============================================================================
// Editing
// =============================================================================

#[test]
fn load_source_replaces_buffer() {
    let mut session = session(&["old = 1"]);
    session.load_source("a = 1\n\nprint(a)");
    assert_eq!(session.lines(), ["a = 1", "", "print(a)"]);
    assert_eq!(session.numbered()[2], "3 | print(a)");
}

#[test]
fn numbered_pads_line_numbers() {
    let mut session = Session::new();
    for i in 0..10 {
        session.push_line(format!("x = {i}"));
    }
    let numbered = session.numbered();
    assert_eq!(numbered[0], " 1 | x = 0");
    assert_eq!(numbered[9], "10 | x = 9");
}

#[test]
fn load_file_reads_script() {
    let path = std::env::temp_dir().join("bitquest_session_load.bq");
    std::fs::write(&path, "for i in range(2):\n    print(i)\n").expect("write failed");

    let mut session = Session::new();
    session.load_file(&path).expect("load failed");
    let _ = std::fs::remove_file(&path);

    let mut host = RecordingHost::new();
    assert!(session.run(&mut host).is_success());
    assert_eq!(host.messages(), ["0", "1"]);
}

#[test]
fn load_missing_file_fails() {
    let mut session = session(&["keep = 1"]);
    let missing = std::env::temp_dir().join("bitquest_no_such_script.bq");
    let err = session.load_file(&missing).unwrap_err();
    assert!(!err.is_defect());
    assert_eq!(err.category(), "IoError");
    assert!(describe_error(&err).starts_with("IoError: cannot read "));
    assert_eq!(session.lines(), ["keep = 1"]);
}

#[test]
fn describe_error_without_line() {
    let err = bitquest_foundation::Error::internal("bad jump");
    assert_eq!(describe_error(&err), "InternalError: internal error: bad jump");
}
