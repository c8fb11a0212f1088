//! Integration tests for ConsoleHost
//!
//! Tests scripts speaking through an in-memory console.

use std::io::Cursor;

use bitquest_foundation::{CallFault, ErrorKind};
use bitquest_language::run_lines;
use bitquest_runtime::{ConsoleHost, SPEECH_PREFIX};

type MemoryHost = ConsoleHost<Cursor<Vec<u8>>, Vec<u8>>;

fn console(input: &str) -> MemoryHost {
    ConsoleHost::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn transcript(host: MemoryHost) -> String {
    String::from_utf8(host.into_writer()).expect("console output is utf-8")
}

#[test]
fn speech_is_prefixed() {
    let mut host = console("");
    run_lines(&["print('woof')", "print(1, 2)"], &mut host).unwrap();
    assert_eq!(transcript(host), "BIT: woof\nBIT: 1 2\n");
    assert_eq!(SPEECH_PREFIX, "BIT: ");
}

#[test]
fn input_echoes_prompt_and_reads_line() {
    let mut host = console("Rex\r\n");
    run_lines(&["name = input('name? ')", "print('hi', name)"], &mut host).unwrap();
    assert_eq!(transcript(host), "name? BIT: hi Rex\n");
}

#[test]
fn input_at_end_of_stream_fails() {
    let mut host = console("");
    let err = run_lines(&["x = input()"], &mut host).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Call(CallFault::InvalidArgument { name: "input", .. })
    ));
    assert_eq!(err.line(), Some(1));
}

#[test]
fn disabled_input_is_unavailable() {
    let mut host = console("ignored\n").without_input();
    let err = run_lines(&["print('a')", "x = input('?')"], &mut host).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Call(CallFault::HostUnavailable { capability: "input" })
    ));
    assert_eq!(transcript(host), "BIT: a\n");
}
