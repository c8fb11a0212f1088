//! Integration tests for the editor REPL
//!
//! Tests the REPL driven by a scripted line editor.

use bitquest_foundation::Result;
use bitquest_language::RecordingHost;
use bitquest_runtime::{LineEditor, ReadResult, Repl, Reply, Session};

/// Plays back a fixed list of entries, then reports end of input.
struct ScriptedEditor {
    entries: Vec<String>,
    history: Vec<String>,
    keywords: Vec<String>,
}

impl ScriptedEditor {
    fn new(entries: &[&str]) -> Self {
        Self {
            entries: entries.iter().rev().map(|s| (*s).to_string()).collect(),
            history: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.entries.pop().map_or(ReadResult::Eof, ReadResult::Line))
    }

    fn read_indented(&mut self, prompt: &str, _indent: &str) -> Result<ReadResult> {
        self.read_line(prompt)
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        self.keywords = keywords;
    }
}

fn repl(entries: &[&str]) -> Repl<ScriptedEditor, RecordingHost> {
    Repl::with_editor(ScriptedEditor::new(entries), RecordingHost::new()).without_banner()
}

// =============================================================================
// Run Loop
// =============================================================================

#[test]
fn run_loop_builds_and_runs_script() {
    let mut repl = repl(&["x = 3", "while x > 0:", "    print(x)", "    x -= 1", ":run"]);
    repl.run().unwrap();
    assert_eq!(repl.session().lines().len(), 4);
    assert_eq!(repl.host().messages(), ["3", "2", "1"]);
}

#[test]
fn run_loop_stops_at_quit() {
    let mut repl = repl(&["print('a')", ":quit", "print('b')", ":run"]);
    repl.run().unwrap();
    assert_eq!(repl.session().lines(), ["print('a')"]);
    assert!(repl.host().messages().is_empty());
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn run_command_reports_outcome() {
    let mut repl = repl(&[]);
    repl.handle("print('woof')");
    let Reply::Continue(lines) = repl.handle(":run") else {
        panic!(":run should not quit");
    };
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("finished in"));
    assert_eq!(repl.host().messages(), ["woof"]);
}

#[test]
fn run_command_reports_error_line() {
    let mut repl = repl(&[]);
    repl.handle("print('a')");
    repl.handle("print(missing)");
    let Reply::Continue(lines) = repl.handle(":run") else {
        panic!(":run should not quit");
    };
    assert!(lines[0].contains("NameError on line 2"));
}

#[test]
fn list_undo_and_clear() {
    let mut repl = repl(&[]);
    assert_eq!(
        repl.handle(":list"),
        Reply::Continue(vec!["(empty script)".to_string()])
    );
    repl.handle("a = 1");
    repl.handle("b = 2");
    assert_eq!(
        repl.handle(":list"),
        Reply::Continue(vec!["1 | a = 1".to_string(), "2 | b = 2".to_string()])
    );
    assert_eq!(
        repl.handle(":undo"),
        Reply::Continue(vec!["removed: b = 2".to_string()])
    );
    repl.handle(":clear");
    assert!(repl.session().is_empty());
}

#[test]
fn dis_shows_bytecode() {
    let mut repl = repl(&[]);
    repl.handle("print(1 + 2)");
    let Reply::Continue(lines) = repl.handle(":dis") else {
        panic!(":dis should not quit");
    };
    assert!(lines.iter().any(|l| l.contains("BINARY_ADD")));
    assert!(lines.iter().any(|l| l.contains("RETURN_VALUE")));
}

#[test]
fn unknown_command_suggests_help() {
    let mut repl = repl(&[]);
    let Reply::Continue(lines) = repl.handle(":fetch") else {
        panic!("unknown commands should not quit");
    };
    assert!(lines[0].contains(":help"));
    assert_eq!(repl.handle(":q"), Reply::Quit);
}

#[test]
fn preloaded_session_is_kept() {
    let mut session = Session::new();
    session.load_source("print('preloaded')");
    let mut repl = repl(&[":run"]).with_session(session);
    repl.run().unwrap();
    assert_eq!(repl.host().messages(), ["preloaded"]);
}
