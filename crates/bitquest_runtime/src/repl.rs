//! The editor-style REPL.
//!
//! Typed lines are appended to the script buffer rather than executed one
//! at a time; `:run` tokenizes and runs the whole buffer, the way the
//! in-game editor's run button does.

use std::io::{self, Write};
use std::path::Path;

use bitquest_foundation::{Builtin, Result};
use bitquest_language::{Host, TokenKind};
use tracing::debug;

use crate::console::ConsoleHost;
use crate::editor::{LineEditor, ReadResult, RustylineEditor, open_parens};
use crate::outcome::Outcome;
use crate::session::Session;

const COMMANDS: [(&str, &str); 8] = [
    (":run", "tokenize and run the script"),
    (":list", "show the script with line numbers"),
    (":dis", "show the compiled bytecode"),
    (":undo", "remove the last line"),
    (":clear", "remove every line"),
    (":load PATH", "replace the script with a file"),
    (":help", "show this help"),
    (":quit", "leave the editor"),
];

const KEYWORDS: [&str; 15] = [
    "True", "False", "None", "and", "or", "not", "if", "elif", "else", "while", "for", "in",
    "break", "continue", "pass",
];

/// What the REPL does after handling one input.
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Keep reading; print these lines first.
    Continue(Vec<String>),
    /// Leave the REPL.
    Quit,
}

/// The interactive script editor.
pub struct Repl<E: LineEditor = RustylineEditor, H: Host = ConsoleHost> {
    /// The line editor for input.
    editor: E,

    /// The host that receives BIT's speech during `:run`.
    host: H,

    /// Script buffer and run settings.
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,
}

impl Repl<RustylineEditor, ConsoleHost> {
    /// Creates a new REPL with the default rustyline editor, talking to
    /// the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor, ConsoleHost::stdio()))
    }
}

impl<E: LineEditor, H: Host> Repl<E, H> {
    /// Creates a new REPL with the given editor and host.
    pub fn with_editor(mut editor: E, host: H) -> Self {
        let session = Session::new();
        editor.set_keywords(completion_words(&session));
        Self {
            editor,
            host,
            session,
            show_banner: true,
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.editor.set_keywords(completion_words(&session));
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a reference to the host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Runs the REPL loop until `:quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            print_banner();
        }

        loop {
            let Some(input) = self.read_input()? else {
                break; // EOF
            };
            if input.trim().is_empty() {
                continue;
            }
            self.editor.add_history(&input);

            match self.handle(&input) {
                Reply::Continue(lines) => {
                    for line in lines {
                        println!("{line}");
                    }
                }
                Reply::Quit => break,
            }
        }

        println!("\nBye!");
        Ok(())
    }

    /// Reads one entry, pre-indenting the line after a block header.
    fn read_input(&mut self) -> Result<Option<String>> {
        let prompt = format!("{:>3}> ", self.session.lines().len() + 1);
        let indent = next_indent(self.session.lines());
        let read = if indent.is_empty() {
            self.editor.read_line(&prompt)?
        } else {
            self.editor.read_indented(&prompt, &indent)?
        };
        match read {
            ReadResult::Line(line) => Ok(Some(line)),
            ReadResult::Interrupted => {
                println!();
                Ok(Some(String::new()))
            }
            ReadResult::Eof => Ok(None),
        }
    }

    /// Handles one entry: a `:command`, or script lines to append.
    pub fn handle(&mut self, input: &str) -> Reply {
        let trimmed = input.trim();
        if !trimmed.starts_with(':') {
            if trimmed.is_empty() {
                return Reply::Continue(Vec::new());
            }
            for line in input.lines() {
                self.session.push_line(line);
            }
            return Reply::Continue(Vec::new());
        }

        let (command, argument) = match trimmed.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (trimmed, ""),
        };
        debug!(command, "repl command");

        let lines = match command {
            ":run" | ":r" => self.run_script(),
            ":list" | ":l" => {
                if self.session.is_empty() {
                    vec!["(empty script)".to_string()]
                } else {
                    self.session.numbered()
                }
            }
            ":dis" | ":d" => match self.session.compile() {
                Ok(program) => program.to_string().lines().map(String::from).collect(),
                Err(e) => vec![format_outcome(&Outcome::Rejected(e))],
            },
            ":undo" | ":u" => match self.session.undo() {
                Some(line) => vec![format!("removed: {line}")],
                None => vec!["nothing to undo".to_string()],
            },
            ":clear" => {
                self.session.clear();
                vec!["script cleared".to_string()]
            }
            ":load" if !argument.is_empty() => match self.session.load_file(Path::new(argument)) {
                Ok(()) => vec![format!("loaded {} lines", self.session.lines().len())],
                Err(e) => vec![format!("\x1b[31m{e}\x1b[0m")],
            },
            ":help" | ":h" | ":?" => help_lines(),
            ":quit" | ":q" | ":exit" => return Reply::Quit,
            _ => vec![format!("unknown command {command}; try :help")],
        };
        Reply::Continue(lines)
    }

    fn run_script(&mut self) -> Vec<String> {
        let outcome = self.session.run(&mut self.host);
        // Speech may have been written without a trailing flush
        let _ = io::stdout().flush();
        vec![format_outcome(&outcome)]
    }
}

/// Formats a run result, colored by whether it succeeded.
fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Finished { .. } => format!("\x1b[32m{outcome}\x1b[0m"),
        Outcome::Rejected(_) | Outcome::Failed { .. } => format!("\x1b[31m{outcome}\x1b[0m"),
    }
}

/// Indentation for the line after `lines`: one level deeper after a block
/// header, otherwise the same as the last line.
fn next_indent(lines: &[String]) -> String {
    let Some(last) = lines.iter().rev().find(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let current = &last[..last.len() - last.trim_start().len()];
    let code = last.split('#').next().unwrap_or_default().trim_end();
    if code.ends_with(':') && open_parens(last) == 0 {
        format!("{current}    ")
    } else {
        current.to_string()
    }
}

fn completion_words(session: &Session) -> Vec<String> {
    let mut words: Vec<String> = KEYWORDS
        .iter()
        .filter(|w| TokenKind::keyword(w).is_some())
        .map(|w| (*w).to_string())
        .collect();
    words.extend(session.builtins().iter().map(|b: Builtin| b.name().to_string()));
    words.extend(
        COMMANDS
            .iter()
            .map(|&(c, _)| c.split(' ').next().unwrap_or(c).to_string()),
    );
    words
}

fn help_lines() -> Vec<String> {
    let mut lines = vec![
        "Type script lines to add them to BIT's program.".to_string(),
        "Commands:".to_string(),
    ];
    lines.extend(COMMANDS.iter().map(|&(c, d)| format!("  {c:<12} {d}")));
    lines
}

fn print_banner() {
    println!("\x1b[1;36mBitQuest script editor v{}\x1b[0m", env!("CARGO_PKG_VERSION"));
    println!("Type script lines, then :run. :help lists commands, Ctrl+D exits.\n");
    let _ = io::stdout().flush();
}
