//! Terminal line editing for the script editor.
//!
//! [`LineEditor`] is what the REPL reads through; [`RustylineEditor`] backs
//! it with rustyline, and tests substitute a scripted editor.

use std::borrow::Cow;

use bitquest_foundation::{Error, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator as RLValidator};

use crate::highlight::ScriptHighlighter;

/// What one read from the terminal produced.
#[derive(Debug)]
pub enum ReadResult {
    /// An entry: a script line or a `:command`.
    Line(String),
    /// Ctrl+C; the current entry is discarded.
    Interrupted,
    /// Ctrl+D or closed input; the editor exits.
    Eof,
}

/// Source of REPL entries.
pub trait LineEditor {
    /// Reads one entry after showing `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Reads one entry that starts pre-filled with `indent`, for the body
    /// of a block opened on the previous line.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn read_indented(&mut self, prompt: &str, indent: &str) -> Result<ReadResult>;

    /// Remembers an entry for up-arrow recall.
    fn add_history(&mut self, line: &str);

    /// Replaces the words offered by tab completion.
    fn set_keywords(&mut self, keywords: Vec<String>);
}

/// Bundles the script-aware pieces rustyline calls back into.
#[derive(Helper, Completer, Hinter, RLValidator)]
struct ScriptHelper {
    #[rustyline(Completer)]
    completer: WordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    #[rustyline(Validator)]
    validator: ParenValidator,
    highlighter: ScriptHighlighter,
}

impl Highlighter for ScriptHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        if line.starts_with(':') {
            return Cow::Borrowed(line);
        }
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;36m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

/// Completer for keywords, builtins and REPL commands.
#[derive(Default)]
struct WordCompleter {
    keywords: Vec<String>,
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Commands keep their leading ':' as part of the word
        let start = line[..pos]
            .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .map_or(0, |i| i + 1);

        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }

        let candidates: Vec<Pair> = self
            .keywords
            .iter()
            .filter(|kw| kw.starts_with(word))
            .map(|kw| Pair {
                display: kw.clone(),
                replacement: kw.clone(),
            })
            .collect();

        Ok((start, candidates))
    }
}

/// Validator for parenthesis matching (enables multi-line calls).
#[derive(Default)]
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        if open_parens(ctx.input()) > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

/// Counts unclosed parentheses, skipping strings and comments.
pub(crate) fn open_parens(input: &str) -> i32 {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match (quote, c) {
            (Some(_), '\\') => escape_next = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), '\n') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, '#') => return depth,
            (None, _) => {}
        }
    }

    depth
}

/// [`LineEditor`] over a rustyline terminal session.
pub struct RustylineEditor {
    editor: Editor<ScriptHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Opens the terminal editor with script highlighting and completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(editor_error)?
            .build();

        let helper = ScriptHelper {
            completer: WordCompleter::default(),
            hinter: HistoryHinter::new(),
            validator: ParenValidator,
            highlighter: ScriptHighlighter::new(),
        };

        let mut editor = Editor::with_config(config).map_err(editor_error)?;
        editor.set_helper(Some(helper));

        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        read_result(self.editor.readline(prompt))
    }

    fn read_indented(&mut self, prompt: &str, indent: &str) -> Result<ReadResult> {
        read_result(self.editor.readline_with_initial(prompt, (indent, "")))
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.keywords = keywords;
        }
    }
}

fn read_result(result: std::result::Result<String, ReadlineError>) -> Result<ReadResult> {
    match result {
        Ok(line) => Ok(ReadResult::Line(line)),
        Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
        Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
        Err(e) => Err(editor_error(e)),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn editor_error(e: ReadlineError) -> Error {
    Error::internal(e.to_string())
}
