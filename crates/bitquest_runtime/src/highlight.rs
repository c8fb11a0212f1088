//! Syntax highlighting for the REPL.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use bitquest_foundation::Builtin;
use bitquest_language::TokenKind;

const RESET: &str = "\x1b[0m";

/// Highlighter for BitQuest script lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptHighlighter;

impl ScriptHighlighter {
    /// Creates a new highlighter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highlight a line of input.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                // Comments run to end of line
                '#' => {
                    result.push_str("\x1b[2;3m"); // dim italic
                    result.push(c);
                    result.extend(chars.by_ref());
                    result.push_str(RESET);
                }

                // Strings
                '\'' | '"' => {
                    result.push_str("\x1b[33m"); // yellow
                    result.push(c);
                    while let Some(next) = chars.next() {
                        result.push(next);
                        if next == '\\' {
                            if let Some(escaped) = chars.next() {
                                result.push(escaped);
                            }
                        } else if next == c {
                            break;
                        }
                    }
                    result.push_str(RESET);
                }

                // Numbers
                c if c.is_ascii_digit() => {
                    result.push_str("\x1b[35m"); // magenta
                    result.push(c);
                    push_while(&mut result, &mut chars, |n| n.is_ascii_alphanumeric() || n == '.');
                    result.push_str(RESET);
                }

                // Names, keywords and builtins
                c if c.is_alphabetic() || c == '_' => {
                    let mut word = String::from(c);
                    push_while(&mut word, &mut chars, |n| n.is_alphanumeric() || n == '_');

                    let color = match TokenKind::keyword(&word) {
                        Some(TokenKind::True | TokenKind::False | TokenKind::None) => "\x1b[34m", // blue
                        Some(_) => "\x1b[1;32m", // bold green
                        None if Builtin::from_name(&word).is_some() => "\x1b[36m", // cyan
                        None => "",
                    };

                    if color.is_empty() {
                        result.push_str(&word);
                    } else {
                        result.push_str(color);
                        result.push_str(&word);
                        result.push_str(RESET);
                    }
                }

                '(' | ')' => {
                    result.push_str("\x1b[1m"); // bold
                    result.push(c);
                    result.push_str(RESET);
                }

                _ => result.push(c),
            }
        }

        Cow::Owned(result)
    }
}

fn push_while(out: &mut String, chars: &mut Peekable<Chars<'_>>, keep: impl Fn(char) -> bool) {
    while let Some(next) = chars.next_if(|&n| keep(n)) {
        out.push(next);
    }
}
