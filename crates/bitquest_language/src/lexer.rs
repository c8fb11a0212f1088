//! Lexer for BitQuest scripts.
//!
//! The lexer converts source text into a stream of tokens. Blocks are
//! delimited by indentation, so besides ordinary tokens the lexer emits
//! `Newline` at the end of each logical line and `Indent`/`Dedent` when the
//! indentation level changes. Blank lines, comment-only lines and line
//! breaks inside parentheses produce no layout tokens.

use std::collections::VecDeque;

use crate::span::Span;
use crate::token::{Token, TokenKind};

const TAB_WIDTH: u32 = 8;

/// Lexer for BitQuest source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Stack of open indentation widths; the bottom entry is always 0.
    indents: Vec<u32>,
    /// Layout tokens waiting to be handed out.
    pending: VecDeque<Token>,
    /// True when the next character begins a physical line.
    at_line_start: bool,
    /// True once the current logical line has produced a token.
    line_has_content: bool,
    /// Open parenthesis count; line breaks inside parentheses are ignored.
    paren_depth: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            pending: VecDeque::new(),
            at_line_start: true,
            line_has_content: false,
            paren_depth: 0,
        }
    }

    /// Returns the next token from the source.
    ///
    /// After the end of input has been reached, keeps returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }

            if self.at_line_start && self.paren_depth == 0 {
                self.at_line_start = false;
                self.measure_indentation();
                continue;
            }

            self.skip_whitespace();

            let Some(c) = self.peek_char() else {
                return self.finish();
            };

            if c == '\n' {
                let span = self.here();
                self.advance();
                if self.paren_depth > 0 {
                    continue;
                }
                self.at_line_start = true;
                if self.line_has_content {
                    self.line_has_content = false;
                    return Token::new(TokenKind::Newline, span);
                }
                continue;
            }

            let start = self.position;
            let start_line = self.line;
            let start_column = self.column;
            let kind = self.scan_token(c);
            self.line_has_content = true;

            return Token::new(
                kind,
                Span::new(start, self.position, start_line, start_column),
            );
        }
    }

    /// Tokenizes all source and returns a vector of tokens ending in `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn here(&self) -> Span {
        Span::point(self.position, self.line, self.column)
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks at the character `n` positions ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips spaces, tabs and comments (but not line breaks).
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' | '\r' | '\x0C' => self.advance(),
                '#' => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Reads the indentation of the line starting at the cursor and queues
    /// the matching `Indent`/`Dedent` tokens. Blank and comment-only lines
    /// are consumed without affecting indentation.
    fn measure_indentation(&mut self) {
        loop {
            let mut width = 0;
            let mut leading = 0;
            for c in self.rest.chars() {
                match c {
                    ' ' => width += 1,
                    '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                    '\r' | '\x0C' => {}
                    _ => break,
                }
                leading += 1;
            }
            for _ in 0..leading {
                self.advance();
            }

            match self.peek_char() {
                None => return,
                Some('\n' | '#') => {
                    self.skip_whitespace();
                    self.advance();
                }
                Some(_) => {
                    self.queue_indentation(width);
                    return;
                }
            }
        }
    }

    fn queue_indentation(&mut self, width: u32) {
        let span = self.here();
        let current = self.indents.last().copied().unwrap_or(0);

        if width > current {
            self.indents.push(width);
            self.pending.push_back(Token::new(TokenKind::Indent, span));
            return;
        }

        while self.indents.last().is_some_and(|&top| top > width) {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, span));
        }

        if self.indents.last().copied().unwrap_or(0) != width {
            self.pending.push_back(Token::new(
                TokenKind::Error("unindent does not match any outer indentation level".into()),
                span,
            ));
        }
    }

    /// Emits the tokens that close the input: a final `Newline` if the last
    /// line had content, one `Dedent` per open block, then `Eof`.
    fn finish(&mut self) -> Token {
        let span = self.here();
        if self.line_has_content {
            self.line_has_content = false;
            self.pending.push_back(Token::new(TokenKind::Newline, span));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, span));
        }
        self.pending.push_back(Token::new(TokenKind::Eof, span));
        self.pending
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, span))
    }

    fn scan_token(&mut self, c: char) -> TokenKind {
        match c {
            '"' | '\'' => self.scan_string(c),
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_name(),
            _ => {
                self.advance();
                self.scan_operator(c)
            }
        }
    }

    /// Scans an operator or delimiter whose first character was consumed.
    fn scan_operator(&mut self, c: char) -> TokenKind {
        match c {
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RParen
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '%' => TokenKind::Percent,
            '+' if self.eat('=') => TokenKind::PlusAssign,
            '+' => TokenKind::Plus,
            '-' if self.eat('=') => TokenKind::MinusAssign,
            '-' => TokenKind::Minus,
            '*' if self.eat('=') => TokenKind::StarAssign,
            '*' => TokenKind::Star,
            '/' if self.eat('/') => TokenKind::DoubleSlash,
            '/' if self.eat('=') => TokenKind::SlashAssign,
            '/' => TokenKind::Slash,
            '=' if self.eat('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '!' if self.eat('=') => TokenKind::NotEq,
            '<' if self.eat('=') => TokenKind::LtEq,
            '<' => TokenKind::Lt,
            '>' if self.eat('=') => TokenKind::GtEq,
            '>' => TokenKind::Gt,
            c => TokenKind::Error(format!("unexpected character: {c}")),
        }
    }

    /// Scans a string literal delimited by `quote`.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance(); // consume opening quote
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        Some('\n') | None => {
                            return TokenKind::Error("unterminated string literal".into());
                        }
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some('\n') | None => {
                    return TokenKind::Error("unterminated string literal".into());
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
        TokenKind::Str(text)
    }

    /// Scans a number (integer or float).
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut is_float = false;

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek_char() == Some('.') {
            is_float = true;
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char_n(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        if self.peek_char().is_some_and(|c| c.is_alphabetic() || c == '_') {
            while self
                .peek_char()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
            {
                self.advance();
            }
            return TokenKind::Error(format!(
                "invalid number: {}",
                &self.source[start..self.position]
            ));
        }

        let text = &self.source[start..self.position];
        if is_float {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(e) => TokenKind::Error(format!("invalid float: {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => TokenKind::Error(format!("integer literal too large: {text}")),
            }
        }
    }

    /// Scans an identifier or keyword.
    fn scan_name(&mut self) -> TokenKind {
        let start = self.position;
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let text = &self.source[start..self.position];
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Name(text.to_string()))
    }
}
