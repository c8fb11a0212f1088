//! Single-pass compiler from BitQuest source to bytecode.
//!
//! A recursive-descent parser that emits stack-machine instructions as it
//! recognises each construct; no syntax tree is built. Forward jumps are
//! emitted with a placeholder target and patched once the target is known.
//!
//! Every emitted instruction records the source line of the token that
//! produced it, so runtime errors can point the editor at the right line.

use std::mem;

use bitquest_foundation::{Error, Result, Value};
use tracing::{debug, instrument};

use crate::lexer::Lexer;
use crate::opcode::{CompareOp, Opcode};
use crate::program::Program;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Words with meaning in general-purpose scripting languages that BitQuest
/// scripts do not support. Using one is reported by name.
const RESERVED: &[&str] = &[
    "assert", "async", "await", "class", "def", "del", "except", "finally", "from", "global",
    "import", "is", "lambda", "nonlocal", "raise", "return", "try", "with", "yield",
];

/// Deepest nesting of brackets, prefix operators and blocks a script may use.
///
/// The parser recurses once per level, so this bounds its stack use.
const MAX_NESTING: u32 = 100;

/// Compiles editor lines into a [`Program`].
///
/// The lines are joined with newlines; line numbers in errors and in the
/// compiled program are 1-based indices into `lines`.
///
/// # Errors
/// Returns a `SyntaxError` carrying the offending line and column if the
/// script is malformed. No partial program is returned.
pub fn compile<S: AsRef<str>>(lines: &[S]) -> Result<Program> {
    let source = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");
    compile_source(&source)
}

/// Compiles a whole script held in one string.
///
/// # Errors
/// Returns a `SyntaxError` if the script is malformed.
#[instrument(skip_all, fields(bytes = source.len()))]
pub fn compile_source(source: &str) -> Result<Program> {
    match Compiler::new(source).compile_program() {
        Ok(program) => {
            debug!(
                instructions = program.len(),
                constants = program.constants.len(),
                names = program.names.len(),
                "compiled script"
            );
            Ok(program)
        }
        Err(e) => {
            debug!(error = %e, "script rejected");
            Err(e)
        }
    }
}

/// Jump bookkeeping for the innermost enclosing loop.
#[derive(Debug, Default)]
struct LoopContext {
    /// Where `continue` jumps to.
    start: u32,
    /// `break` jumps waiting for the loop's end offset.
    breaks: Vec<usize>,
    /// True for `for` loops, whose iterator must be popped on `break`.
    is_for: bool,
}

/// Compiler state for one script.
struct Compiler<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token.
    current: Token,
    /// One token of lookahead, needed to spot assignments.
    next: Token,
    /// Line of the most recently consumed token.
    previous_line: u32,
    /// Source text (for error messages).
    source: &'src str,
    /// The program being built.
    program: Program,
    /// Enclosing loops, innermost last.
    loops: Vec<LoopContext>,
    /// Current nesting depth (see [`MAX_NESTING`]).
    depth: u32,
}

impl<'src> Compiler<'src> {
    fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let next = lexer.next_token();
        Self {
            lexer,
            current,
            next,
            previous_line: 1,
            source,
            program: Program::new(),
            loops: Vec::new(),
            depth: 0,
        }
    }

    fn compile_program(mut self) -> Result<Program> {
        while self.current.kind != TokenKind::Eof {
            self.statement()?;
        }

        let line = self.previous_line;
        let none = self.program.add_constant(Value::None)?;
        self.emit(Opcode::LoadConst(none), line);
        self.emit(Opcode::ReturnValue, line);
        Ok(self.program)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn statement(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            _ => {
                self.simple_statement()?;
                self.end_of_line()
            }
        }
    }

    fn simple_statement(&mut self) -> Result<()> {
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::Pass => {
                self.advance();
                Ok(())
            }
            TokenKind::Break => {
                self.advance();
                let Some(is_for) = self.loops.last().map(|ctx| ctx.is_for) else {
                    return Err(self.error_at(span, "'break' outside loop"));
                };
                if is_for {
                    self.emit(Opcode::PopTop, span.line);
                }
                let jump = self.emit(Opcode::JumpAbsolute(0), span.line);
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.breaks.push(jump);
                }
                Ok(())
            }
            TokenKind::Continue => {
                self.advance();
                let Some(start) = self.loops.last().map(|ctx| ctx.start) else {
                    return Err(self.error_at(span, "'continue' not properly in loop"));
                };
                self.emit(Opcode::JumpAbsolute(start), span.line);
                Ok(())
            }
            TokenKind::Name(name) if is_assign_op(&self.next.kind) => {
                let name = name.clone();
                self.assignment(&name, span)
            }
            _ => {
                self.expression()?;
                if is_assign_op(&self.current.kind) {
                    return Err(self.error_at(self.current.span, "cannot assign to expression"));
                }
                self.emit(Opcode::PopTop, span.line);
                Ok(())
            }
        }
    }

    /// Compiles `name = expr` or an augmented form like `name += expr`.
    fn assignment(&mut self, name: &str, span: Span) -> Result<()> {
        self.check_reserved(name, span)?;
        self.advance(); // name
        let op_token = self.current.clone();
        self.advance(); // assignment operator

        let idx = self.program.add_name(name)?;
        let op = match op_token.kind {
            TokenKind::PlusAssign => Some(Opcode::BinaryAdd),
            TokenKind::MinusAssign => Some(Opcode::BinarySubtract),
            TokenKind::StarAssign => Some(Opcode::BinaryMultiply),
            TokenKind::SlashAssign => Some(Opcode::BinaryTrueDivide),
            _ => None,
        };

        if let Some(op) = op {
            self.emit(Opcode::LoadName(idx), span.line);
            self.expression()?;
            self.emit(op, op_token.span.line);
        } else {
            self.expression()?;
        }
        self.emit(Opcode::StoreName(idx), span.line);
        Ok(())
    }

    fn if_statement(&mut self) -> Result<()> {
        let line = self.current.span.line;
        self.advance(); // if
        self.expression()?;
        let mut pending_false = Some(self.emit(Opcode::PopJumpIfFalse(0), line));
        self.suite()?;

        let mut end_jumps = Vec::new();
        loop {
            let branch_line = self.current.span.line;
            match self.current.kind {
                TokenKind::Elif => {
                    end_jumps.push(self.emit(Opcode::JumpAbsolute(0), branch_line));
                    if let Some(jump) = pending_false.take() {
                        self.patch_here(jump)?;
                    }
                    self.advance();
                    self.expression()?;
                    pending_false = Some(self.emit(Opcode::PopJumpIfFalse(0), branch_line));
                    self.suite()?;
                }
                TokenKind::Else => {
                    end_jumps.push(self.emit(Opcode::JumpAbsolute(0), branch_line));
                    if let Some(jump) = pending_false.take() {
                        self.patch_here(jump)?;
                    }
                    self.advance();
                    self.suite()?;
                    break;
                }
                _ => break,
            }
        }

        if let Some(jump) = pending_false {
            self.patch_here(jump)?;
        }
        for jump in end_jumps {
            self.patch_here(jump)?;
        }
        Ok(())
    }

    fn while_statement(&mut self) -> Result<()> {
        let line = self.current.span.line;
        self.advance(); // while
        let start = self.program.code.next_target()?;
        self.expression()?;
        let exit = self.emit(Opcode::PopJumpIfFalse(0), line);

        let ctx = self.loop_body(start, false)?;
        self.emit(Opcode::JumpAbsolute(start), line);

        self.patch_here(exit)?;
        for jump in ctx.breaks {
            self.patch_here(jump)?;
        }
        Ok(())
    }

    fn for_statement(&mut self) -> Result<()> {
        let line = self.current.span.line;
        self.advance(); // for

        let TokenKind::Name(name) = &self.current.kind else {
            return Err(self.unexpected("a loop variable name"));
        };
        let name = name.clone();
        self.check_reserved(&name, self.current.span)?;
        self.advance();
        self.expect(&TokenKind::In)?;

        self.expression()?;
        self.emit(Opcode::GetIter, line);
        let start = self.program.code.next_target()?;
        let iter = self.emit(Opcode::ForIter(0), line);
        let idx = self.program.add_name(&name)?;
        self.emit(Opcode::StoreName(idx), line);

        let ctx = self.loop_body(start, true)?;
        self.emit(Opcode::JumpAbsolute(start), line);

        self.patch_here(iter)?;
        for jump in ctx.breaks {
            self.patch_here(jump)?;
        }
        Ok(())
    }

    fn loop_body(&mut self, start: u32, is_for: bool) -> Result<LoopContext> {
        self.loops.push(LoopContext {
            start,
            breaks: Vec::new(),
            is_for,
        });
        let body = self.suite();
        let ctx = self.loops.pop().unwrap_or_default();
        body.map(|()| ctx)
    }

    /// Compiles `: simple NEWLINE` or `: NEWLINE INDENT statement+ DEDENT`.
    fn suite(&mut self) -> Result<()> {
        self.expect(&TokenKind::Colon)?;
        self.nested(Self::block)
    }

    fn block(&mut self) -> Result<()> {
        if self.current.kind != TokenKind::Newline {
            self.simple_statement()?;
            return self.end_of_line();
        }

        self.advance(); // newline
        if self.current.kind != TokenKind::Indent {
            return Err(self.error_at(self.current.span, "expected an indented block"));
        }
        self.advance();

        while !matches!(self.current.kind, TokenKind::Dedent | TokenKind::Eof) {
            self.statement()?;
        }
        if self.current.kind == TokenKind::Dedent {
            self.advance();
        }
        Ok(())
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self) -> Result<()> {
        self.nested(Self::or_expr)
    }

    fn or_expr(&mut self) -> Result<()> {
        self.and_expr()?;
        let mut jumps = Vec::new();
        while self.current.kind == TokenKind::Or {
            let line = self.current.span.line;
            self.advance();
            jumps.push(self.emit(Opcode::JumpIfTrueOrPop(0), line));
            self.and_expr()?;
        }
        for jump in jumps {
            self.patch_here(jump)?;
        }
        Ok(())
    }

    fn and_expr(&mut self) -> Result<()> {
        self.not_expr()?;
        let mut jumps = Vec::new();
        while self.current.kind == TokenKind::And {
            let line = self.current.span.line;
            self.advance();
            jumps.push(self.emit(Opcode::JumpIfFalseOrPop(0), line));
            self.not_expr()?;
        }
        for jump in jumps {
            self.patch_here(jump)?;
        }
        Ok(())
    }

    fn not_expr(&mut self) -> Result<()> {
        if self.current.kind == TokenKind::Not {
            let line = self.current.span.line;
            self.advance();
            self.nested(Self::not_expr)?;
            self.emit(Opcode::UnaryNot, line);
            return Ok(());
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<()> {
        self.additive()?;
        let Some(op) = compare_op(&self.current.kind) else {
            return Ok(());
        };
        let line = self.current.span.line;
        self.advance();
        self.additive()?;
        self.emit(Opcode::CompareOp(op), line);

        if compare_op(&self.current.kind).is_some() {
            return Err(self.error_at(
                self.current.span,
                "chained comparisons are not supported; use 'and'",
            ));
        }
        Ok(())
    }

    fn additive(&mut self) -> Result<()> {
        self.term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => Opcode::BinaryAdd,
                TokenKind::Minus => Opcode::BinarySubtract,
                _ => return Ok(()),
            };
            let line = self.current.span.line;
            self.advance();
            self.term()?;
            self.emit(op, line);
        }
    }

    fn term(&mut self) -> Result<()> {
        self.unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => Opcode::BinaryMultiply,
                TokenKind::Slash => Opcode::BinaryTrueDivide,
                TokenKind::DoubleSlash => Opcode::BinaryFloorDivide,
                TokenKind::Percent => Opcode::BinaryModulo,
                _ => return Ok(()),
            };
            let line = self.current.span.line;
            self.advance();
            self.unary()?;
            self.emit(op, line);
        }
    }

    fn unary(&mut self) -> Result<()> {
        if self.current.kind == TokenKind::Minus {
            let line = self.current.span.line;
            self.advance();
            self.nested(Self::unary)?;
            self.emit(Opcode::UnaryNegative, line);
            return Ok(());
        }
        self.call()
    }

    fn call(&mut self) -> Result<()> {
        self.primary()?;
        while self.current.kind == TokenKind::LParen {
            let line = self.current.span.line;
            self.advance();

            let mut count: u32 = 0;
            while self.current.kind != TokenKind::RParen {
                self.expression()?;
                count += 1;
                if self.current.kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
            self.emit(Opcode::CallFunction(count), line);
        }
        Ok(())
    }

    fn primary(&mut self) -> Result<()> {
        let span = self.current.span;
        let value = match &self.current.kind {
            TokenKind::Int(n) => Value::Int(*n),
            TokenKind::Float(n) => Value::Float(*n),
            TokenKind::Str(s) => Value::from(s.as_str()),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::None => Value::None,
            TokenKind::Name(name) => {
                let name = name.clone();
                self.check_reserved(&name, span)?;
                self.advance();
                let idx = self.program.add_name(&name)?;
                self.emit(Opcode::LoadName(idx), span.line);
                return Ok(());
            }
            TokenKind::LParen => {
                self.advance();
                self.expression()?;
                return self.expect(&TokenKind::RParen);
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        let idx = self.program.add_constant(value)?;
        self.emit(Opcode::LoadConst(idx), span.line);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Runs `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested(&mut self, parse: fn(&mut Self) -> Result<()>) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(self.current.span, "too deeply nested"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.previous_line = self.current.span.line;
        let following = self.lexer.next_token();
        self.current = mem::replace(&mut self.next, following);
    }

    /// Expects a specific token kind and advances.
    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        if mem::discriminant(&self.current.kind) == mem::discriminant(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected.name()))
        }
    }

    fn emit(&mut self, op: Opcode, line: u32) -> usize {
        self.program.code.emit(op, line)
    }

    /// Points the jump at `idx` to the next instruction to be emitted.
    fn patch_here(&mut self, idx: usize) -> Result<()> {
        let target = self.program.code.next_target()?;
        self.program.code.patch_jump(idx, target)
    }

    fn check_reserved(&self, name: &str, span: Span) -> Result<()> {
        if RESERVED.contains(&name) {
            Err(self.error_at(
                span,
                &format!("'{name}' is not supported in BitQuest scripts"),
            ))
        } else {
            Ok(())
        }
    }

    /// Builds the error for a token that does not fit here.
    fn unexpected(&self, expected: &str) -> Error {
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::Error(message) => self.error_at(span, message),
            TokenKind::Name(name) if RESERVED.contains(&name.as_str()) => self.error_at(
                span,
                &format!("'{name}' is not supported in BitQuest scripts"),
            ),
            TokenKind::Indent => self.error_at(span, "unexpected indent"),
            kind => self.error_at(
                span,
                &format!("expected {expected}, found {}", kind.name()),
            ),
        }
    }

    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::syntax(message, span.line, span.column, self.context_at(span))
    }

    /// Gets the source line containing a span for error messages.
    fn context_at(&self, span: Span) -> String {
        let start = span.start.min(self.source.len());
        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |i| start + i);

        self.source[line_start..line_end].to_string()
    }
}

fn is_assign_op(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::SlashAssign
    )
}

fn compare_op(kind: &TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::EqEq => Some(CompareOp::Eq),
        TokenKind::NotEq => Some(CompareOp::Ne),
        TokenKind::Lt => Some(CompareOp::Lt),
        TokenKind::Gt => Some(CompareOp::Gt),
        TokenKind::LtEq => Some(CompareOp::Le),
        TokenKind::GtEq => Some(CompareOp::Ge),
        _ => None,
    }
}
