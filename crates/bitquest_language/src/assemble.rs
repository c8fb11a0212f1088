//! Loader for textual bytecode listings.
//!
//! A listing has one instruction per line, `MNEMONIC [operand]`, in the
//! same shape [`Program::to_listing`] produces. Blank lines and lines
//! starting with `#` are skipped. Each instruction records its 1-based
//! listing line, so runtime errors point back into the listing.
//!
//! Mnemonics the dispatcher does not implement still load, as
//! [`Opcode::Unknown`]; they only fail if execution reaches them.

use bitquest_foundation::{Error, Result, Value};
use tracing::{debug, instrument};

use crate::opcode::{CompareOp, Opcode};
use crate::program::Program;

/// Loads a listing into a [`Program`].
///
/// # Errors
/// Returns a `SyntaxError` if an operand is missing or malformed for a
/// known mnemonic.
#[instrument(skip_all, fields(lines = lines.len()))]
pub fn assemble<S: AsRef<str>>(lines: &[S]) -> Result<Program> {
    let mut program = Program::new();
    for (line_no, raw) in (1u32..).zip(lines) {
        let raw: &str = raw.as_ref();
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let indent = raw.len() - raw.trim_start().len();
        let column = u32::try_from(indent).unwrap_or(u32::MAX).saturating_add(1);
        let line = Line {
            raw,
            number: line_no,
            column,
        };

        let (mnemonic, operand) = match text.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, Some(rest.trim())),
            None => (text, None),
        };
        let op = line.instruction(&mut program, mnemonic, operand)?;
        program.code.emit(op, line_no);
    }
    debug!(instructions = program.len(), "assembled listing");
    Ok(program)
}

/// One non-blank listing line, for error reporting.
struct Line<'a> {
    raw: &'a str,
    number: u32,
    column: u32,
}

impl Line<'_> {
    fn instruction(
        &self,
        program: &mut Program,
        mnemonic: &str,
        operand: Option<&str>,
    ) -> Result<Opcode> {
        let op = match mnemonic {
            "LOAD_CONST" => Opcode::LoadConst(program.add_constant(self.literal(operand)?)?),
            "LOAD_NAME" => Opcode::LoadName(program.add_name(self.identifier(operand)?)?),
            "LOAD_FAST" => Opcode::LoadFast(program.add_name(self.identifier(operand)?)?),
            "STORE_NAME" => Opcode::StoreName(program.add_name(self.identifier(operand)?)?),
            "STORE_FAST" => Opcode::StoreFast(program.add_name(self.identifier(operand)?)?),
            "COMPARE_OP" => Opcode::CompareOp(self.compare(operand)?),
            "CALL_FUNCTION" => Opcode::CallFunction(self.number(operand)?),
            "JUMP_ABSOLUTE" => Opcode::JumpAbsolute(self.number(operand)?),
            "POP_JUMP_IF_FALSE" => Opcode::PopJumpIfFalse(self.number(operand)?),
            "POP_JUMP_IF_TRUE" => Opcode::PopJumpIfTrue(self.number(operand)?),
            "JUMP_IF_FALSE_OR_POP" => Opcode::JumpIfFalseOrPop(self.number(operand)?),
            "JUMP_IF_TRUE_OR_POP" => Opcode::JumpIfTrueOrPop(self.number(operand)?),
            "FOR_ITER" => Opcode::ForIter(self.number(operand)?),
            _ => {
                let bare = match mnemonic {
                    "BINARY_ADD" => Some(Opcode::BinaryAdd),
                    "BINARY_SUBTRACT" => Some(Opcode::BinarySubtract),
                    "BINARY_MULTIPLY" => Some(Opcode::BinaryMultiply),
                    "BINARY_TRUE_DIVIDE" => Some(Opcode::BinaryTrueDivide),
                    "BINARY_FLOOR_DIVIDE" => Some(Opcode::BinaryFloorDivide),
                    "BINARY_MODULO" => Some(Opcode::BinaryModulo),
                    "UNARY_NEGATIVE" => Some(Opcode::UnaryNegative),
                    "UNARY_NOT" => Some(Opcode::UnaryNot),
                    "POP_TOP" => Some(Opcode::PopTop),
                    "RETURN_VALUE" => Some(Opcode::ReturnValue),
                    "GET_ITER" => Some(Opcode::GetIter),
                    _ => None,
                };
                match bare {
                    Some(op) => {
                        if operand.is_some() {
                            return Err(self.error(&format!("{mnemonic} takes no operand")));
                        }
                        op
                    }
                    None => Opcode::Unknown {
                        mnemonic: mnemonic.to_string(),
                        arg: operand.map(str::to_string),
                    },
                }
            }
        };
        Ok(op)
    }

    fn required<'o>(&self, operand: Option<&'o str>, what: &str) -> Result<&'o str> {
        operand.ok_or_else(|| self.error(&format!("expected {what} operand")))
    }

    fn number(&self, operand: Option<&str>) -> Result<u32> {
        let text = self.required(operand, "an integer")?;
        text.parse()
            .map_err(|_| self.error(&format!("invalid integer operand: {text}")))
    }

    fn identifier<'o>(&self, operand: Option<&'o str>) -> Result<&'o str> {
        let text = self.required(operand, "a name")?;
        let mut chars = text.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_');
        if valid {
            Ok(text)
        } else {
            Err(self.error(&format!("invalid name operand: {text}")))
        }
    }

    fn compare(&self, operand: Option<&str>) -> Result<CompareOp> {
        let text = self.required(operand, "a comparison")?;
        CompareOp::from_symbol(text)
            .ok_or_else(|| self.error(&format!("invalid comparison operand: {text}")))
    }

    fn literal(&self, operand: Option<&str>) -> Result<Value> {
        let text = self.required(operand, "a constant")?;
        match text {
            "None" => return Ok(Value::None),
            "True" => return Ok(Value::Bool(true)),
            "False" => return Ok(Value::Bool(false)),
            "inf" => return Ok(Value::Float(f64::INFINITY)),
            "-inf" => return Ok(Value::Float(f64::NEG_INFINITY)),
            "nan" => return Ok(Value::Float(f64::NAN)),
            _ => {}
        }
        if text.starts_with(['\'', '"']) {
            return self.string_literal(text).map(Value::from);
        }
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        let numeric = text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
        match text.parse::<f64>() {
            Ok(f) if numeric => Ok(Value::Float(f)),
            _ => Err(self.error(&format!("invalid constant operand: {text}"))),
        }
    }

    fn string_literal(&self, text: &str) -> Result<String> {
        let mut chars = text.chars();
        let Some(quote) = chars.next() else {
            return Err(self.error("expected a constant operand"));
        };
        let mut out = String::new();
        loop {
            match chars.next() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escaped = match chars.next() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        _ => return Err(self.error("invalid escape sequence")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
        if chars.next().is_some() {
            return Err(self.error("unexpected text after string literal"));
        }
        Ok(out)
    }

    fn error(&self, message: &str) -> Error {
        Error::syntax(message, self.number, self.column, self.raw.to_string())
    }
}
