//! Bytecode instruction set for the BitQuest VM.
//!
//! The VM is stack-based. Most operations consume operands from the stack
//! and push results back. Operand indices refer to the program's constant
//! and name tables; jump operands are absolute instruction indices.

#![allow(clippy::doc_markdown)]

use std::cmp::Ordering;
use std::fmt;

use bitquest_foundation::{Error, Result};

/// Relational operator carried by `COMPARE_OP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Every comparison operator.
    pub const ALL: [Self; 6] = [Self::Eq, Self::Ne, Self::Lt, Self::Gt, Self::Le, Self::Ge];

    /// Returns the operator's source symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    /// Parses an operator symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Returns true if `ordering` satisfies this operator.
    #[must_use]
    pub const fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Gt => ordering.is_gt(),
            Self::Le => ordering.is_le(),
            Self::Ge => ordering.is_ge(),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single bytecode instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Opcode {
    // === Constants and Names ===
    /// Push a constant from the constant table.
    LoadConst(u32),
    /// Push the value bound to a name (locals first, then builtins).
    LoadName(u32),
    /// Same as `LoadName`; accepted from listings.
    LoadFast(u32),
    /// Pop the top of stack and bind it to a name.
    StoreName(u32),
    /// Same as `StoreName`; accepted from listings.
    StoreFast(u32),

    // === Arithmetic ===
    /// Add: `[a, b] -> [a + b]`
    BinaryAdd,
    /// Subtract: `[a, b] -> [a - b]`
    BinarySubtract,
    /// Multiply: `[a, b] -> [a * b]`
    BinaryMultiply,
    /// True division, always a float: `[a, b] -> [a / b]`
    BinaryTrueDivide,
    /// Floor division: `[a, b] -> [a // b]`
    BinaryFloorDivide,
    /// Modulo with the sign of the divisor: `[a, b] -> [a % b]`
    BinaryModulo,
    /// Negate: `[a] -> [-a]`
    UnaryNegative,
    /// Logical not: `[a] -> [not a]`
    UnaryNot,

    // === Comparison ===
    /// Compare: `[a, b] -> [a op b]`
    CompareOp(CompareOp),

    // === Calls and Stack ===
    /// Call with N arguments: `[f, a1 .. aN] -> [f(a1 .. aN)]`
    CallFunction(u32),
    /// Pop and discard the top of stack.
    PopTop,
    /// Pop the top of stack and end the run with it.
    ReturnValue,

    // === Control Flow ===
    /// Unconditional jump.
    JumpAbsolute(u32),
    /// Pop; jump if falsy.
    PopJumpIfFalse(u32),
    /// Pop; jump if truthy.
    PopJumpIfTrue(u32),
    /// Jump (keeping the value) if falsy, otherwise pop.
    JumpIfFalseOrPop(u32),
    /// Jump (keeping the value) if truthy, otherwise pop.
    JumpIfTrueOrPop(u32),

    // === Iteration ===
    /// Replace an iterable on top of stack with an iterator over it.
    GetIter,
    /// Push the iterator's next item, or pop the exhausted iterator and jump.
    ForIter(u32),

    /// A mnemonic the dispatcher does not implement.
    Unknown {
        /// The mnemonic as written.
        mnemonic: String,
        /// Its operand text, if any.
        arg: Option<String>,
    },
}

impl Opcode {
    /// Returns the instruction's mnemonic, or `UNKNOWN` for unrecognised ones.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadConst(_) => "LOAD_CONST",
            Self::LoadName(_) => "LOAD_NAME",
            Self::LoadFast(_) => "LOAD_FAST",
            Self::StoreName(_) => "STORE_NAME",
            Self::StoreFast(_) => "STORE_FAST",
            Self::BinaryAdd => "BINARY_ADD",
            Self::BinarySubtract => "BINARY_SUBTRACT",
            Self::BinaryMultiply => "BINARY_MULTIPLY",
            Self::BinaryTrueDivide => "BINARY_TRUE_DIVIDE",
            Self::BinaryFloorDivide => "BINARY_FLOOR_DIVIDE",
            Self::BinaryModulo => "BINARY_MODULO",
            Self::UnaryNegative => "UNARY_NEGATIVE",
            Self::UnaryNot => "UNARY_NOT",
            Self::CompareOp(_) => "COMPARE_OP",
            Self::CallFunction(_) => "CALL_FUNCTION",
            Self::PopTop => "POP_TOP",
            Self::ReturnValue => "RETURN_VALUE",
            Self::JumpAbsolute(_) => "JUMP_ABSOLUTE",
            Self::PopJumpIfFalse(_) => "POP_JUMP_IF_FALSE",
            Self::PopJumpIfTrue(_) => "POP_JUMP_IF_TRUE",
            Self::JumpIfFalseOrPop(_) => "JUMP_IF_FALSE_OR_POP",
            Self::JumpIfTrueOrPop(_) => "JUMP_IF_TRUE_OR_POP",
            Self::GetIter => "GET_ITER",
            Self::ForIter(_) => "FOR_ITER",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Returns the mnemonic as it appears in a listing.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        match self {
            Self::Unknown { mnemonic, .. } => mnemonic,
            other => other.name(),
        }
    }

    /// Returns the numeric operand, if this instruction has one.
    #[must_use]
    pub const fn operand(&self) -> Option<u32> {
        match self {
            Self::LoadConst(n)
            | Self::LoadName(n)
            | Self::LoadFast(n)
            | Self::StoreName(n)
            | Self::StoreFast(n)
            | Self::CallFunction(n)
            | Self::JumpAbsolute(n)
            | Self::PopJumpIfFalse(n)
            | Self::PopJumpIfTrue(n)
            | Self::JumpIfFalseOrPop(n)
            | Self::JumpIfTrueOrPop(n)
            | Self::ForIter(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the jump target, if this is a jump instruction.
    #[must_use]
    pub const fn jump_target(&self) -> Option<u32> {
        match self {
            Self::JumpAbsolute(t)
            | Self::PopJumpIfFalse(t)
            | Self::PopJumpIfTrue(t)
            | Self::JumpIfFalseOrPop(t)
            | Self::JumpIfTrueOrPop(t)
            | Self::ForIter(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns true if the operand indexes the constant table.
    #[must_use]
    pub const fn uses_constant(&self) -> bool {
        matches!(self, Self::LoadConst(_))
    }

    /// Returns true if the operand indexes the name table.
    #[must_use]
    pub const fn uses_name(&self) -> bool {
        matches!(
            self,
            Self::LoadName(_) | Self::LoadFast(_) | Self::StoreName(_) | Self::StoreFast(_)
        )
    }
}

/// An opcode together with the source line it was compiled from.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// The operation.
    pub op: Opcode,
    /// 1-based source line.
    pub line: u32,
}

/// A sequence of bytecode instructions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bytecode {
    /// The instructions.
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    /// Creates an empty bytecode sequence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, op: Opcode, line: u32) -> usize {
        let idx = self.instructions.len();
        self.instructions.push(Instruction { op, line });
        idx
    }

    /// Returns the current instruction count (next instruction index).
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if there are no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the instruction at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Instruction> {
        self.instructions.get(idx)
    }

    /// Returns the index the next emitted instruction will get, as a jump target.
    ///
    /// # Errors
    /// Returns an internal error if the program outgrows the operand width.
    pub fn next_target(&self) -> Result<u32> {
        u32::try_from(self.instructions.len())
            .map_err(|_| Error::internal("program too large for jump targets"))
    }

    /// Patches the jump instruction at `idx` to land on `target`.
    ///
    /// # Errors
    /// Returns an internal error if the instruction at `idx` is not a jump.
    pub fn patch_jump(&mut self, idx: usize, target: u32) -> Result<()> {
        match self.instructions.get_mut(idx).map(|i| &mut i.op) {
            Some(
                Opcode::JumpAbsolute(t)
                | Opcode::PopJumpIfFalse(t)
                | Opcode::PopJumpIfTrue(t)
                | Opcode::JumpIfFalseOrPop(t)
                | Opcode::JumpIfTrueOrPop(t)
                | Opcode::ForIter(t),
            ) => {
                *t = target;
                Ok(())
            }
            other => Err(Error::internal(format!(
                "cannot patch non-jump instruction at {idx}: {other:?}"
            ))),
        }
    }
}
