//! Executable programs: instructions plus their operand tables.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use bitquest_foundation::{Error, Result, Value};

use crate::opcode::{Bytecode, Instruction, Opcode};

/// A tokenized script, ready to run.
///
/// Built once per run request and never mutated while executing.
#[derive(Clone, Debug, Default)]
pub struct Program {
    /// The instruction sequence.
    pub code: Bytecode,
    /// Literal operands referenced by `LOAD_CONST`.
    pub constants: Vec<Value>,
    /// Identifiers referenced by the name instructions.
    pub names: Vec<String>,
    /// Constant -> index, for deduplication.
    constant_map: HashMap<ConstKey, u32>,
    /// Name -> index, for deduplication.
    name_map: HashMap<String, u32>,
}

/// Key for constant deduplication.
///
/// Constants are shared only when they have the same type and bits, so
/// `1`, `1.0` and `True` (or `0.0` and `-0.0`) stay distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ConstKey {
    None,
    Bool(bool),
    Int(i64),
    Float(u64), // bits representation
    Str(String),
}

impl ConstKey {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::None => Some(Self::None),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Int(n) => Some(Self::Int(*n)),
            Value::Float(f) => Some(Self::Float(f.to_bits())),
            Value::Str(s) => Some(Self::Str(s.to_string())),
            // Runtime-only values are never literals
            Value::Builtin(_) | Value::Range(_) | Value::Iter(_) => None,
        }
    }
}

// The lookup maps mirror the tables, so they take no part in equality.
impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.constants == other.constants && self.names == other.names
    }
}

impl Program {
    /// Creates an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns true if the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Returns the instruction at `offset`.
    #[must_use]
    pub fn instruction(&self, offset: usize) -> Option<&Instruction> {
        self.code.get(offset)
    }

    /// Adds a constant, reusing an identical existing entry.
    ///
    /// # Errors
    /// Returns an internal error if the table outgrows the operand width.
    pub fn add_constant(&mut self, value: Value) -> Result<u32> {
        let key = ConstKey::from_value(&value);
        if let Some(&idx) = key.as_ref().and_then(|k| self.constant_map.get(k)) {
            return Ok(idx);
        }
        let idx = u32::try_from(self.constants.len())
            .map_err(|_| Error::internal("too many constants"))?;
        if let Some(key) = key {
            self.constant_map.insert(key, idx);
        }
        self.constants.push(value);
        Ok(idx)
    }

    /// Adds a name, reusing an existing entry.
    ///
    /// # Errors
    /// Returns an internal error if the table outgrows the operand width.
    pub fn add_name(&mut self, name: &str) -> Result<u32> {
        if let Some(&idx) = self.name_map.get(name) {
            return Ok(idx);
        }
        let idx =
            u32::try_from(self.names.len()).map_err(|_| Error::internal("too many names"))?;
        self.name_map.insert(name.to_string(), idx);
        self.names.push(name.to_string());
        Ok(idx)
    }

    /// Looks up a constant operand.
    ///
    /// # Errors
    /// Returns an internal error if the index is out of range.
    pub fn constant(&self, idx: u32) -> Result<&Value> {
        self.constants
            .get(idx as usize)
            .ok_or_else(|| Error::internal(format!("constant index {idx} out of range")))
    }

    /// Looks up a name operand.
    ///
    /// # Errors
    /// Returns an internal error if the index is out of range.
    pub fn name(&self, idx: u32) -> Result<&str> {
        self.names
            .get(idx as usize)
            .map(String::as_str)
            .ok_or_else(|| Error::internal(format!("name index {idx} out of range")))
    }

    /// Renders the program as a listing, one `MNEMONIC [operand]` per line.
    ///
    /// Operands are resolved (literals, identifiers, operator symbols), so
    /// the listing can be loaded back with [`crate::assemble`].
    #[must_use]
    pub fn to_listing(&self) -> Vec<String> {
        self.code
            .instructions
            .iter()
            .map(|instruction| match self.operand_text(&instruction.op) {
                Some(operand) => format!("{} {operand}", instruction.op.mnemonic()),
                None => instruction.op.mnemonic().to_string(),
            })
            .collect()
    }

    fn operand_text(&self, op: &Opcode) -> Option<String> {
        match op {
            Opcode::LoadConst(idx) => Some(
                self.constant(*idx)
                    .map_or_else(|_| format!("#{idx}"), Value::repr),
            ),
            Opcode::LoadName(idx)
            | Opcode::LoadFast(idx)
            | Opcode::StoreName(idx)
            | Opcode::StoreFast(idx) => Some(
                self.name(*idx)
                    .map_or_else(|_| format!("#{idx}"), str::to_string),
            ),
            Opcode::CompareOp(cmp) => Some(cmp.symbol().to_string()),
            Opcode::Unknown { arg, .. } => arg.clone(),
            other => other.operand().map(|n| n.to_string()),
        }
    }

    fn resolved_operand(&self, op: &Opcode) -> Option<String> {
        match op {
            Opcode::LoadConst(idx) => self.constant(*idx).ok().map(Value::repr),
            op if op.uses_name() => op
                .operand()
                .and_then(|idx| self.name(idx).ok())
                .map(str::to_string),
            Opcode::CompareOp(cmp) => Some(cmp.symbol().to_string()),
            op => op.jump_target().map(|t| format!("to {t}")),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: BTreeSet<u32> = self
            .code
            .instructions
            .iter()
            .filter_map(|i| i.op.jump_target())
            .collect();

        let mut last_line = None;
        for (offset, instruction) in self.code.instructions.iter().enumerate() {
            if last_line == Some(instruction.line) {
                write!(f, "{:>4}", "")?;
            } else {
                if last_line.is_some() {
                    writeln!(f)?;
                }
                write!(f, "{:>4}", instruction.line)?;
                last_line = Some(instruction.line);
            }

            let is_target = u32::try_from(offset).is_ok_and(|o| targets.contains(&o));
            let marker = if is_target { ">>" } else { "" };
            write!(
                f,
                " {marker:>3} {offset:>4} {:<22}",
                instruction.op.mnemonic()
            )?;

            let operand = match &instruction.op {
                Opcode::Unknown { arg, .. } => arg.clone(),
                op => op.operand().map(|n| n.to_string()),
            };
            match (operand, self.resolved_operand(&instruction.op)) {
                (Some(operand), Some(resolved)) if resolved != operand => {
                    write!(f, " {operand:>4} ({resolved})")?;
                }
                (Some(operand), _) => write!(f, " {operand:>4}")?,
                (None, Some(resolved)) => write!(f, "      ({resolved})")?,
                (None, None) => {}
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
