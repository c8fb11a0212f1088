//! Stack-based virtual machine for BitQuest bytecode.
//!
//! The VM runs a compiled [`Program`] to completion or to the first fatal
//! error. Each run starts from a fresh [`ValueStack`] and [`NameTable`];
//! nothing carries over from one run to the next except the step count and
//! the final locals, kept for host inspection.
//!
//! # Host Access
//!
//! Scripts reach the outside world only through the builtins enabled in a
//! [`Builtins`] set. The `print` and `input` builtins forward to a [`Host`],
//! whose effects are the only externally observable results of a run.
//!
//! # Limits
//!
//! [`VmConfig::max_steps`] bounds the number of dispatched instructions and
//! [`VmConfig::max_stack_depth`] bounds the value stack. Tripping either
//! aborts the run with `LimitExceeded`.

mod host;
mod names;
mod native;
mod stack;

pub use host::{Builtins, Host, RecordingHost};
pub use names::NameTable;
pub use stack::ValueStack;

use bitquest_foundation::{
    CallFault, Error, ErrorContext, ErrorKind, IterState, Result, SemanticLimit, Value, VmConfig,
};
use tracing::{debug, instrument, trace, warn};

use crate::opcode::{Instruction, Opcode};
use crate::program::Program;
use native::{
    add_values, call_builtin, compare_values, floor_div_values, mod_values, mul_values, neg_value,
    sub_values, true_div_values,
};

/// What the dispatch loop does after an instruction.
enum Flow {
    /// Fall through to the next instruction (or a jump target already set).
    Next,
    /// End the run with this value.
    Return(Value),
}

/// Stack-based virtual machine.
#[derive(Debug, Default)]
pub struct Vm {
    /// Execution limits.
    config: VmConfig,
    /// Operand stack.
    stack: ValueStack,
    /// Name bindings.
    names: NameTable,
    /// Instruction pointer.
    ip: usize,
    /// Instructions dispatched by the current (or last) run.
    steps: u64,
}

impl Vm {
    /// Creates a new VM with the given limits.
    #[must_use]
    pub fn new(config: VmConfig) -> Self {
        Self {
            stack: ValueStack::with_limit(config.max_stack_depth),
            config,
            names: NameTable::default(),
            ip: 0,
            steps: 0,
        }
    }

    /// Returns the number of instructions the last run dispatched.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Iterates over the local bindings left by the last run, in name order.
    pub fn locals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.locals()
    }

    /// Returns one local binding left by the last run.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.names.local(name)
    }

    /// Runs a program to completion.
    ///
    /// Returns the value of the final `RETURN_VALUE` (`None` for compiled
    /// scripts), or `None` if execution falls off the end of the program.
    ///
    /// # Errors
    /// Returns the first fatal error, with an [`ErrorContext`] naming the
    /// source line, offset and opcode of the failing instruction. Effects
    /// already delivered to the host are not rolled back.
    #[instrument(skip_all, fields(instructions = program.len()))]
    pub fn run(
        &mut self,
        program: &Program,
        builtins: &Builtins,
        host: &mut dyn Host,
    ) -> Result<Value> {
        self.reset(*builtins);
        debug!(max_steps = ?self.config.max_steps, "run started");

        let result = self.execute(program, host);
        match &result {
            Ok(value) => debug!(steps = self.steps, result = %value.repr(), "run finished"),
            Err(e) => debug!(steps = self.steps, error = %e, "run failed"),
        }
        result
    }

    fn reset(&mut self, builtins: Builtins) {
        self.stack = ValueStack::with_limit(self.config.max_stack_depth);
        self.names = NameTable::new(builtins);
        self.ip = 0;
        self.steps = 0;
    }

    fn execute(&mut self, program: &Program, host: &mut dyn Host) -> Result<Value> {
        while let Some(instruction) = program.instruction(self.ip) {
            let offset = self.ip;
            self.ip += 1;

            let flow = self
                .tick()
                .and_then(|()| self.dispatch(program, instruction, host))
                .map_err(|e| e.with_context(context_for(instruction, offset)))?;

            if let Flow::Return(value) = flow {
                return Ok(value);
            }
        }
        Ok(Value::None)
    }

    /// Counts one dispatched instruction against the step budget.
    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if let Some(limit) = self.config.max_steps {
            if self.steps > limit {
                warn!(limit, "step budget exhausted");
                return Err(Error::limit_exceeded(SemanticLimit::MaxSteps { limit }));
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(
        &mut self,
        program: &Program,
        instruction: &Instruction,
        host: &mut dyn Host,
    ) -> Result<Flow> {
        let op = &instruction.op;
        let name = op.name();
        if self.config.trace {
            trace!(
                offset = self.ip - 1,
                line = instruction.line,
                opcode = op.mnemonic(),
                depth = self.stack.len(),
                "dispatch"
            );
        }

        match op {
            Opcode::LoadConst(idx) => {
                let value = program.constant(*idx)?.clone();
                self.push(value)?;
            }
            Opcode::LoadName(idx) | Opcode::LoadFast(idx) => {
                let value = self.names.load(program.name(*idx)?)?;
                self.push(value)?;
            }
            Opcode::StoreName(idx) | Opcode::StoreFast(idx) => {
                let value = self.stack.pop(name)?;
                self.names.store(program.name(*idx)?, value);
            }

            // Arithmetic
            Opcode::BinaryAdd => self.binary_op(name, add_values)?,
            Opcode::BinarySubtract => self.binary_op(name, sub_values)?,
            Opcode::BinaryMultiply => self.binary_op(name, mul_values)?,
            Opcode::BinaryTrueDivide => self.binary_op(name, true_div_values)?,
            Opcode::BinaryFloorDivide => self.binary_op(name, floor_div_values)?,
            Opcode::BinaryModulo => self.binary_op(name, mod_values)?,
            Opcode::UnaryNegative => {
                let a = self.stack.pop(name)?;
                self.push(neg_value(a)?)?;
            }
            Opcode::UnaryNot => {
                let a = self.stack.pop(name)?;
                self.push(Value::Bool(!a.is_truthy()))?;
            }

            // Comparison
            Opcode::CompareOp(cmp) => self.binary_op(name, |a, b| compare_values(*cmp, a, b))?,

            // Calls and stack
            Opcode::CallFunction(argc) => {
                let args = self.stack.pop_n(*argc as usize, name)?;
                let callee = self.stack.pop(name)?;
                let result = match callee {
                    Value::Builtin(builtin) => call_builtin(builtin, &args, host)?,
                    other => {
                        return Err(Error::call(CallFault::NotCallable(other.value_type())));
                    }
                };
                self.push(result)?;
            }
            Opcode::PopTop => {
                self.stack.pop(name)?;
            }
            Opcode::ReturnValue => {
                let value = self.stack.pop(name)?;
                return Ok(Flow::Return(value));
            }

            // Control flow
            Opcode::JumpAbsolute(target) => self.jump(program, *target)?,
            Opcode::PopJumpIfFalse(target) => {
                if !self.stack.pop(name)?.is_truthy() {
                    self.jump(program, *target)?;
                }
            }
            Opcode::PopJumpIfTrue(target) => {
                if self.stack.pop(name)?.is_truthy() {
                    self.jump(program, *target)?;
                }
            }
            Opcode::JumpIfFalseOrPop(target) => {
                if self.stack.peek(name)?.is_truthy() {
                    self.stack.pop(name)?;
                } else {
                    self.jump(program, *target)?;
                }
            }
            Opcode::JumpIfTrueOrPop(target) => {
                if self.stack.peek(name)?.is_truthy() {
                    self.jump(program, *target)?;
                } else {
                    self.stack.pop(name)?;
                }
            }

            // Iteration
            Opcode::GetIter => {
                let iterable = self.stack.pop(name)?;
                let iter = match iterable {
                    Value::Range(range) => range.iter(),
                    Value::Str(text) => IterState::chars(text),
                    Value::Iter(iter) => iter,
                    other => {
                        return Err(Error::type_mismatch(
                            "an iterable (range or str)",
                            other.value_type(),
                        ));
                    }
                };
                self.push(Value::Iter(iter))?;
            }
            Opcode::ForIter(target) => {
                let next = match self.stack.peek_mut(name)? {
                    Value::Iter(iter) => iter.advance(),
                    other => return Err(Error::type_mismatch("an iterator", other.value_type())),
                };
                match next {
                    Some(item) => self.push(item)?,
                    None => {
                        self.stack.pop(name)?;
                        self.jump(program, *target)?;
                    }
                }
            }

            Opcode::Unknown { mnemonic, arg } => {
                return Err(Error::new(ErrorKind::UnknownOpcode {
                    opcode: mnemonic.clone(),
                    arg: arg.clone(),
                }));
            }
        }

        Ok(Flow::Next)
    }

    fn push(&mut self, value: Value) -> Result<()> {
        self.stack.push(value).inspect_err(|_| {
            warn!(limit = self.stack.limit(), "stack depth limit reached");
        })
    }

    fn binary_op<F>(&mut self, name: &'static str, op: F) -> Result<()>
    where
        F: FnOnce(Value, Value) -> Result<Value>,
    {
        let b = self.stack.pop(name)?;
        let a = self.stack.pop(name)?;
        let result = op(a, b)?;
        self.push(result)
    }

    /// Moves the instruction pointer. A target equal to the program length
    /// ends the run normally.
    fn jump(&mut self, program: &Program, target: u32) -> Result<()> {
        let target = target as usize;
        if target > program.len() {
            return Err(Error::internal(format!(
                "jump target {target} outside program of {} instructions",
                program.len()
            )));
        }
        self.ip = target;
        Ok(())
    }
}

fn context_for(instruction: &Instruction, offset: usize) -> ErrorContext {
    ErrorContext::new()
        .with_line(instruction.line)
        .with_offset(offset)
        .with_opcode(instruction.op.mnemonic())
}
