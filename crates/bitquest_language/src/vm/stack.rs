//! The value stack.

use bitquest_foundation::{Error, Result, SemanticLimit, Value};

/// LIFO operand storage for the executor.
///
/// Reading below depth zero is a [`StackUnderflow`] naming the instruction
/// that tried it; growing past the configured limit is a
/// [`LimitExceeded`].
///
/// [`StackUnderflow`]: bitquest_foundation::ErrorKind::StackUnderflow
/// [`LimitExceeded`]: bitquest_foundation::ErrorKind::LimitExceeded
#[derive(Clone, Debug)]
pub struct ValueStack {
    values: Vec<Value>,
    limit: usize,
}

impl Default for ValueStack {
    fn default() -> Self {
        Self::with_limit(1024)
    }
}

impl ValueStack {
    /// Creates an empty stack holding at most `limit` values.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            values: Vec::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Pushes a value.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the stack is full.
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.values.len() >= self.limit {
            return Err(Error::limit_exceeded(SemanticLimit::MaxStackDepth {
                limit: self.limit,
            }));
        }
        self.values.push(value);
        Ok(())
    }

    /// Pops the top value on behalf of `opcode`.
    ///
    /// # Errors
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn pop(&mut self, opcode: &'static str) -> Result<Value> {
        self.values
            .pop()
            .ok_or_else(|| Error::stack_underflow(opcode))
    }

    /// Returns the top value without removing it.
    ///
    /// # Errors
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn peek(&self, opcode: &'static str) -> Result<&Value> {
        self.values
            .last()
            .ok_or_else(|| Error::stack_underflow(opcode))
    }

    /// Returns the top value mutably.
    ///
    /// # Errors
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn peek_mut(&mut self, opcode: &'static str) -> Result<&mut Value> {
        self.values
            .last_mut()
            .ok_or_else(|| Error::stack_underflow(opcode))
    }

    /// Pops the top `n` values, returned in push order.
    ///
    /// # Errors
    /// Returns `StackUnderflow` (leaving the stack untouched) if fewer than
    /// `n` values are present.
    pub fn pop_n(&mut self, n: usize, opcode: &'static str) -> Result<Vec<Value>> {
        let Some(split) = self.values.len().checked_sub(n) else {
            return Err(Error::stack_underflow(opcode));
        };
        Ok(self.values.split_off(split))
    }

    /// Returns the number of values on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the configured depth limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}
