//! Execution limits for the VM.

/// Configuration for a VM run.
///
/// Scripts are written by students, so a run is bounded by a step budget
/// and a maximum value stack depth. Exceeding either aborts the run with
/// [`ErrorKind::LimitExceeded`](crate::ErrorKind::LimitExceeded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of instructions a single run may execute
    /// (`None` = unbounded).
    pub max_steps: Option<u64>,

    /// Maximum number of values on the value stack.
    pub max_stack_depth: usize,

    /// Emit a `trace` event for every dispatched instruction.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(100_000),
            max_stack_depth: 1024,
            trace: false,
        }
    }
}

impl VmConfig {
    /// Tighter limits suitable for in-game puzzles.
    #[must_use]
    pub fn classroom() -> Self {
        Self {
            max_steps: Some(10_000),
            max_stack_depth: 256,
            trace: false,
        }
    }

    /// No step budget. The stack depth limit still applies.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_steps: None,
            ..Self::default()
        }
    }

    /// Builder method to set the step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Builder method to set the maximum stack depth.
    #[must_use]
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// Builder method to enable per-instruction tracing.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
