//! Session state for the editor REPL.
//!
//! The session holds the script being edited, the limits each run uses,
//! and the builtins BIT is allowed to reach. Every run compiles the whole
//! buffer fresh; nothing from one run leaks into the next.

use std::fs;
use std::path::Path;

use bitquest_foundation::{Error, Result, VmConfig};
use bitquest_language::{Builtins, Host, Program, Vm, compile};
use tracing::{debug, info};

use crate::outcome::Outcome;

/// The script editor plus the settings used to run it.
#[derive(Debug, Default)]
pub struct Session {
    /// Script lines, in order.
    lines: Vec<String>,

    /// Limits applied to each run.
    config: VmConfig,

    /// Builtins reachable from scripts.
    builtins: Builtins,

    /// The VM, kept so the last run's locals can be inspected.
    vm: Vm,
}

impl Session {
    /// Creates an empty session with default limits and every builtin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the run limits.
    #[must_use]
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.vm = Vm::new(config.clone());
        self.config = config;
        self
    }

    /// Sets the builtins reachable from scripts.
    #[must_use]
    pub fn with_builtins(mut self, builtins: Builtins) -> Self {
        self.builtins = builtins;
        self
    }

    /// Returns the run limits.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Returns the enabled builtins.
    #[must_use]
    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    /// Returns the script lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns true if the script is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends a line to the script.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Removes and returns the last line.
    pub fn undo(&mut self) -> Option<String> {
        self.lines.pop()
    }

    /// Empties the script.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Replaces the script with the contents of `source`.
    pub fn load_source(&mut self, source: &str) {
        self.lines = source.lines().map(String::from).collect();
    }

    /// Replaces the script with the contents of a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), &e))?;
        self.load_source(&source);
        info!(path = %path.display(), lines = self.lines.len(), "loaded script");
        Ok(())
    }

    /// Renders the script with 1-based line numbers, as the editor shows it.
    #[must_use]
    pub fn numbered(&self) -> Vec<String> {
        let width = self.lines.len().to_string().len();
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>width$} | {line}", i + 1))
            .collect()
    }

    /// Tokenizes the script.
    ///
    /// # Errors
    /// Returns the `SyntaxError` for the first malformed line.
    pub fn compile(&self) -> Result<Program> {
        compile(self.lines.as_slice())
    }

    /// Tokenizes and runs the script, sending effects to `host`.
    pub fn run(&mut self, host: &mut dyn Host) -> Outcome {
        let program = match self.compile() {
            Ok(program) => program,
            Err(error) => {
                debug!(error = %error, "script rejected");
                return Outcome::Rejected(error);
            }
        };
        match self.vm.run(&program, &self.builtins, host) {
            Ok(_) => Outcome::Finished {
                steps: self.vm.steps(),
            },
            Err(error) => Outcome::Failed {
                error,
                steps: self.vm.steps(),
            },
        }
    }

    /// Returns the VM used for the last run.
    #[must_use]
    pub fn vm(&self) -> &Vm {
        &self.vm
    }
}
