//! The host binding surface.
//!
//! A [`Host`] receives the externally visible effects of a run (speech
//! bubble messages, input requests). [`Builtins`] is the explicitly
//! enumerated set of callables a run may reach by name; nothing outside it
//! is visible to scripts.

use std::collections::VecDeque;

use bitquest_foundation::{Builtin, CallFault, Error, Result};

// =============================================================================
// Host Trait
// =============================================================================

/// Capabilities the embedding application provides to scripts.
///
/// Calls are synchronous: the VM blocks until the host returns.
pub trait Host {
    /// Displays one message (the `print` builtin).
    fn print(&mut self, message: &str);

    /// Requests a line of text from the user (the `input` builtin).
    ///
    /// # Errors
    /// The default implementation reports that input is unavailable.
    fn input(&mut self, prompt: &str) -> Result<String> {
        let _ = prompt;
        Err(Error::call(CallFault::HostUnavailable {
            capability: Builtin::Input.name(),
        }))
    }
}

// =============================================================================
// RecordingHost
// =============================================================================

/// A host that records messages in call order and serves scripted input.
///
/// Used by tests and by hosts that check a run's output after the fact.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    messages: Vec<String>,
    prompts: Vec<String>,
    inputs: VecDeque<String>,
}

impl RecordingHost {
    /// Creates a host with no scripted input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host that answers `input()` calls with `lines`, in order.
    #[must_use]
    pub fn with_inputs<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns the recorded messages.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Returns the prompts passed to `input()`.
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Takes and clears the recorded messages.
    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl Host for RecordingHost {
    fn print(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.inputs
            .pop_front()
            .ok_or_else(|| Error::invalid_argument(Builtin::Input.name(), "no more input"))
    }
}

// =============================================================================
// Builtins
// =============================================================================

/// The set of builtins enabled for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Builtins {
    mask: u16,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::standard()
    }
}

impl Builtins {
    /// Every builtin.
    #[must_use]
    pub const fn standard() -> Self {
        let mut mask = 0;
        let mut i = 0;
        while i < Builtin::ALL.len() {
            mask |= bit(Builtin::ALL[i]);
            i += 1;
        }
        Self { mask }
    }

    /// No builtins at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self { mask: 0 }
    }

    /// Exactly the given builtins.
    #[must_use]
    pub fn only(builtins: &[Builtin]) -> Self {
        builtins.iter().fold(Self::empty(), |set, &b| set.with(b))
    }

    /// This set plus `builtin`.
    #[must_use]
    pub const fn with(self, builtin: Builtin) -> Self {
        Self {
            mask: self.mask | bit(builtin),
        }
    }

    /// This set minus `builtin`.
    #[must_use]
    pub const fn without(self, builtin: Builtin) -> Self {
        Self {
            mask: self.mask & !bit(builtin),
        }
    }

    /// Returns true if `builtin` is enabled.
    #[must_use]
    pub const fn contains(self, builtin: Builtin) -> bool {
        self.mask & bit(builtin) != 0
    }

    /// Resolves a script-visible name to an enabled builtin.
    #[must_use]
    pub fn lookup(self, name: &str) -> Option<Builtin> {
        Builtin::from_name(name).filter(|&b| self.contains(b))
    }

    /// Iterates over the enabled builtins in a stable order.
    pub fn iter(self) -> impl Iterator<Item = Builtin> {
        Builtin::ALL.into_iter().filter(move |&b| self.contains(b))
    }

    /// Returns the number of enabled builtins.
    #[must_use]
    pub const fn len(self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Returns true if no builtins are enabled.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.mask == 0
    }
}

const fn bit(builtin: Builtin) -> u16 {
    1 << builtin as u16
}
