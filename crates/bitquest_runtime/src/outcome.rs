//! How a run ended, phrased for the speech bubble.

use std::fmt;

use bitquest_foundation::{Error, ErrorKind};

/// The result of tokenizing and running a script.
///
/// Tokenization and execution are reported separately: a script that
/// fails to tokenize never runs, so it has no step count.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The script did not tokenize; nothing ran.
    Rejected(Error),
    /// The script ran to completion.
    Finished {
        /// Instructions executed.
        steps: u64,
    },
    /// Execution stopped at a runtime error. Host effects up to the
    /// failing instruction have already happened.
    Failed {
        /// The error that stopped the run.
        error: Error,
        /// Instructions executed, including the failing one.
        steps: u64,
    },
}

impl Outcome {
    /// Returns true if the script ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Returns the error, if the script was rejected or failed.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Rejected(error) | Self::Failed { error, .. } => Some(error),
            Self::Finished { .. } => None,
        }
    }

    /// Returns the source line to highlight in the editor, if any.
    #[must_use]
    pub fn error_line(&self) -> Option<u32> {
        self.error().and_then(Error::line)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished { steps } => write!(f, "finished in {steps} steps"),
            Self::Rejected(error) | Self::Failed { error, .. } => {
                f.write_str(&describe_error(error))
            }
        }
    }
}

/// Formats an error as `<Category> on line N: <detail>`.
///
/// The line is omitted when the error carries none.
#[must_use]
pub fn describe_error(error: &Error) -> String {
    let detail = match &error.kind {
        ErrorKind::SyntaxError { message, .. } => message.clone(),
        kind => kind.to_string(),
    };
    match error.line() {
        Some(line) => format!("{} on line {line}: {detail}", error.category()),
        None => format!("{}: {detail}", error.category()),
    }
}
