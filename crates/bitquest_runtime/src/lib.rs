//! Console host, editor REPL, and CLI support for BitQuest.
//!
//! This crate provides:
//! - [`ConsoleHost`] - A [`Host`](bitquest_language::Host) over a terminal
//! - [`Session`] - The script buffer and the settings each run uses
//! - [`Outcome`] - How a run ended, phrased for the speech bubble
//! - [`Repl`] - The interactive, editor-style read-run loop
//! - [`init_logging`] - `tracing` subscriber setup for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod console;
mod editor;
mod highlight;
mod outcome;
mod repl;
mod session;

pub use console::{ConsoleHost, SPEECH_PREFIX};
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use highlight::ScriptHighlighter;
pub use outcome::{Outcome, describe_error};
pub use repl::{Repl, Reply};
pub use session::Session;

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging to stderr.
///
/// Use the `RUST_LOG` environment variable to override the default filter,
/// which is `warn`. With `trace_vm`, every dispatched instruction is logged.
pub fn init_logging(trace_vm: bool) {
    let default = if trace_vm {
        "warn,bitquest_language=trace"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second initialisation (tests, embedding) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
