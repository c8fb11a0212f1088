//! A [`Host`] that talks to a terminal.

use std::io::{self, BufRead, Stdin, Stdout, Write};

use bitquest_foundation::{Builtin, CallFault, Error, Result};
use bitquest_language::Host;
use tracing::warn;

/// Prefix marking BIT's speech in console output.
pub const SPEECH_PREFIX: &str = "BIT: ";

/// Writes BIT's speech as `BIT: <message>` lines and reads `input()`
/// answers line by line.
pub struct ConsoleHost<R = io::StdinLock<'static>, W = Stdout> {
    reader: R,
    writer: W,
    input_enabled: bool,
}

impl ConsoleHost {
    /// Creates a host over the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleHost<R, W> {
    /// Creates a host over the given reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            input_enabled: true,
        }
    }

    /// Disables `input()`; scripts that call it fail with a call error.
    #[must_use]
    pub fn without_input(mut self) -> Self {
        self.input_enabled = false;
        self
    }

    /// Returns the writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consumes the host, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Host for ConsoleHost<R, W> {
    fn print(&mut self, message: &str) {
        if let Err(e) = writeln!(self.writer, "{SPEECH_PREFIX}{message}") {
            warn!(error = %e, "failed to write speech");
        }
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        if !self.input_enabled {
            return Err(Error::call(CallFault::HostUnavailable {
                capability: Builtin::Input.name(),
            }));
        }

        let io_error = |e: io::Error| Error::invalid_argument(Builtin::Input.name(), e.to_string());
        write!(self.writer, "{prompt}").map_err(io_error)?;
        self.writer.flush().map_err(io_error)?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).map_err(io_error)? == 0 {
            return Err(Error::invalid_argument(Builtin::Input.name(), "end of input"));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}
