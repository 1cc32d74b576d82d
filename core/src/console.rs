//! Output and diagnostics collaborators.
//!
//! The core never writes to the process streams directly. Usage text and
//! diagnostics go through a [`Console`], and configuration defects go
//! through a [`Diagnostics`] reporter, so embedding programs and tests can
//! capture both.

use std::io::{self, Write};

use crate::error::ConfigurationError;

/// Destination for usage text and diagnostics.
pub trait Console {
    /// Stream for help that was asked for.
    fn out(&mut self) -> &mut dyn Write;

    /// Stream for failures.
    fn err(&mut self) -> &mut dyn Write;
}

/// [`Console`] over the process's standard output and standard error.
#[derive(Debug)]
pub struct StdConsole {
    out: io::Stdout,
    err: io::Stderr,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            err: io::stderr(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn err(&mut self) -> &mut dyn Write {
        &mut self.err
    }
}

/// In-memory [`Console`], mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    pub out: Vec<u8>,
    pub err: Vec<u8>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn out_text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn err_text(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }
}

impl Console for BufferConsole {
    fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn err(&mut self) -> &mut dyn Write {
        &mut self.err
    }
}

/// Reports defects in the embedding program, such as a declaration whose
/// handler was never bound.
pub trait Diagnostics {
    fn report(&self, error: &ConfigurationError, console: &mut dyn Console);
}

/// Logs the error and writes it, followed by its call stack, to the error
/// stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceDiagnostics;

impl Diagnostics for TraceDiagnostics {
    fn report(&self, error: &ConfigurationError, console: &mut dyn Console) {
        tracing::error!(
            kind = %error.kind,
            action = %error.action,
            handler = %error.handler,
            "configuration error"
        );

        let err = console.err();
        let written = writeln!(err, "configuration error: {error}")
            .and_then(|()| writeln!(err, "stack backtrace:\n{}", error.trace()));
        if let Err(io_err) = written {
            tracing::warn!(error = %io_err, "failed to write configuration error");
        }
    }
}
