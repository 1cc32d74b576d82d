//! Outermost entry point: dispatch, then decide the exit status.
//!
//! This is the only place that maps outcomes and errors to exit statuses and
//! output streams:
//!
//! | outcome                  | stream | status                      |
//! |--------------------------|--------|-----------------------------|
//! | action completed         |        | 0                           |
//! | help requested           | stdout | `help_status`, else 0       |
//! | usage error              | stderr | 2                           |
//! | configuration error      | stderr | 70                          |
//! | handler error            | stderr | chosen by the handler       |

use std::ffi::OsString;
use std::io::{self, Write};

use tracing::{debug, warn};

use crate::console::{Console, Diagnostics, TraceDiagnostics};
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::DispatchError;
use crate::registry::Registry;
use crate::usage;

/// Process exit status produced by [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus(pub u8);

impl ExitStatus {
    pub const SUCCESS: Self = Self(0);
    /// Bad command-line input.
    pub const USAGE: Self = Self(2);
    /// Defect in the embedding program (`EX_SOFTWARE`).
    pub const SOFTWARE: Self = Self(70);

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.0)
    }
}

/// Dispatches `args` and reports the result on `console`, using
/// [`TraceDiagnostics`] for configuration errors.
///
/// # Examples
///
/// ```
/// use command_dispatch_core::{BufferConsole, ExitStatus, Registry, Settings, run};
///
/// let registry: Registry<()> = Registry::with_settings(Settings::for_program("widget"));
/// let mut console = BufferConsole::new();
///
/// let status = run(&registry, &mut (), &["--bogus".to_string()], &mut console);
/// assert_eq!(status, ExitStatus::USAGE);
/// assert!(console.err_text().starts_with("widget: error: unrecognized option '--bogus'"));
/// ```
pub fn run<C>(
    registry: &Registry<C>,
    ctx: &mut C,
    args: &[String],
    console: &mut dyn Console,
) -> ExitStatus {
    run_with(registry, ctx, args, console, &TraceDiagnostics)
}

/// Like [`run`], with a caller-supplied [`Diagnostics`] reporter.
pub fn run_with<C>(
    registry: &Registry<C>,
    ctx: &mut C,
    args: &[String],
    console: &mut dyn Console,
    diagnostics: &dyn Diagnostics,
) -> ExitStatus {
    let result = Dispatcher::new(registry).dispatch(ctx, args);
    let status = match result {
        Ok(Outcome::Completed { action }) => {
            debug!(action = %action, "dispatch completed");
            ExitStatus::SUCCESS
        }
        Ok(Outcome::Help { action }) => {
            report_io(usage::render(registry, &action, console.out()));
            ExitStatus(registry.settings().help_status.unwrap_or(0))
        }
        Err(DispatchError::Configuration(error)) => {
            diagnostics.report(&error, console);
            ExitStatus::SOFTWARE
        }
        Err(DispatchError::Handler(error)) => {
            if !error.message.is_empty() {
                let program = &registry.settings().program;
                report_io(writeln!(console.err(), "{program}: {}", error.message));
            }
            // a failed handler never exits 0
            ExitStatus(error.status.max(1))
        }
        Err(error) => {
            report_io(usage_error(registry, &error, console));
            ExitStatus::USAGE
        }
    };
    debug!(status = status.code(), "exit status decided");
    status
}

/// Command-line arguments of the current process, program name excluded.
/// Arguments that are not valid UTF-8 are converted lossily.
pub fn env_args() -> Vec<String> {
    std::env::args_os()
        .skip(1)
        .map(|arg: OsString| arg.to_string_lossy().into_owned())
        .collect()
}

fn usage_error<C>(
    registry: &Registry<C>,
    error: &DispatchError,
    console: &mut dyn Console,
) -> io::Result<()> {
    let program = &registry.settings().program;
    let err = console.err();
    writeln!(err, "{program}: error: {error}")?;
    match error.usage_action() {
        Some(action) => usage::render(registry, action, err),
        None => Ok(()),
    }
}

fn report_io(result: io::Result<()>) {
    if let Err(error) = result {
        warn!(%error, "failed to write to console");
    }
}
