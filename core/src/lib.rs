//! Declarative command-line dispatch.
//!
//! A program declares what it accepts up front and hands the raw argument
//! list to the dispatcher:
//!
//! - [`Registry`]: actions, options and positional parameters, each scoped
//!   to an action name. The implicit root action is [`MAIN`].
//! - [`Dispatcher`]: scans option tokens, routes the first positional token
//!   to a sub-action when the root has no handler of its own, checks the
//!   positional count and calls the action handler.
//! - [`usage_text`] / [`render`]: argparse-style usage generated from the
//!   same declarations.
//! - [`run`]: the outermost entry point that turns a dispatch result into
//!   output on a [`Console`] and an [`ExitStatus`].
//!
//! Handlers receive a caller-owned context `&mut C`; the registry itself is
//! never mutated while dispatching.
//!
//! # Example
//!
//! ```
//! use command_dispatch_core::*;
//!
//! #[derive(Default)]
//! struct Widgets {
//!     quiet: bool,
//!     created: Vec<String>,
//! }
//!
//! let mut registry = Registry::with_settings(Settings::for_program("widget"));
//! registry.declare_option(
//!     MAIN,
//!     "q",
//!     "quiet",
//!     OptionHandler::flag(|w: &mut Widgets| {
//!         w.quiet = true;
//!         Ok(())
//!     }),
//!     "Suppress output",
//! );
//! registry.declare_action(
//!     "create",
//!     Some(ActionHandler::call(|w: &mut Widgets, names: &[String]| {
//!         w.created.extend_from_slice(names);
//!         Ok(())
//!     })),
//!     "Create widgets",
//! );
//! registry.declare_param("create", "name+", "Widget names");
//!
//! let mut widgets = Widgets::default();
//! let mut console = BufferConsole::new();
//! let args: Vec<String> = ["-q", "create", "a", "b"].iter().map(|s| s.to_string()).collect();
//!
//! assert_eq!(run(&registry, &mut widgets, &args, &mut console), ExitStatus::SUCCESS);
//! assert!(widgets.quiet);
//! assert_eq!(widgets.created, ["a", "b"]);
//! ```

mod binder;
mod console;
mod dispatch;
mod error;
mod registry;
mod resolver;
mod run;
mod settings;
mod usage;

pub use console::{BufferConsole, Console, Diagnostics, StdConsole, TraceDiagnostics};
pub use dispatch::{Dispatcher, Outcome, ScanState};
pub use error::{CapturedTrace, ConfigurationError, DispatchError, HandlerError, HandlerKind};
pub use registry::{
    ActionFn, ActionHandler, ActionSpec, Cardinality, MAIN, OptionFn, OptionForm, OptionHandler,
    OptionSpec, ParamSpec, Registry, VALUE_MARKER,
};
pub use resolver::{OptionToken, Token};
pub use run::{ExitStatus, env_args, run, run_with};
pub use settings::{DEFAULT_LABEL_WIDTH, DEFAULT_WIDTH, Settings};
pub use usage::{render, usage_text};
