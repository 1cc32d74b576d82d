//! Declarative registration for `command-dispatch-core`.
//!
//! - [`Manifest`]: actions, options, positional parameters and settings,
//!   loaded from YAML or JSON ([`Manifest::load`]) with handlers referenced
//!   by name.
//! - [`HandlerTable`]: binds those names to closures.
//!   [`Manifest::build_registry`] turns the pair into a
//!   [`Registry`](command_dispatch_core::Registry); names nothing bound
//!   surface as configuration errors when dispatch reaches them.
//! - [`lint_manifest`]: structural checks ([`LintError`]) such as options
//!   for undeclared actions or a variadic parameter that is not last.

mod error;
mod lint;
mod manifest;
mod table;

pub use error::{ManifestError, Result};
pub use lint::{LintError, lint_manifest};
pub use manifest::{ActionDecl, Manifest, ManifestFormat, OptionDecl, ParamDecl};
pub use table::HandlerTable;
