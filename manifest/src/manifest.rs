//! Declarative registration from a YAML or JSON file.
//!
//! A manifest lists actions, options and positional parameters together with
//! the names of their handlers, plus an optional `settings` block. Options
//! and parameters without an `action` belong to the root action.
//!
//! # Example YAML
//!
//! ```yaml
//! settings:
//!   program: widget
//!   help_status: 0
//! actions:
//!   - name: create
//!     handler: create_widget
//!     help: Create a widget
//!   - name: remove
//!     handler: remove_widgets
//! options:
//!   - short: q
//!     long: quiet
//!     handler: set_quiet
//!     help: Suppress output
//!   - action: create
//!     short: "n:"
//!     long: "name:"
//!     handler: set_name
//! params:
//!   - action: create
//!     name: name
//!     help: Widget name
//!   - action: remove
//!     name: names+
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_dispatch_core::{ActionHandler, MAIN, OptionHandler, Registry, Settings, VALUE_MARKER};
use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};
use crate::table::HandlerTable;

/// On-disk encoding of a manifest, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ManifestError::UnsupportedFormat) for
    /// anything other than `.yaml`, `.yml` or `.json`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ManifestError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// A declared action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDecl {
    pub name: String,
    /// Handler name; an action without one only carries options and help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

/// A declared option. Either name may be empty; a trailing `:` marks an
/// option that requires a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDecl {
    #[serde(default = "main_action")]
    pub action: String,
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub long: String,
    pub handler: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

/// A declared positional parameter. The name may end in `+`, `?` or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default = "main_action")]
    pub action: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

impl OptionDecl {
    /// Whether either name carries the value marker.
    pub fn takes_value(&self) -> bool {
        self.short.ends_with(VALUE_MARKER) || self.long.ends_with(VALUE_MARKER)
    }
}

fn main_action() -> String {
    MAIN.to_string()
}

/// Everything needed to build a [`Registry`], minus the handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub settings: Settings,
    pub actions: Vec<ActionDecl>,
    pub options: Vec<OptionDecl>,
    pub params: Vec<ParamDecl>,
}

impl Manifest {
    /// Loads a manifest, picking YAML or JSON by the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ManifestError::UnsupportedFormat) for
    /// unknown extensions, [`Io`](ManifestError::Io) if the file cannot be
    /// read, or a parse error from the matching format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ManifestFormat::from_path(path)?;
        let reader = BufReader::new(std::fs::File::open(path)?);
        let manifest: Self = match format {
            ManifestFormat::Yaml => serde_yaml::from_reader(reader)?,
            ManifestFormat::Json => serde_json::from_reader(reader)?,
        };
        tracing::debug!(
            path = %path.display(),
            actions = manifest.actions.len(),
            options = manifest.options.len(),
            params = manifest.params.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Saves the manifest in the format implied by the file extension.
    ///
    /// # Errors
    ///
    /// Same cases as [`load`](Self::load), for writing.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ManifestFormat::from_path(path)?;
        let writer = BufWriter::new(std::fs::File::create(path)?);
        match format {
            ManifestFormat::Yaml => serde_yaml::to_writer(writer, self)?,
            ManifestFormat::Json => serde_json::to_writer_pretty(writer, self)?,
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether `name` is the root action or one of the declared actions.
    pub fn declares_action(&self, name: &str) -> bool {
        name == MAIN || self.actions.iter().any(|action| action.name == name)
    }

    /// Builds a registry, resolving handler names through `table`.
    ///
    /// Actions are declared first, then options, then parameters, each in
    /// file order. Names missing from `table` are declared unbound; they
    /// only fail when dispatch reaches them.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_dispatch_core::{BufferConsole, ExitStatus, run};
    /// use command_dispatch_manifest::{HandlerTable, Manifest};
    ///
    /// let manifest = Manifest::from_yaml_str(
    ///     "settings: { program: widget }\n\
    ///      actions: [{ name: create, handler: create }]\n\
    ///      params: [{ action: create, name: name }]\n",
    /// )
    /// .unwrap();
    ///
    /// let mut table: HandlerTable<Vec<String>> = HandlerTable::new();
    /// table.bind_action("create", |created, names| {
    ///     created.extend_from_slice(names);
    ///     Ok(())
    /// });
    ///
    /// let registry = manifest.build_registry(&table);
    /// let mut created = Vec::new();
    /// let args = vec!["create".to_string(), "foo".to_string()];
    /// let status = run(&registry, &mut created, &args, &mut BufferConsole::new());
    /// assert_eq!(status, ExitStatus::SUCCESS);
    /// assert_eq!(created, ["foo"]);
    /// ```
    pub fn build_registry<C>(&self, table: &HandlerTable<C>) -> Registry<C> {
        self.build_registry_with(
            |action| action.handler.as_deref().map(|name| table.action(name)),
            |option| table.option(&option.handler),
        )
    }

    /// Builds a registry with one handler made per declaration, instead of
    /// looking handlers up by name. Two declarations that share a handler
    /// name still get handlers of their own.
    pub fn build_registry_with<C>(
        &self,
        mut action_handler: impl FnMut(&ActionDecl) -> Option<ActionHandler<C>>,
        mut option_handler: impl FnMut(&OptionDecl) -> OptionHandler<C>,
    ) -> Registry<C> {
        let mut registry = Registry::with_settings(self.settings.clone());

        for action in &self.actions {
            registry.declare_action(&action.name, action_handler(action), &action.help);
        }
        for option in &self.options {
            registry.declare_option(
                &option.action,
                &option.short,
                &option.long,
                option_handler(option),
                &option.help,
            );
        }
        for param in &self.params {
            registry.declare_param(&param.action, &param.name, &param.help);
        }

        tracing::debug!(program = %self.settings.program, "built registry from manifest");
        registry
    }
}
