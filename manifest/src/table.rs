//! Named handler binding.
//!
//! A manifest refers to handlers by name. The embedding program binds those
//! names to closures in a [`HandlerTable`] before building the registry; a
//! name that was never bound turns into an unbound handler that fails with a
//! configuration error only when dispatch reaches it.

use std::collections::HashMap;
use std::fmt;

use command_dispatch_core::{ActionHandler, HandlerError, OptionHandler};

/// Handlers for a manifest, keyed by the names the manifest uses.
///
/// Option and action handlers live in separate namespaces, so an option and
/// an action may share a handler name.
///
/// # Examples
///
/// ```
/// use command_dispatch_core::{ActionHandler, OptionHandler};
/// use command_dispatch_manifest::HandlerTable;
///
/// let mut table: HandlerTable<Vec<String>> = HandlerTable::new();
/// table
///     .bind_flag("set_quiet", |log| {
///         log.push("quiet".into());
///         Ok(())
///     })
///     .bind_action("create", |log, tokens| {
///         log.extend(tokens.iter().cloned());
///         Ok(())
///     });
///
/// assert!(matches!(table.option("set_quiet"), OptionHandler::Call(_)));
/// assert!(matches!(table.action("remove"), ActionHandler::Unbound(name) if name == "remove"));
/// ```
pub struct HandlerTable<C> {
    options: HashMap<String, OptionHandler<C>>,
    actions: HashMap<String, ActionHandler<C>>,
}

impl<C> Default for HandlerTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for HandlerTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut options: Vec<&str> = self.options.keys().map(String::as_str).collect();
        let mut actions: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        options.sort_unstable();
        actions.sort_unstable();
        f.debug_struct("HandlerTable")
            .field("options", &options)
            .field("actions", &actions)
            .finish()
    }
}

impl<C> HandlerTable<C> {
    pub fn new() -> Self {
        Self {
            options: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    /// Binds an option handler that reports its own token consumption.
    pub fn bind_option(
        &mut self,
        name: &str,
        handler: impl Fn(&mut C, Option<&str>) -> Result<usize, HandlerError> + 'static,
    ) -> &mut Self {
        self.insert_option(name, OptionHandler::call(handler))
    }

    /// Binds a handler for an option that never takes a value.
    pub fn bind_flag(
        &mut self,
        name: &str,
        handler: impl Fn(&mut C) -> Result<(), HandlerError> + 'static,
    ) -> &mut Self {
        self.insert_option(name, OptionHandler::flag(handler))
    }

    /// Binds a handler for an option that uses the value it is offered.
    pub fn bind_value(
        &mut self,
        name: &str,
        handler: impl Fn(&mut C, &str) -> Result<(), HandlerError> + 'static,
    ) -> &mut Self {
        self.insert_option(name, OptionHandler::value(handler))
    }

    pub fn bind_action(
        &mut self,
        name: &str,
        handler: impl Fn(&mut C, &[String]) -> Result<(), HandlerError> + 'static,
    ) -> &mut Self {
        if self
            .actions
            .insert(name.to_string(), ActionHandler::call(handler))
            .is_some()
        {
            tracing::debug!(handler = name, "action handler re-bound");
        }
        self
    }

    /// The option handler bound to `name`, or an unbound placeholder.
    pub fn option(&self, name: &str) -> OptionHandler<C> {
        self.options
            .get(name)
            .cloned()
            .unwrap_or_else(|| OptionHandler::Unbound(name.to_string()))
    }

    /// The action handler bound to `name`, or an unbound placeholder.
    pub fn action(&self, name: &str) -> ActionHandler<C> {
        self.actions
            .get(name)
            .cloned()
            .unwrap_or_else(|| ActionHandler::Unbound(name.to_string()))
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    fn insert_option(&mut self, name: &str, handler: OptionHandler<C>) -> &mut Self {
        if self.options.insert(name.to_string(), handler).is_some() {
            tracing::debug!(handler = name, "option handler re-bound");
        }
        self
    }
}
