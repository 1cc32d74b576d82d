//! Declarations of actions, options and positional parameters.
//!
//! A [`Registry`] is built once during setup and then only read: the
//! dispatcher and the usage renderer both take it by shared reference. Every
//! option and parameter is scoped to exactly one action name, including the
//! implicit root action [`MAIN`].
//!
//! Declarations never fail. Re-declaring the same key replaces the previous
//! entry (last write wins); problems such as a handler that was never bound
//! only surface when dispatch reaches them.
//!
//! # Examples
//!
//! ```
//! use command_dispatch_core::{ActionHandler, Cardinality, MAIN, OptionHandler, Registry, Settings};
//!
//! #[derive(Default)]
//! struct App {
//!     quiet: bool,
//!     created: Vec<String>,
//! }
//!
//! let mut registry = Registry::with_settings(Settings::for_program("widget"));
//! registry.declare_option(
//!     MAIN,
//!     "q",
//!     "quiet",
//!     OptionHandler::flag(|app: &mut App| {
//!         app.quiet = true;
//!         Ok(())
//!     }),
//!     "Suppress progress output",
//! );
//! registry.declare_action(
//!     "create",
//!     Some(ActionHandler::call(|app: &mut App, tokens: &[String]| {
//!         app.created.extend(tokens.iter().cloned());
//!         Ok(())
//!     })),
//!     "Create widgets",
//! );
//! registry.declare_param("create", "name+", "Names of the widgets");
//!
//! assert!(registry.find_long(MAIN, "quiet").is_some());
//! assert!(registry.find_short("create", "h").is_some()); // implicit help
//! assert_eq!(registry.params("create").next().unwrap().cardinality(), Cardinality::OneOrMore);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::HandlerError;
use crate::settings::Settings;

/// Name of the implicit root action.
pub const MAIN: &str = "MAIN";

/// Trailing marker on a short or long option name that makes the option
/// require a value (`"n:"`, `"name:"`).
pub const VALUE_MARKER: char = ':';

pub(crate) const HELP_SHORT: &str = "h";
pub(crate) const HELP_LONG: &str = "help";
pub(crate) const HELP_TEXT: &str = "show this help message and exit";

/// Signature of an option handler.
///
/// The handler receives the value offered to it (the inline `=value`, or the
/// token following the option) and returns how many tokens it consumed,
/// counting the option token itself. A flag returns 1; an option that used
/// the following token returns 2.
pub type OptionFn<C> = dyn Fn(&mut C, Option<&str>) -> Result<usize, HandlerError>;

/// Signature of an action handler. It receives every positional token left
/// after option scanning.
pub type ActionFn<C> = dyn Fn(&mut C, &[String]) -> Result<(), HandlerError>;

/// What happens when an option is matched.
pub enum OptionHandler<C> {
    /// Render the owning action's usage and stop dispatching.
    Help,
    /// Call a bound handler.
    Call(Rc<OptionFn<C>>),
    /// The declaration named a handler that was never bound.
    Unbound(String),
}

impl<C> OptionHandler<C> {
    pub fn call(
        handler: impl Fn(&mut C, Option<&str>) -> Result<usize, HandlerError> + 'static,
    ) -> Self {
        Self::Call(Rc::new(handler))
    }

    /// A handler for an option that never takes a value.
    pub fn flag(handler: impl Fn(&mut C) -> Result<(), HandlerError> + 'static) -> Self {
        Self::call(move |ctx, _| handler(ctx).map(|()| 1))
    }

    /// A handler for an option that uses the value it is offered.
    pub fn value(handler: impl Fn(&mut C, &str) -> Result<(), HandlerError> + 'static) -> Self {
        Self::call(move |ctx, value| match value {
            Some(value) => handler(ctx, value).map(|()| 2),
            None => Ok(1),
        })
    }
}

impl<C> Clone for OptionHandler<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Help => Self::Help,
            Self::Call(handler) => Self::Call(Rc::clone(handler)),
            Self::Unbound(name) => Self::Unbound(name.clone()),
        }
    }
}

impl<C> fmt::Debug for OptionHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str("Help"),
            Self::Call(_) => f.write_str("Call(..)"),
            Self::Unbound(name) => f.debug_tuple("Unbound").field(name).finish(),
        }
    }
}

/// What happens when an action's positional requirements are met.
pub enum ActionHandler<C> {
    Call(Rc<ActionFn<C>>),
    Unbound(String),
}

impl<C> ActionHandler<C> {
    pub fn call(handler: impl Fn(&mut C, &[String]) -> Result<(), HandlerError> + 'static) -> Self {
        Self::Call(Rc::new(handler))
    }
}

impl<C> Clone for ActionHandler<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Call(handler) => Self::Call(Rc::clone(handler)),
            Self::Unbound(name) => Self::Unbound(name.clone()),
        }
    }
}

impl<C> fmt::Debug for ActionHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(_) => f.write_str("Call(..)"),
            Self::Unbound(name) => f.debug_tuple("Unbound").field(name).finish(),
        }
    }
}

/// How many tokens a positional parameter accepts, from its name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// No suffix: exactly one.
    One,
    /// `+`: one or more.
    OneOrMore,
    /// `?`: zero or one.
    Optional,
    /// `*`: zero or more.
    ZeroOrMore,
}

impl Cardinality {
    /// Splits a declared parameter name into its bare name and cardinality.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_dispatch_core::Cardinality;
    ///
    /// assert_eq!(Cardinality::split("files*"), ("files", Cardinality::ZeroOrMore));
    /// assert_eq!(Cardinality::split("name"), ("name", Cardinality::One));
    /// ```
    pub fn split(declared: &str) -> (&str, Self) {
        let cardinality = match declared.chars().last() {
            Some('+') => Self::OneOrMore,
            Some('?') => Self::Optional,
            Some('*') => Self::ZeroOrMore,
            _ => return (declared, Self::One),
        };
        (&declared[..declared.len() - 1], cardinality)
    }

    /// Number of tokens this parameter requires at minimum.
    pub fn required_slots(self) -> usize {
        match self {
            Self::One | Self::OneOrMore => 1,
            Self::Optional | Self::ZeroOrMore => 0,
        }
    }

    pub fn is_optional(self) -> bool {
        self.required_slots() == 0
    }

    pub fn is_variadic(self) -> bool {
        matches!(self, Self::OneOrMore | Self::ZeroOrMore)
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::One => "",
            Self::OneOrMore => "+",
            Self::Optional => "?",
            Self::ZeroOrMore => "*",
        }
    }
}

/// Which form of an option a token used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionForm {
    Short,
    Long,
}

/// A declared option.
#[derive(Debug)]
pub struct OptionSpec<C> {
    action: String,
    short: Option<String>,
    long: Option<String>,
    takes_value: bool,
    handler: OptionHandler<C>,
    help: String,
}

impl<C> OptionSpec<C> {
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Short name without the value marker, if this option still owns one.
    pub fn short(&self) -> Option<&str> {
        self.short.as_deref().map(strip_marker)
    }

    /// Long name without the value marker, if this option still owns one.
    pub fn long(&self) -> Option<&str> {
        self.long.as_deref().map(strip_marker)
    }

    /// Whether the option was declared with the mandatory-argument marker.
    pub fn takes_value(&self) -> bool {
        self.takes_value
    }

    pub fn handler(&self) -> &OptionHandler<C> {
        &self.handler
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Placeholder for the option's value: the long name (or the short name
    /// when there is no long one) upper-cased with dashes turned into
    /// underscores. `None` for options that take no value.
    pub fn arg_name(&self) -> Option<String> {
        if !self.takes_value {
            return None;
        }
        let base = self.long().or(self.short()).unwrap_or("value");
        Some(base.replace('-', "_").to_uppercase())
    }

    /// The token spelling that names this option, preferring the long form.
    pub fn display_name(&self) -> String {
        match (self.long(), self.short()) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => String::new(),
        }
    }

    fn is_reachable(&self) -> bool {
        self.short.is_some() || self.long.is_some()
    }
}

/// A declared action.
#[derive(Debug)]
pub struct ActionSpec<C> {
    name: String,
    handler: Option<ActionHandler<C>>,
    help: String,
}

impl<C> ActionSpec<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> Option<&ActionHandler<C>> {
        self.handler.as_ref()
    }

    pub fn help(&self) -> &str {
        &self.help
    }
}

/// A declared positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    action: String,
    name: String,
    cardinality: Cardinality,
    help: String,
}

impl ParamSpec {
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Name without the cardinality suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn help(&self) -> &str {
        &self.help
    }
}

/// Keys scoped by action name, then by declared name.
type ScopedKeys = HashMap<String, HashMap<String, usize>>;

/// Every declaration the dispatcher and usage renderer read from.
#[derive(Debug)]
pub struct Registry<C> {
    settings: Settings,
    actions: Vec<ActionSpec<C>>,
    action_index: HashMap<String, usize>,
    options: Vec<OptionSpec<C>>,
    short_keys: ScopedKeys,
    long_keys: ScopedKeys,
    params: Vec<ParamSpec>,
    param_keys: ScopedKeys,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Registry<C> {
    /// Creates a registry containing only the root action with default
    /// settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Creates a registry containing only the root action, which has no
    /// handler and its implicit `-h/--help` option.
    pub fn with_settings(settings: Settings) -> Self {
        let mut registry = Self {
            settings,
            actions: Vec::new(),
            action_index: HashMap::new(),
            options: Vec::new(),
            short_keys: HashMap::new(),
            long_keys: HashMap::new(),
            params: Vec::new(),
            param_keys: HashMap::new(),
        };
        registry.declare_action(MAIN, None, "");
        registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Declares an option for `action`. Either name may be empty to leave
    /// that form out; a trailing [`VALUE_MARKER`] on either name makes the
    /// option require a value.
    ///
    /// An existing option under the same `(action, short)` or
    /// `(action, long)` key loses that key to the new declaration.
    pub fn declare_option(
        &mut self,
        action: &str,
        short: &str,
        long: &str,
        handler: OptionHandler<C>,
        help: &str,
    ) {
        let short = non_empty(short.trim_start_matches('-'));
        let long = non_empty(long.trim_start_matches('-'));
        let takes_value = short.iter().chain(long.iter()).any(|name| has_marker(name));

        let index = self.options.len();
        if let Some(short) = short {
            self.claim_key(OptionForm::Short, action, short, index);
        }
        if let Some(long) = long {
            self.claim_key(OptionForm::Long, action, long, index);
        }

        tracing::trace!(action, ?short, ?long, takes_value, "declared option");
        self.options.push(OptionSpec {
            action: action.to_string(),
            short: short.map(str::to_string),
            long: long.map(str::to_string),
            takes_value,
            handler,
            help: help.to_string(),
        });
    }

    /// Declares an option whose handler is referenced by a name that nothing
    /// bound. Dispatch fails with a configuration error if it is matched.
    pub fn declare_unbound_option(
        &mut self,
        action: &str,
        short: &str,
        long: &str,
        handler_name: &str,
        help: &str,
    ) {
        self.declare_option(
            action,
            short,
            long,
            OptionHandler::Unbound(handler_name.to_string()),
            help,
        );
    }

    /// Declares (or replaces) an action and registers its `-h/--help`
    /// option. An action without a handler can still carry options and
    /// help, but dispatching to it fails with a missing-action error.
    pub fn declare_action(&mut self, name: &str, handler: Option<ActionHandler<C>>, help: &str) {
        let spec = ActionSpec {
            name: name.to_string(),
            handler,
            help: help.to_string(),
        };
        match self.action_index.get(name) {
            Some(&index) => self.actions[index] = spec,
            None => {
                self.action_index.insert(name.to_string(), self.actions.len());
                self.actions.push(spec);
            }
        }
        tracing::trace!(action = name, "declared action");

        self.declare_option(name, HELP_SHORT, HELP_LONG, OptionHandler::Help, HELP_TEXT);
    }

    /// Declares an action whose handler is referenced by a name that nothing
    /// bound. Dispatch fails with a configuration error if it is reached.
    pub fn declare_unbound_action(&mut self, name: &str, handler_name: &str, help: &str) {
        self.declare_action(
            name,
            Some(ActionHandler::Unbound(handler_name.to_string())),
            help,
        );
    }

    /// Declares (or replaces) a positional parameter. The cardinality comes
    /// from the name's suffix: none, `+`, `?` or `*`.
    pub fn declare_param(&mut self, action: &str, name: &str, help: &str) {
        let (bare, cardinality) = Cardinality::split(name);
        let spec = ParamSpec {
            action: action.to_string(),
            name: bare.to_string(),
            cardinality,
            help: help.to_string(),
        };

        let keys = self.param_keys.entry(action.to_string()).or_default();
        match keys.get(bare) {
            Some(&index) => self.params[index] = spec,
            None => {
                keys.insert(bare.to_string(), self.params.len());
                self.params.push(spec);
            }
        }
        tracing::trace!(action, param = name, "declared positional parameter");
    }

    pub fn action(&self, name: &str) -> Option<&ActionSpec<C>> {
        self.action_index.get(name).map(|&index| &self.actions[index])
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.action_index.contains_key(name)
    }

    /// All actions in declaration order, the root action first.
    pub fn actions(&self) -> impl Iterator<Item = &ActionSpec<C>> {
        self.actions.iter()
    }

    /// Every action except the root, in declaration order.
    pub fn sub_actions(&self) -> impl Iterator<Item = &ActionSpec<C>> {
        self.actions.iter().filter(|action| action.name != MAIN)
    }

    /// Options of `action` that can still be reached by at least one key, in
    /// declaration order.
    pub fn options<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a OptionSpec<C>> {
        self.options
            .iter()
            .filter(move |option| option.action == action && option.is_reachable())
    }

    /// Positional parameters of `action`, in declaration order.
    pub fn params<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a ParamSpec> {
        self.params.iter().filter(move |param| param.action == action)
    }

    /// Minimum number of positional tokens `action` needs.
    pub fn required_slots(&self, action: &str) -> usize {
        self.params(action)
            .map(|param| param.cardinality.required_slots())
            .sum()
    }

    /// Looks up an option by the name used on the command line (without
    /// dashes). The exact name is tried first, then the name with the value
    /// marker appended.
    pub fn find_option(&self, action: &str, form: OptionForm, name: &str) -> Option<&OptionSpec<C>> {
        let keys = match form {
            OptionForm::Short => self.short_keys.get(action)?,
            OptionForm::Long => self.long_keys.get(action)?,
        };
        let index = match keys.get(name) {
            Some(&index) => index,
            None => *keys.get(&format!("{name}{VALUE_MARKER}"))?,
        };
        Some(&self.options[index])
    }

    pub fn find_short(&self, action: &str, name: &str) -> Option<&OptionSpec<C>> {
        self.find_option(action, OptionForm::Short, name)
    }

    pub fn find_long(&self, action: &str, name: &str) -> Option<&OptionSpec<C>> {
        self.find_option(action, OptionForm::Long, name)
    }

    fn claim_key(&mut self, form: OptionForm, action: &str, key: &str, index: usize) {
        let keys = match form {
            OptionForm::Short => &mut self.short_keys,
            OptionForm::Long => &mut self.long_keys,
        };
        let previous = keys
            .entry(action.to_string())
            .or_default()
            .insert(key.to_string(), index);

        if let Some(previous) = previous {
            tracing::debug!(action, key, "option key re-declared, last declaration wins");
            let displaced = &mut self.options[previous];
            match form {
                OptionForm::Short => displaced.short = None,
                OptionForm::Long => displaced.long = None,
            }
        }
    }
}

fn non_empty(name: &str) -> Option<&str> {
    (!name.is_empty()).then_some(name)
}

fn has_marker(name: &str) -> bool {
    name.ends_with(VALUE_MARKER)
}

fn strip_marker(name: &str) -> &str {
    name.strip_suffix(VALUE_MARKER).unwrap_or(name)
}
