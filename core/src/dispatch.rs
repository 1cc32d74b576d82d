//! The dispatch loop.
//!
//! Dispatch walks the token list with an explicit cursor. While in
//! [`ScanState::ScanningOptions`], option tokens go to the resolver and the
//! cursor advances by what the handler consumed. The first positional token
//! (or a bare `--`) switches to [`ScanState::PositionalMode`] and the rest of
//! the list is handed on.
//!
//! When the root action has no handler, the first positional token names a
//! sub-action and scanning starts over for that action with the tokens after
//! it. Routing happens at most once: options and parameters nest one level
//! below the root.

use tracing::{debug, trace};

use crate::binder;
use crate::error::DispatchError;
use crate::registry::{MAIN, Registry};
use crate::resolver::{self, Step, Token};

/// Scanner state for one action's slice of the token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    ScanningOptions,
    PositionalMode,
}

/// How a successful dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The named action's handler ran.
    Completed { action: String },
    /// Help was requested for the named action; nothing else ran after it.
    Help { action: String },
}

/// Result of scanning one action's options.
enum Scan<'t> {
    Help,
    Positional(&'t [String]),
}

/// Drives option scanning, sub-action routing and positional binding over a
/// read-only [`Registry`].
pub struct Dispatcher<'r, C> {
    registry: &'r Registry<C>,
}

impl<'r, C> Dispatcher<'r, C> {
    pub fn new(registry: &'r Registry<C>) -> Self {
        Self { registry }
    }

    /// Dispatches `args` (program name excluded) starting at the root action.
    pub fn dispatch(&self, ctx: &mut C, args: &[String]) -> Result<Outcome, DispatchError> {
        let mut action: &str = MAIN;
        let mut tokens = args;

        loop {
            let positional = match self.scan(ctx, action, tokens)? {
                Scan::Help => {
                    debug!(action, "help requested");
                    return Ok(Outcome::Help {
                        action: action.to_string(),
                    });
                }
                Scan::Positional(positional) => positional,
            };

            if action == MAIN && !self.root_has_handler() {
                let (name, rest) = self.route(positional)?;
                debug!(action = name, "routing to sub-action");
                action = name;
                tokens = rest;
                continue;
            }

            binder::bind(self.registry, ctx, action, positional)?;
            return Ok(Outcome::Completed {
                action: action.to_string(),
            });
        }
    }

    /// Runs option handlers for `action` until the first positional token
    /// and returns the tokens from there on.
    fn scan<'t>(
        &self,
        ctx: &mut C,
        action: &str,
        tokens: &'t [String],
    ) -> Result<Scan<'t>, DispatchError> {
        let mut state = ScanState::ScanningOptions;
        let mut cursor = 0;

        while state == ScanState::ScanningOptions && cursor < tokens.len() {
            let raw = tokens[cursor].as_str();
            match Token::classify(raw) {
                Token::EndOfOptions => {
                    cursor += 1;
                    state = ScanState::PositionalMode;
                }
                Token::Positional => state = ScanState::PositionalMode,
                Token::Option(option) => {
                    let rest = &tokens[cursor + 1..];
                    match resolver::resolve(self.registry, ctx, action, raw, option, rest)? {
                        Step::Help => return Ok(Scan::Help),
                        Step::Advance(advance) => cursor += advance,
                    }
                }
            }
            trace!(action, cursor, ?state, "scan step");
        }

        Ok(Scan::Positional(&tokens[cursor..]))
    }

    /// Splits the first positional token off as a sub-action name.
    fn route<'t>(&self, positional: &'t [String]) -> Result<(&'t str, &'t [String]), DispatchError> {
        let Some((name, rest)) = positional.split_first() else {
            return Err(DispatchError::MissingAction {
                action: MAIN.to_string(),
                name: None,
            });
        };

        if name.is_empty() || name == MAIN || !self.registry.has_action(name) {
            return Err(DispatchError::MissingAction {
                action: MAIN.to_string(),
                name: Some(name.clone()),
            });
        }

        Ok((name.as_str(), rest))
    }

    fn root_has_handler(&self) -> bool {
        self.registry
            .action(MAIN)
            .is_some_and(|main| main.handler().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ActionHandler, OptionHandler};
    use crate::settings::Settings;

    #[derive(Debug, Default)]
    struct Trace {
        quiet: usize,
        names: Vec<String>,
        calls: Vec<(&'static str, Vec<String>)>,
    }

    fn record(tag: &'static str) -> Option<ActionHandler<Trace>> {
        Some(ActionHandler::call(move |trace: &mut Trace, tokens: &[String]| {
            trace.calls.push((tag, tokens.to_vec()));
            Ok(())
        }))
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn sub_action_registry() -> Registry<Trace> {
        let mut registry = Registry::with_settings(Settings::for_program("widget"));
        registry.declare_option(
            MAIN,
            "q",
            "quiet",
            OptionHandler::flag(|trace: &mut Trace| {
                trace.quiet += 1;
                Ok(())
            }),
            "",
        );
        registry.declare_action("create", record("create"), "");
        registry.declare_param("create", "name", "");
        registry.declare_option(
            "create",
            "n:",
            "name:",
            OptionHandler::value(|trace: &mut Trace, value| {
                trace.names.push(value.to_string());
                Ok(())
            }),
            "",
        );
        registry.declare_action("remove", record("remove"), "");
        registry.declare_param("remove", "names+", "");
        registry
    }

    fn main_handler_registry() -> Registry<Trace> {
        let mut registry = Registry::with_settings(Settings::for_program("widget"));
        registry.declare_action(MAIN, record("main"), "");
        registry.declare_option(
            MAIN,
            "q",
            "quiet",
            OptionHandler::call(|trace: &mut Trace, _| {
                trace.quiet += 1;
                Ok(1)
            }),
            "",
        );
        registry.declare_param(MAIN, "name", "");
        registry
    }

    #[test]
    fn test_flag_then_positional_binds_to_main() {
        let registry = main_handler_registry();
        let mut trace = Trace::default();

        let outcome = Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["-q", "widget"]))
            .unwrap();

        assert_eq!(outcome, Outcome::Completed { action: MAIN.into() });
        assert_eq!(trace.quiet, 1);
        assert_eq!(trace.calls, vec![("main", strings(&["widget"]))]);
    }

    #[test]
    fn test_routes_to_sub_action() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        let outcome = Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["create", "foo"]))
            .unwrap();

        assert_eq!(outcome, Outcome::Completed { action: "create".into() });
        assert_eq!(trace.calls, vec![("create", strings(&["foo"]))]);
    }

    #[test]
    fn test_root_options_before_sub_action() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["--quiet", "remove", "a", "b"]))
            .unwrap();

        assert_eq!(trace.quiet, 1);
        assert_eq!(trace.calls, vec![("remove", strings(&["a", "b"]))]);
    }

    #[test]
    fn test_sub_action_option_with_value() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["create", "-n", "alt", "foo"]))
            .unwrap();

        assert_eq!(trace.names, vec!["alt"]);
        assert_eq!(trace.calls, vec![("create", strings(&["foo"]))]);
    }

    #[test]
    fn test_inline_value_consumes_single_token() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["create", "--name=value", "foo"]))
            .unwrap();

        assert_eq!(trace.names, vec!["value"]);
        assert_eq!(trace.calls, vec![("create", strings(&["foo"]))]);
    }

    #[test]
    fn test_sub_action_options_are_not_root_options() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        let err = Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["create", "--quiet", "foo"]))
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::UnrecognizedOption { ref action, ref token }
                if action == "create" && token == "--quiet"
        ));
        assert!(trace.calls.is_empty());
    }

    #[test]
    fn test_unknown_sub_action() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        let err = Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["bogus", "foo"]))
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::MissingAction { name: Some(ref name), .. } if name == "bogus"
        ));
    }

    #[test]
    fn test_empty_and_reserved_sub_action_names() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();
        let dispatcher = Dispatcher::new(&registry);

        for name in ["", MAIN] {
            let err = dispatcher
                .dispatch(&mut trace, &strings(&[name, "foo"]))
                .unwrap_err();
            assert!(matches!(err, DispatchError::MissingAction { .. }));
        }
    }

    #[test]
    fn test_no_tokens_without_root_handler() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        let err = Dispatcher::new(&registry)
            .dispatch(&mut trace, &[])
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingAction { name: None, .. }));
    }

    #[test]
    fn test_help_stops_dispatch() {
        let registry = sub_action_registry();
        let mut trace = Trace::default();

        let outcome = Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["create", "--help", "-q"]))
            .unwrap();

        assert_eq!(outcome, Outcome::Help { action: "create".into() });
        assert!(trace.calls.is_empty());
    }

    #[test]
    fn test_end_of_options_marker() {
        let registry = main_handler_registry();
        let mut trace = Trace::default();

        Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["--", "-q", "--help"]))
            .unwrap();

        assert_eq!(trace.quiet, 0);
        assert_eq!(trace.calls, vec![("main", strings(&["-q", "--help"]))]);
    }

    #[test]
    fn test_options_after_first_positional_are_positional() {
        let registry = main_handler_registry();
        let mut trace = Trace::default();

        Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["widget", "-q"]))
            .unwrap();

        assert_eq!(trace.quiet, 0);
        assert_eq!(trace.calls, vec![("main", strings(&["widget", "-q"]))]);
    }

    #[test]
    fn test_missing_arguments_for_root() {
        let registry = main_handler_registry();
        let mut trace = Trace::default();

        let err = Dispatcher::new(&registry)
            .dispatch(&mut trace, &strings(&["-q"]))
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingArguments { found: 0, expected: 1, .. }
        ));
    }
}
