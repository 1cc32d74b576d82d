//! Option token classification and handler invocation.

use tracing::{debug, trace};

use crate::error::{ConfigurationError, DispatchError, HandlerKind};
use crate::registry::{OptionForm, OptionHandler, Registry};

/// How a single command-line token is interpreted while scanning options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `--`: everything after it is positional.
    EndOfOptions,
    /// Anything that does not start with a dash, or a bare `-`.
    Positional,
    /// `--name`, `--name=value` or `-x`.
    Option(OptionToken<'a>),
}

/// An option token with its dashes removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionToken<'a> {
    pub form: OptionForm,
    pub name: &'a str,
    /// Value given inline as `--name=value`. Only long options split on `=`.
    pub inline: Option<&'a str>,
}

impl<'a> Token<'a> {
    /// # Examples
    ///
    /// ```
    /// use command_dispatch_core::{OptionForm, Token};
    ///
    /// let Token::Option(option) = Token::classify("--name=widget") else { panic!() };
    /// assert_eq!(option.form, OptionForm::Long);
    /// assert_eq!((option.name, option.inline), ("name", Some("widget")));
    ///
    /// assert_eq!(Token::classify("widget"), Token::Positional);
    /// assert_eq!(Token::classify("-"), Token::Positional);
    /// assert_eq!(Token::classify("--"), Token::EndOfOptions);
    /// ```
    pub fn classify(token: &'a str) -> Self {
        if token == "--" {
            return Self::EndOfOptions;
        }
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            return Self::Option(OptionToken {
                form: OptionForm::Long,
                name,
                inline,
            });
        }
        match token.strip_prefix('-') {
            Some(short) if !short.is_empty() => Self::Option(OptionToken {
                form: OptionForm::Short,
                name: short,
                inline: None,
            }),
            _ => Self::Positional,
        }
    }
}

/// What the dispatcher should do after an option was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Help was requested for the current action.
    Help,
    /// Move the cursor forward by this many tokens.
    Advance(usize),
}

/// Resolves `option` against the options of `action` and runs its handler.
///
/// `raw` is the token as written and `rest` the tokens after it. The returned
/// advance always covers the option token itself and never runs past the end
/// of `rest`.
pub(crate) fn resolve<C>(
    registry: &Registry<C>,
    ctx: &mut C,
    action: &str,
    raw: &str,
    option: OptionToken<'_>,
    rest: &[String],
) -> Result<Step, DispatchError> {
    let Some(spec) = registry.find_option(action, option.form, option.name) else {
        debug!(action, token = raw, "no matching option");
        return Err(DispatchError::UnrecognizedOption {
            action: action.to_string(),
            token: raw.to_string(),
        });
    };

    let handler = match spec.handler() {
        OptionHandler::Help => return Ok(Step::Help),
        OptionHandler::Unbound(name) => {
            return Err(ConfigurationError::new(
                HandlerKind::Option,
                action,
                spec.display_name(),
                name,
            )
            .into());
        }
        OptionHandler::Call(handler) => handler,
    };

    if let Some(value) = option.inline {
        trace!(action, option = option.name, value, "option with inline value");
        handler(ctx, Some(value))?;
        return Ok(Step::Advance(1));
    }

    let offered = rest.first().map(String::as_str);
    if spec.takes_value() && offered.is_none() {
        return Err(DispatchError::MissingOptionValue {
            action: action.to_string(),
            option: raw.to_string(),
        });
    }

    let consumed = handler(ctx, offered)?;
    let advance = consumed.clamp(1, rest.len() + 1);
    trace!(action, option = option.name, consumed, advance, "option handled");
    Ok(Step::Advance(advance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::registry::MAIN;
    use crate::settings::Settings;

    #[derive(Debug, Default)]
    struct Seen {
        values: Vec<Option<String>>,
    }

    fn registry(consumed: usize) -> Registry<Seen> {
        let mut registry = Registry::with_settings(Settings::for_program("t"));
        registry.declare_option(
            MAIN,
            "n:",
            "name:",
            OptionHandler::call(move |seen: &mut Seen, value| {
                seen.values.push(value.map(str::to_string));
                Ok(consumed)
            }),
            "",
        );
        registry
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn resolve_token(
        registry: &Registry<Seen>,
        seen: &mut Seen,
        raw: &str,
        rest: &[String],
    ) -> Result<Step, DispatchError> {
        let Token::Option(option) = Token::classify(raw) else {
            panic!("{raw} is not an option token");
        };
        resolve(registry, seen, MAIN, raw, option, rest)
    }

    #[test]
    fn test_short_token_is_not_split_on_equals() {
        let Token::Option(option) = Token::classify("-n=x") else {
            panic!()
        };
        assert_eq!(option.form, OptionForm::Short);
        assert_eq!(option.name, "n=x");
        assert_eq!(option.inline, None);
    }

    #[test]
    fn test_inline_value_consumes_one_token() {
        let registry = registry(2);
        let mut seen = Seen::default();
        let rest = strings(&["next"]);

        let step = resolve_token(&registry, &mut seen, "--name=value", &rest).unwrap();
        assert_eq!(step, Step::Advance(1));
        assert_eq!(seen.values, vec![Some("value".to_string())]);
    }

    #[test]
    fn test_empty_inline_value_is_a_value() {
        let registry = registry(2);
        let mut seen = Seen::default();

        let step = resolve_token(&registry, &mut seen, "--name=", &[]).unwrap();
        assert_eq!(step, Step::Advance(1));
        assert_eq!(seen.values, vec![Some(String::new())]);
    }

    #[test]
    fn test_next_token_is_offered() {
        let registry = registry(2);
        let mut seen = Seen::default();
        let rest = strings(&["widget", "more"]);

        let step = resolve_token(&registry, &mut seen, "-n", &rest).unwrap();
        assert_eq!(step, Step::Advance(2));
        assert_eq!(seen.values, vec![Some("widget".to_string())]);
    }

    #[test]
    fn test_zero_consumption_still_advances() {
        let registry = registry(0);
        let mut seen = Seen::default();
        let rest = strings(&["widget"]);

        let step = resolve_token(&registry, &mut seen, "--name", &rest).unwrap();
        assert_eq!(step, Step::Advance(1));
    }

    #[test]
    fn test_overreported_consumption_is_clamped() {
        let registry = registry(9);
        let mut seen = Seen::default();
        let rest = strings(&["widget"]);

        let step = resolve_token(&registry, &mut seen, "--name", &rest).unwrap();
        assert_eq!(step, Step::Advance(2));
    }

    #[test]
    fn test_missing_value_for_marked_option() {
        let registry = registry(2);
        let mut seen = Seen::default();

        let err = resolve_token(&registry, &mut seen, "--name", &[]).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingOptionValue { ref option, .. } if option == "--name"
        ));
        assert!(seen.values.is_empty());
    }

    #[test]
    fn test_unknown_option_keeps_raw_token() {
        let registry = registry(1);
        let mut seen = Seen::default();

        let err = resolve_token(&registry, &mut seen, "--bogus", &[]).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnrecognizedOption { ref token, .. } if token == "--bogus"
        ));
    }

    #[test]
    fn test_help_option_short_circuits() {
        let registry = registry(1);
        let mut seen = Seen::default();

        assert_eq!(
            resolve_token(&registry, &mut seen, "-h", &[]).unwrap(),
            Step::Help
        );
    }

    #[test]
    fn test_unbound_handler_is_configuration_error() {
        let mut registry = registry(1);
        registry.declare_unbound_option(MAIN, "x", "extra", "missing_fn", "");
        let mut seen = Seen::default();

        let err = resolve_token(&registry, &mut seen, "--extra", &[]).unwrap_err();
        let DispatchError::Configuration(config) = err else {
            panic!("expected configuration error, got {err:?}");
        };
        assert_eq!(config.handler, "missing_fn");
        assert_eq!(config.declared, "--extra");
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut registry = registry(1);
        registry.declare_option(
            MAIN,
            "f",
            "fail",
            OptionHandler::flag(|_: &mut Seen| Err(HandlerError::new("nope").with_status(5))),
            "",
        );
        let mut seen = Seen::default();

        let err = resolve_token(&registry, &mut seen, "-f", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::Handler(HandlerError { status: 5, .. })));
    }
}
