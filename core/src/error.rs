//! Error types for dispatch.
//!
//! [`DispatchError`] is the single error type propagated from the option
//! resolver, the positional binder and the dispatcher up to
//! [`run`](crate::run()). Usage errors carry the name of the action whose usage
//! should accompany the diagnostic; configuration and handler errors do not.

use std::backtrace::Backtrace;
use std::fmt;

use thiserror::Error;

use crate::registry::MAIN;

/// Errors that stop a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An option token has no declaration for the current action, even after
    /// retrying with the mandatory-argument marker.
    #[error("unrecognized option '{token}'")]
    UnrecognizedOption {
        /// Action whose options were searched.
        action: String,
        /// The token exactly as it appeared on the command line.
        token: String,
    },

    /// No handler-bearing action could be resolved.
    #[error("{}", missing_action_message(.action, .name))]
    MissingAction {
        /// Action whose usage explains what was expected.
        action: String,
        /// The token that failed to name an action. `None` when there was no
        /// token, or when `action` itself was reached but has no handler.
        name: Option<String>,
    },

    /// Fewer positional tokens than the action's declared parameters require.
    #[error("'{action}' expects at least {expected} positional argument(s), found {found}")]
    MissingArguments {
        action: String,
        found: usize,
        expected: usize,
    },

    /// An option declared with the mandatory-argument marker had no value.
    #[error("option '{option}' requires a value")]
    MissingOptionValue { action: String, option: String },

    /// A declaration points at a handler that was never bound.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A handler reported failure.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

fn missing_action_message(action: &str, name: &Option<String>) -> String {
    match name {
        Some(name) if name.is_empty() => "empty action name".to_string(),
        Some(name) => format!("unknown action '{name}'"),
        None if action == MAIN => "no action given".to_string(),
        None => format!("action '{action}' has no handler"),
    }
}

impl DispatchError {
    /// Returns the action whose usage accompanies this error, or `None` for
    /// errors that are not caused by user input.
    pub fn usage_action(&self) -> Option<&str> {
        match self {
            Self::UnrecognizedOption { action, .. }
            | Self::MissingAction { action, .. }
            | Self::MissingArguments { action, .. }
            | Self::MissingOptionValue { action, .. } => Some(action),
            Self::Configuration(_) | Self::Handler(_) => None,
        }
    }
}

/// What kind of declaration a [`ConfigurationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Option,
    Action,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Option => f.write_str("option"),
            Self::Action => f.write_str("action"),
        }
    }
}

/// Call stack captured where a [`ConfigurationError`] was raised.
pub struct CapturedTrace(Backtrace);

impl fmt::Debug for CapturedTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for CapturedTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A declared action or option refers to a handler name that nothing bound.
///
/// This is a defect in the embedding program rather than bad user input, so
/// it is reported with a call-stack trace instead of a usage block.
#[derive(Debug, Error)]
#[error("{kind} '{declared}' of action '{action}' refers to unbound handler '{handler}'")]
pub struct ConfigurationError {
    pub kind: HandlerKind,
    pub action: String,
    /// Declared name of the option or action.
    pub declared: String,
    /// The handler name that failed to resolve.
    pub handler: String,
    trace: CapturedTrace,
}

impl ConfigurationError {
    pub fn new(
        kind: HandlerKind,
        action: impl Into<String>,
        declared: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            action: action.into(),
            declared: declared.into(),
            handler: handler.into(),
            trace: CapturedTrace(Backtrace::force_capture()),
        }
    }

    /// The call stack at the point the error was raised.
    pub fn trace(&self) -> &CapturedTrace {
        &self.trace
    }
}

/// Failure reported by an option or action handler.
///
/// The exit status is chosen by the handler; the dispatcher only forwards it.
/// A failure never exits 0, so a status of 0 is raised to 1.
///
/// # Examples
///
/// ```
/// use command_dispatch_core::HandlerError;
///
/// let err = HandlerError::new("widget already exists").with_status(3);
/// assert_eq!(err.status, 3);
/// assert_eq!(err.to_string(), "widget already exists");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub status: u8,
    pub message: String,
}

impl HandlerError {
    /// Creates a handler error with exit status 1.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: 1,
            message: message.into(),
        }
    }

    /// A failure with no message of its own, only an exit status.
    pub fn status(status: u8) -> Self {
        Self {
            status: status.max(1),
            message: String::new(),
        }
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.status = status.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_option_message_contains_token() {
        let err = DispatchError::UnrecognizedOption {
            action: "MAIN".into(),
            token: "--bogus".into(),
        };
        assert!(err.to_string().contains("--bogus"));
        assert_eq!(err.usage_action(), Some("MAIN"));
    }

    #[test]
    fn test_missing_action_messages() {
        let unknown = DispatchError::MissingAction {
            action: "MAIN".into(),
            name: Some("bogus".into()),
        };
        assert_eq!(unknown.to_string(), "unknown action 'bogus'");

        let empty = DispatchError::MissingAction {
            action: "MAIN".into(),
            name: Some(String::new()),
        };
        assert_eq!(empty.to_string(), "empty action name");

        let absent = DispatchError::MissingAction {
            action: "MAIN".into(),
            name: None,
        };
        assert_eq!(absent.to_string(), "no action given");

        let unhandled = DispatchError::MissingAction {
            action: "list".into(),
            name: None,
        };
        assert_eq!(unhandled.to_string(), "action 'list' has no handler");
    }

    #[test]
    fn test_handler_error_status_is_never_zero() {
        assert_eq!(HandlerError::status(0).status, 1);
        assert_eq!(HandlerError::new("boom").with_status(0).status, 1);
        assert_eq!(HandlerError::status(5).status, 5);
    }

    #[test]
    fn test_configuration_error_has_no_usage_action() {
        let err: DispatchError =
            ConfigurationError::new(HandlerKind::Option, "MAIN", "quiet", "set_quiet").into();
        assert_eq!(err.usage_action(), None);
        assert_eq!(
            err.to_string(),
            "option 'quiet' of action 'MAIN' refers to unbound handler 'set_quiet'"
        );
    }
}
