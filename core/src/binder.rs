//! Positional binding: count check, then the action handler.

use tracing::debug;

use crate::error::{ConfigurationError, DispatchError, HandlerKind};
use crate::registry::{ActionHandler, Registry};

/// Checks that `tokens` satisfy the parameters declared for `action` and
/// hands all of them to the action's handler.
///
/// Matching is by count only. Plain and `+` parameters each need one token,
/// `?` and `*` parameters need none; the handler gets the whole list and
/// splits it itself.
pub(crate) fn bind<C>(
    registry: &Registry<C>,
    ctx: &mut C,
    action: &str,
    tokens: &[String],
) -> Result<(), DispatchError> {
    let expected = registry.required_slots(action);
    if tokens.len() < expected {
        return Err(DispatchError::MissingArguments {
            action: action.to_string(),
            found: tokens.len(),
            expected,
        });
    }

    let handler = match registry.action(action).and_then(|spec| spec.handler()) {
        Some(ActionHandler::Call(handler)) => handler,
        Some(ActionHandler::Unbound(name)) => {
            return Err(ConfigurationError::new(HandlerKind::Action, action, action, name).into());
        }
        None => {
            return Err(DispatchError::MissingAction {
                action: action.to_string(),
                name: None,
            });
        }
    };

    debug!(action, tokens = tokens.len(), "invoking action handler");
    handler(ctx, tokens)?;
    Ok(())
}
