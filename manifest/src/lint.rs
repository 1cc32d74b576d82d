//! Structural checks for manifests.
//!
//! Building a registry never fails, so mistakes in a manifest otherwise only
//! show up as odd dispatch behavior. [`lint_manifest`] reports them up front.
//! Re-declarations are legal (the last one wins) and are reported as
//! warnings; everything else is an error.
//!
//! # Examples
//!
//! ```
//! use command_dispatch_manifest::{LintError, Manifest, lint_manifest};
//!
//! let manifest = Manifest::from_yaml_str(
//!     "params:\n  - { name: files* }\n  - { name: target }\n",
//! )
//! .unwrap();
//!
//! let lints = lint_manifest(&manifest);
//! assert!(matches!(&lints[..], [LintError::VariadicNotLast { param, .. }] if param == "files*"));
//! assert!(!lints[0].is_warning());
//! ```

use std::collections::HashSet;

use command_dispatch_core::Cardinality;
use thiserror::Error;

use crate::manifest::Manifest;

/// Problems found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
    /// An action with an empty name.
    #[error("action name cannot be empty")]
    EmptyActionName,
    /// An action declared more than once.
    #[error("duplicate action: {0}")]
    DuplicateAction(String),
    /// An option with neither a short nor a long name.
    #[error("option of action '{action}' must define a short or long name")]
    MissingOptionName { action: String },
    /// A short name longer than one character can never match a `-x` token.
    #[error("short option '{short}' of action '{action}' must be a single character")]
    InvalidShortName { action: String, short: String },
    /// Two options claim the same key.
    #[error("option key '{key}' of action '{action}' is declared more than once")]
    DuplicateOption { action: String, key: String },
    /// An option declared for an action the manifest does not declare.
    #[error("option '{option}' refers to undeclared action '{action}'")]
    OptionForUndeclaredAction { action: String, option: String },
    /// A parameter with an empty name (or only a cardinality suffix).
    #[error("positional parameter of action '{action}' has an empty name")]
    EmptyParamName { action: String },
    /// A parameter name carrying more than one cardinality suffix.
    #[error("positional parameter '{param}' of action '{action}' has an invalid cardinality suffix")]
    InvalidCardinality { action: String, param: String },
    /// Two parameters of one action share a name.
    #[error("positional parameter '{param}' of action '{action}' is declared more than once")]
    DuplicateParam { action: String, param: String },
    /// A parameter declared for an action the manifest does not declare.
    #[error("positional parameter '{param}' refers to undeclared action '{action}'")]
    ParamForUndeclaredAction { action: String, param: String },
    /// A `+` or `*` parameter followed by more parameters.
    #[error("variadic parameter '{param}' of action '{action}' must be the last one")]
    VariadicNotLast { action: String, param: String },
}

impl LintError {
    /// Warnings describe legal manifests that probably do not do what was
    /// meant.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAction(_) | Self::DuplicateOption { .. } | Self::DuplicateParam { .. }
        )
    }
}

/// Checks a manifest and returns every problem found, in file order:
/// actions, then options, then parameters.
pub fn lint_manifest(manifest: &Manifest) -> Vec<LintError> {
    let mut errors = lint_actions(manifest);
    errors.extend(lint_options(manifest));
    errors.extend(lint_params(manifest));
    tracing::debug!(count = errors.len(), "linted manifest");
    errors
}

fn lint_actions(manifest: &Manifest) -> Vec<LintError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for action in &manifest.actions {
        let name = action.name.as_str();
        if name.trim().is_empty() {
            errors.push(LintError::EmptyActionName);
        } else if !seen.insert(name) {
            errors.push(LintError::DuplicateAction(name.to_string()));
        }
    }

    errors
}

fn lint_options(manifest: &Manifest) -> Vec<LintError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<(&str, String)> = HashSet::new();

    for option in &manifest.options {
        let action = option.action.as_str();
        let short = option.short.trim_start_matches('-');
        let long = option.long.trim_start_matches('-');

        if short.is_empty() && long.is_empty() {
            errors.push(LintError::MissingOptionName {
                action: action.to_string(),
            });
            continue;
        }

        if !manifest.declares_action(action) {
            errors.push(LintError::OptionForUndeclaredAction {
                action: action.to_string(),
                option: display_option(short, long),
            });
        }

        if short.trim_end_matches(':').chars().count() > 1 {
            errors.push(LintError::InvalidShortName {
                action: action.to_string(),
                short: short.to_string(),
            });
        }

        for key in [short_key(short), long_key(long)].into_iter().flatten() {
            if !seen.insert((action, key.clone())) {
                errors.push(LintError::DuplicateOption {
                    action: action.to_string(),
                    key,
                });
            }
        }
    }

    errors
}

fn lint_params(manifest: &Manifest) -> Vec<LintError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    // action -> name of the last variadic parameter seen so far
    let mut open_variadic: Vec<(&str, &str)> = Vec::new();

    for param in &manifest.params {
        let action = param.action.as_str();
        let (bare, cardinality) = Cardinality::split(&param.name);

        if bare.trim().is_empty() {
            errors.push(LintError::EmptyParamName {
                action: action.to_string(),
            });
            continue;
        }

        if !manifest.declares_action(action) {
            errors.push(LintError::ParamForUndeclaredAction {
                action: action.to_string(),
                param: param.name.clone(),
            });
        }

        if bare.ends_with(['+', '?', '*']) {
            errors.push(LintError::InvalidCardinality {
                action: action.to_string(),
                param: param.name.clone(),
            });
        }

        if !seen.insert((action, bare)) {
            errors.push(LintError::DuplicateParam {
                action: action.to_string(),
                param: bare.to_string(),
            });
        }

        if let Some(position) = open_variadic.iter().position(|(owner, _)| *owner == action) {
            let (_, variadic) = open_variadic.remove(position);
            errors.push(LintError::VariadicNotLast {
                action: action.to_string(),
                param: variadic.to_string(),
            });
        }
        if cardinality.is_variadic() {
            open_variadic.push((action, param.name.as_str()));
        }
    }

    errors
}

fn short_key(short: &str) -> Option<String> {
    (!short.is_empty()).then(|| format!("-{}", short.trim_end_matches(':')))
}

fn long_key(long: &str) -> Option<String> {
    (!long.is_empty()).then(|| format!("--{}", long.trim_end_matches(':')))
}

fn display_option(short: &str, long: &str) -> String {
    long_key(long)
        .or_else(|| short_key(short))
        .unwrap_or_default()
}
