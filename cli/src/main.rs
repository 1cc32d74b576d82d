use std::process::ExitCode;

use command_dispatch_core::{
    ActionHandler, HandlerError, MAIN, OptionHandler, Registry, Settings, StdConsole, env_args, run,
    usage_text,
};
use command_dispatch_manifest::{ActionDecl, HandlerTable, Manifest, OptionDecl, lint_manifest};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const PROGRAM: &str = "cmd-dispatch";

/// State shared by the tool's own option and action handlers.
#[derive(Debug, Default)]
struct Session {
    verbosity: u8,
}

/// Handler invocations recorded while tracing a manifest.
#[derive(Debug, Default)]
struct TraceLog {
    lines: Vec<serde_json::Value>,
}

fn main() -> ExitCode {
    let registry = tool_registry();
    let mut session = Session::default();
    run(&registry, &mut session, &env_args(), &mut StdConsole::new()).into()
}

fn tool_registry() -> Registry<Session> {
    let mut registry = Registry::with_settings(Settings::for_program(PROGRAM));
    registry.declare_action(
        MAIN,
        None,
        "Check, render and trace command-dispatch manifests (YAML or JSON).",
    );
    registry.declare_option(
        MAIN,
        "v",
        "verbose",
        OptionHandler::flag(|session: &mut Session| {
            session.verbosity = session.verbosity.saturating_add(1);
            Ok(())
        }),
        "Log more detail to stderr; repeat for more. RUST_LOG applies otherwise",
    );

    registry.declare_action(
        "check",
        Some(ActionHandler::call(run_check)),
        "Report structural problems in a manifest",
    );
    registry.declare_param("check", "manifest", "Manifest file (.yaml, .yml or .json)");

    registry.declare_action(
        "usage",
        Some(ActionHandler::call(run_usage)),
        "Print the usage text a manifest produces",
    );
    registry.declare_param("usage", "manifest", "Manifest file (.yaml, .yml or .json)");
    registry.declare_param("usage", "action?", "Action to render; the root action by default");

    registry.declare_action(
        "trace",
        Some(ActionHandler::call(run_trace)),
        "Dispatch arguments against a manifest and print each handler call as JSON",
    );
    registry.declare_param("trace", "manifest", "Manifest file (.yaml, .yml or .json)");
    registry.declare_param("trace", "args*", "Arguments to dispatch");
    registry
}

/// Installs the stderr subscriber. Verbosity is only known once option
/// scanning is done, so every action calls this first.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbosity > 0 {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(path: &str) -> Result<Manifest, HandlerError> {
    Manifest::load(path).map_err(|err| HandlerError::new(format!("failed to load '{path}': {err}")))
}

fn run_check(session: &mut Session, tokens: &[String]) -> Result<(), HandlerError> {
    init_logging(session.verbosity);
    let path = &tokens[0];
    tracing::info!(path = %path, "checking manifest");

    let manifest = load(path)?;
    let lints = lint_manifest(&manifest);
    let (warnings, errors): (Vec<_>, Vec<_>) = lints.iter().partition(|lint| lint.is_warning());

    for lint in &lints {
        let severity = if lint.is_warning() { "warning" } else { "error" };
        println!("{severity}: {lint}");
    }

    if !errors.is_empty() {
        return Err(HandlerError::new(format!(
            "{path}: {} error(s), {} warning(s)",
            errors.len(),
            warnings.len()
        )));
    }

    println!(
        "{path}: {} action(s), {} option(s), {} parameter(s), {} warning(s)",
        manifest.actions.len(),
        manifest.options.len(),
        manifest.params.len(),
        warnings.len()
    );
    Ok(())
}

fn run_usage(session: &mut Session, tokens: &[String]) -> Result<(), HandlerError> {
    init_logging(session.verbosity);
    let manifest = load(&tokens[0])?;
    let registry = manifest.build_registry(&HandlerTable::<()>::new());

    let action = tokens.get(1).map(String::as_str).unwrap_or(MAIN);
    if !registry.has_action(action) {
        return Err(HandlerError::new(format!(
            "manifest declares no action '{action}'"
        )));
    }

    print!("{}", usage_text(&registry, action));
    Ok(())
}

fn run_trace(session: &mut Session, tokens: &[String]) -> Result<(), HandlerError> {
    init_logging(session.verbosity);
    let (path, args) = (&tokens[0], &tokens[1..]);

    let manifest = load(path)?;
    let registry = manifest.build_registry_with(action_recorder, option_recorder);
    let mut log = TraceLog::default();

    tracing::info!(path = %path, args = args.len(), "tracing dispatch");
    let status = run(&registry, &mut log, args, &mut StdConsole::new());

    for line in &log.lines {
        println!("{line}");
    }

    if status.is_success() {
        Ok(())
    } else {
        // the traced program already reported the failure
        Err(HandlerError::status(status.code()))
    }
}

/// Records calls of one declared option. Arity comes from the declaration,
/// so options sharing a handler name keep their own behavior.
fn option_recorder(option: &OptionDecl) -> OptionHandler<TraceLog> {
    let action = option.action.clone();
    let handler = option.handler.clone();

    if option.takes_value() {
        OptionHandler::value(move |log: &mut TraceLog, value| {
            log.lines.push(json!({
                "kind": "option",
                "action": action,
                "handler": handler,
                "value": value
            }));
            Ok(())
        })
    } else {
        OptionHandler::flag(move |log: &mut TraceLog| {
            log.lines.push(json!({
                "kind": "option",
                "action": action,
                "handler": handler
            }));
            Ok(())
        })
    }
}

fn action_recorder(declared: &ActionDecl) -> Option<ActionHandler<TraceLog>> {
    let handler = declared.handler.clone()?;
    let action = declared.name.clone();
    Some(ActionHandler::call(move |log: &mut TraceLog, tokens| {
        log.lines.push(json!({
            "kind": "action",
            "action": action,
            "handler": handler,
            "tokens": tokens
        }));
        Ok(())
    }))
}
