//! Usage text rendered from registry contents.
//!
//! Overall structure:
//!
//! ```text
//! usage: widget [-h] [-q] [-o OUTPUT] {create,remove} <name> [extra]
//!
//! Manage widgets.
//!
//! command line actions:
//!   create                Create a widget
//!
//! positional parameters:
//!   name                  Widget name
//!
//! optional arguments:
//!   -h, --help            show this help message and exit
//!   -o OUTPUT, --output OUTPUT
//!                         Where to write the result
//! ```
//!
//! Detail sections are only written when they have at least one row. The
//! action line is omitted for the root action; the sub-action set and the
//! "command line actions" section only appear for the root.

use std::io::{self, Write};

use crate::registry::{Cardinality, MAIN, OptionSpec, ParamSpec, Registry};
use crate::settings::Settings;

/// Help text narrower than this is not worth wrapping to.
const MIN_HELP_WIDTH: usize = 20;

/// Indent of rows inside a detail section.
const ROW_INDENT: usize = 2;

/// Writes the usage text of `action` to `out`.
pub fn render<C>(registry: &Registry<C>, action: &str, out: &mut dyn Write) -> io::Result<()> {
    let settings = registry.settings();

    write_summary(registry, action, out)?;

    let description = registry.action(action).map(|spec| spec.help()).unwrap_or("");
    if !description.is_empty() {
        writeln!(out)?;
        for line in textwrap::wrap(description, settings.width.max(MIN_HELP_WIDTH)) {
            writeln!(out, "{line}")?;
        }
    }

    if action == MAIN {
        let rows: Vec<(String, &str)> = registry
            .sub_actions()
            .map(|spec| (spec.name().to_string(), spec.help()))
            .collect();
        maybe_section(out, settings, "command line actions", &rows)?;
    }

    let rows: Vec<(String, &str)> = registry
        .params(action)
        .map(|param| (param.name().to_string(), param.help()))
        .collect();
    maybe_section(out, settings, "positional parameters", &rows)?;

    let rows: Vec<(String, &str)> = registry
        .options(action)
        .map(|option| (option_label(option), option.help()))
        .collect();
    maybe_section(out, settings, "optional arguments", &rows)
}

/// Renders the usage text of `action` into a string.
///
/// # Examples
///
/// ```
/// use command_dispatch_core::{MAIN, Registry, Settings, usage_text};
///
/// let mut registry: Registry<()> = Registry::with_settings(Settings::for_program("widget"));
/// registry.declare_param(MAIN, "name", "Widget name");
///
/// let text = usage_text(&registry, MAIN);
/// assert!(text.starts_with("usage: widget [-h] <name>\n"));
/// assert!(text.contains("positional parameters:\n  name"));
/// ```
pub fn usage_text<C>(registry: &Registry<C>, action: &str) -> String {
    let mut buffer = Vec::new();
    // writing into a Vec cannot fail
    let _ = render(registry, action, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn write_summary<C>(registry: &Registry<C>, action: &str, out: &mut dyn Write) -> io::Result<()> {
    let settings = registry.settings();

    let mut head = format!("usage: {}", settings.program);
    if action != MAIN {
        head.push(' ');
        head.push_str(action);
    }

    let mut atoms: Vec<String> = registry.options(action).map(option_synopsis).collect();

    if action == MAIN {
        let names: Vec<&str> = registry.sub_actions().map(|spec| spec.name()).collect();
        if !names.is_empty() {
            atoms.push(format!("{{{}}}", names.join(",")));
        }
    }

    atoms.extend(registry.params(action).map(param_synopsis));

    // continuation lines line up under the first atom unless that would
    // leave too little room
    let mut indent = head.chars().count() + 1;
    if indent > settings.width / 2 {
        indent = "usage: ".len();
    }

    let mut line = head;
    for atom in atoms {
        if line.chars().count() + 1 + atom.chars().count() > settings.width
            && !line.trim().is_empty()
        {
            writeln!(out, "{line}")?;
            line = " ".repeat(indent - 1);
        }
        line.push(' ');
        line.push_str(&atom);
    }
    writeln!(out, "{line}")
}

fn option_synopsis<C>(option: &OptionSpec<C>) -> String {
    let tag = match (option.short(), option.long()) {
        (Some(short), _) => format!("-{short}"),
        (None, Some(long)) => format!("--{long}"),
        (None, None) => String::new(),
    };
    match option.arg_name() {
        Some(arg) => format!("[{tag} {arg}]"),
        None => format!("[{tag}]"),
    }
}

fn param_synopsis(param: &ParamSpec) -> String {
    let name = param.name();
    match param.cardinality() {
        Cardinality::One | Cardinality::OneOrMore => format!("<{name}>"),
        Cardinality::Optional | Cardinality::ZeroOrMore => format!("[{name}]"),
    }
}

fn option_label<C>(option: &OptionSpec<C>) -> String {
    let arg = option.arg_name();
    let form = |dashes: &str, name: &str| match &arg {
        Some(arg) => format!("{dashes}{name} {arg}"),
        None => format!("{dashes}{name}"),
    };

    match (option.short(), option.long()) {
        (Some(short), Some(long)) => format!("{}, {}", form("-", short), form("--", long)),
        (Some(short), None) => form("-", short),
        (None, Some(long)) => form("--", long),
        (None, None) => String::new(),
    }
}

fn maybe_section(
    out: &mut dyn Write,
    settings: &Settings,
    header: &str,
    rows: &[(String, &str)],
) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n{header}:")?;
    rows.iter()
        .try_for_each(|(label, help)| describe(out, settings, label, help))
}

/// Writes one aligned row. Help starts at the label column on the same line
/// when the label leaves room for it, otherwise on the next line.
fn describe(out: &mut dyn Write, settings: &Settings, label: &str, help: &str) -> io::Result<()> {
    let column = settings.label_width.max(ROW_INDENT + 2);
    let indent = ROW_INDENT;
    let pad = "";
    if help.trim().is_empty() {
        return writeln!(out, "{pad:indent$}{label}");
    }

    let help_width = settings.width.saturating_sub(column).max(MIN_HELP_WIDTH);
    let lines = textwrap::wrap(help, help_width);
    let mut lines = lines.iter();
    let Some(first) = lines.next() else {
        return writeln!(out, "{pad:indent$}{label}");
    };

    if indent + label.chars().count() + 2 <= column {
        let width = column - indent;
        writeln!(out, "{pad:indent$}{label:<width$}{first}")?;
    } else {
        writeln!(out, "{pad:indent$}{label}")?;
        writeln!(out, "{pad:column$}{first}")?;
    }

    lines.try_for_each(|line| writeln!(out, "{pad:column$}{line}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ActionHandler, OptionHandler};

    fn noop_flag() -> OptionHandler<()> {
        OptionHandler::flag(|_| Ok(()))
    }

    fn widget_registry() -> Registry<()> {
        let mut registry = Registry::with_settings(Settings::for_program("widget"));
        registry.declare_option(MAIN, "q", "quiet", noop_flag(), "Be quiet");
        registry.declare_option(MAIN, "o:", "output-dir:", noop_flag(), "Where to write");
        registry.declare_action(
            "create",
            Some(ActionHandler::call(|_, _| Ok(()))),
            "Create a widget",
        );
        registry.declare_param("create", "name", "Widget name");
        registry.declare_param("create", "extra*", "Extra tokens");
        registry.declare_action("remove", None, "Remove widgets");
        registry
    }

    #[test]
    fn test_main_usage_layout() {
        let text = usage_text(&widget_registry(), MAIN);
        let expected = "\
usage: widget [-h] [-q] [-o OUTPUT_DIR] {create,remove}

command line actions:
  create                Create a widget
  remove                Remove widgets

optional arguments:
  -h, --help            show this help message and exit
  -q, --quiet           Be quiet
  -o OUTPUT_DIR, --output-dir OUTPUT_DIR
                        Where to write
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_sub_action_usage_layout() {
        let text = usage_text(&widget_registry(), "create");
        let expected = "\
usage: widget create [-h] <name> [extra]

Create a widget

positional parameters:
  name                  Widget name
  extra                 Extra tokens

optional arguments:
  -h, --help            show this help message and exit
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_param_synopsis_forms() {
        let mut registry: Registry<()> = Registry::with_settings(Settings::for_program("p"));
        registry.declare_param(MAIN, "a", "");
        registry.declare_param(MAIN, "b+", "");
        registry.declare_param(MAIN, "c?", "");
        registry.declare_param(MAIN, "d*", "");

        let text = usage_text(&registry, MAIN);
        assert!(text.starts_with("usage: p [-h] <a> <b> [c] [d]\n"));
    }

    #[test]
    fn test_long_only_option() {
        let mut registry = Registry::with_settings(Settings::for_program("p"));
        registry.declare_option(MAIN, "", "dry-run", noop_flag(), "Do nothing");
        registry.declare_option(MAIN, "", "level:", noop_flag(), "");

        let text = usage_text(&registry, MAIN);
        assert!(text.starts_with("usage: p [-h] [--dry-run] [--level LEVEL]\n"));
        assert!(text.contains("\n  --dry-run             Do nothing\n"));
        assert!(text.contains("\n  --level LEVEL\n"));
    }

    #[test]
    fn test_row_without_help_has_no_trailing_padding() {
        let mut registry: Registry<()> = Registry::with_settings(Settings::for_program("p"));
        registry.declare_param(MAIN, "name", "");

        let text = usage_text(&registry, MAIN);
        assert!(text.ends_with("positional parameters:\n  name\n\noptional arguments:\n  -h, --help            show this help message and exit\n"));
        assert!(text.lines().all(|line| !line.ends_with(' ')));
    }

    #[test]
    fn test_help_text_wraps_at_label_column() {
        let mut registry = Registry::with_settings(Settings::for_program("p").with_width(40));
        registry.declare_option(
            MAIN,
            "v",
            "verbose",
            noop_flag(),
            "Print a great deal of extra detail",
        );

        let text = usage_text(&registry, MAIN);
        assert!(text.contains("  -v, --verbose         Print a great deal\n"));
        assert!(text.contains(&format!("\n{}of extra detail\n", " ".repeat(24))));
    }

    #[test]
    fn test_summary_wraps_long_option_lists() {
        let mut registry = Registry::with_settings(Settings::for_program("p").with_width(30));
        for name in ["alpha", "bravo", "charlie", "delta"] {
            registry.declare_option(MAIN, "", &format!("{name}:"), noop_flag(), "");
        }

        let text = usage_text(&registry, MAIN);
        let summary: Vec<&str> = text.lines().take_while(|line| !line.is_empty()).collect();
        assert!(summary.len() > 1);
        assert!(summary.iter().all(|line| line.len() <= 30));
        assert!(summary[1].starts_with("         [--bravo"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let registry: Registry<()> = Registry::with_settings(Settings::for_program("p"));
        let text = usage_text(&registry, MAIN);
        assert!(!text.contains("command line actions"));
        assert!(!text.contains("positional parameters"));
        assert!(text.contains("optional arguments"));
    }
}
