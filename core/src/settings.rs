//! Registry-wide settings for usage rendering and help exit status.
//!
//! Settings are plain data and deserialize from the `settings:` block of a
//! manifest. Every field has a default, so an empty block is valid.

use serde::{Deserialize, Serialize};

/// Column where option and parameter help text starts.
pub const DEFAULT_LABEL_WIDTH: usize = 24;

/// Total width help text is wrapped to.
pub const DEFAULT_WIDTH: usize = 80;

/// Presentation and exit-status settings carried by a
/// [`Registry`](crate::Registry).
///
/// # Examples
///
/// ```
/// use command_dispatch_core::Settings;
///
/// let settings = Settings::for_program("widget").with_help_status(4);
/// assert_eq!(settings.program, "widget");
/// assert_eq!(settings.help_status, Some(4));
/// assert_eq!(settings.width, 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Program name printed in the usage summary line.
    pub program: String,
    /// Exit status used after help was shown on request. `None` means 0.
    pub help_status: Option<u8>,
    /// Column where help text starts in the detail sections.
    pub label_width: usize,
    /// Width that help text is wrapped to.
    pub width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            program: program_name(),
            help_status: None,
            label_width: DEFAULT_LABEL_WIDTH,
            width: DEFAULT_WIDTH,
        }
    }
}

impl Settings {
    /// Default settings with an explicit program name.
    pub fn for_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_help_status(mut self, status: u8) -> Self {
        self.help_status = Some(status);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// File name of the running executable, or `"program"` if it is unknown.
fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(|arg0| std::path::Path::new(arg0))
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string())
}
