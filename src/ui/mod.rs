pub mod formatter;
pub mod interactive;
pub mod progress;
pub mod theme;

use std::io::IsTerminal;

pub use formatter::{OutputFormatter, TreeNode};
pub use interactive::{InteractivePrompts, PickerRow};
pub use progress::ProgressIndicator;
pub use theme::{ColorTheme, Role, ThemeType};

/// Terminal output for the CLI: status lines plus access to the formatter.
pub struct UIManager {
    pub theme: ColorTheme,
    pub formatter: OutputFormatter,
    stderr_is_terminal: bool,
}

impl UIManager {
    /// Colours are used only when requested and stdout is a terminal.
    pub fn new(colors_enabled: bool, theme_type: ThemeType) -> Self {
        let enabled = colors_enabled && std::io::stdout().is_terminal();
        Self::with_theme(ColorTheme::new(theme_type, enabled))
    }

    pub fn with_theme(theme: ColorTheme) -> Self {
        Self {
            theme,
            formatter: OutputFormatter::new(theme),
            stderr_is_terminal: std::io::stderr().is_terminal(),
        }
    }

    pub fn print_header(&self, title: &str) {
        println!("{}", self.theme.paint(Role::StatHeader, title));
    }

    pub fn print_info(&self, message: &str) {
        println!("{}", self.theme.paint(Role::Info, message));
    }

    pub fn print_success(&self, message: &str) {
        println!("{}", self.theme.paint(Role::Success, message));
    }

    pub fn print_warning(&self, message: &str) {
        eprintln!("{}", self.theme.paint(Role::Warning, &format!("⚠️  {message}")));
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{}", self.theme.paint(Role::Error, &format!("⚠️  {message}")));
    }

    /// Error line followed by indented hints.
    pub fn print_error_with_suggestions(&self, message: &str, suggestions: &[String]) {
        self.print_error(message);
        for suggestion in suggestions {
            eprintln!("  {}", self.theme.paint(Role::Info, suggestion));
        }
    }

    pub fn create_scan_progress(&self, message: &str, show: bool) -> ProgressIndicator {
        ProgressIndicator::spinner(message, show && self.stderr_is_terminal)
    }
}
