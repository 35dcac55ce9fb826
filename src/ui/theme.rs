//! Visual theme and styling.

use console::Style;

use crate::probe::ModuleStatus;

/// Packwise's visual theme.
#[derive(Debug, Clone)]
pub struct PackwiseTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for informational elements (cyan).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for directive flags (dim italic).
    pub flag: Style,
    /// Style for contextual hints (cyan dim).
    pub hint: Style,
    /// Style for key labels in key-value displays (bold).
    pub key: Style,
}

impl Default for PackwiseTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl PackwiseTheme {
    /// Create the default colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            flag: Style::new().dim().italic(),
            hint: Style::new().cyan().dim(),
            key: Style::new().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            flag: Style::new(),
            hint: Style::new(),
            key: Style::new(),
        }
    }

    /// Pick colored or plain based on the terminal and `NO_COLOR`.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▣"),
            self.highlight.apply_to(title)
        )
    }

    /// Style a module status for the results table.
    pub fn format_status(&self, status: ModuleStatus) -> String {
        let style = match status {
            ModuleStatus::Stdlib | ModuleStatus::Cached | ModuleStatus::Installed => &self.success,
            ModuleStatus::Missing => &self.error,
            ModuleStatus::ProbeFailed | ModuleStatus::Timeout => &self.warning,
        };
        style.apply_to(status.as_str()).to_string()
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_formats_messages() {
        let theme = PackwiseTheme::plain();
        assert_eq!(theme.format_success("Complete"), "✓ Complete");
        assert_eq!(theme.format_warning("Caution"), "⚠ Caution");
        assert_eq!(theme.format_error("Failed"), "✗ Failed");
        assert_eq!(theme.format_header("main.py"), "▣ main.py");
    }

    #[test]
    fn plain_status_is_bare_name() {
        let theme = PackwiseTheme::plain();
        assert_eq!(theme.format_status(ModuleStatus::ProbeFailed), "probe failed");
        assert_eq!(theme.format_status(ModuleStatus::Stdlib), "stdlib");
    }

    #[test]
    fn colored_theme_keeps_text() {
        let theme = PackwiseTheme::new();
        assert!(theme.format_success("done").contains("done"));
        assert!(theme.format_status(ModuleStatus::Missing).contains("missing"));
    }
}
