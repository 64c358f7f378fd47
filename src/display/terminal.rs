use crate::analyzer::Severity;

/// Terminal color capability and styling
pub struct Terminal {
    pub supports_color: bool,
}

impl Terminal {
    pub fn new() -> Self {
        if console::Term::stdout().is_term() && console::colors_enabled() {
            Self {
                supports_color: true,
            }
        } else {
            Self::plain()
        }
    }

    /// Plain terminal, for output that is compared in tests or piped
    pub fn plain() -> Self {
        Self {
            supports_color: false,
        }
    }

    /// Get color style based on performance level
    pub fn get_performance_style(&self, percentage: f64) -> console::Style {
        let mut style = console::Style::new();
        if !self.supports_color {
            return style;
        }

        if percentage >= 80.0 {
            style = style.green(); // Excellent
        } else if percentage >= 60.0 {
            style = style.yellow(); // Good
        } else {
            style = style.red(); // Poor
        }
        style
    }

    /// Get color style for a finding
    pub fn get_severity_style(&self, severity: Severity) -> console::Style {
        let style = console::Style::new();
        if !self.supports_color {
            return style;
        }

        match severity {
            Severity::Ok => style.green(),
            Severity::Notice => style.yellow(),
            Severity::Warning => style.red().bold(),
        }
    }

    /// Apply a style unless colors are disabled
    pub fn paint(&self, style: &console::Style, text: &str) -> String {
        if self.supports_color {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}
