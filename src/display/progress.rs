use super::terminal::Terminal;

/// ASCII progress bar renderer for ratios in the analyzer report
pub struct ProgressBar<'a> {
    width: usize,
    terminal: &'a Terminal,
}

impl<'a> ProgressBar<'a> {
    pub fn new(width: usize, terminal: &'a Terminal) -> Self {
        Self { width, terminal }
    }

    /// Render a progress bar with percentage
    /// Returns a string with the progress bar and percentage
    pub fn render(&self, percentage: f64, label: Option<&str>) -> String {
        let clamped = percentage.clamp(0.0, 100.0);
        let filled = (clamped / 100.0 * self.width as f64).round() as usize;
        let empty = self.width.saturating_sub(filled);

        let bar = format!("[{}{}]", "#".repeat(filled), ".".repeat(empty));
        let percent_text = format!("{:>5.1}%", percentage);

        let styled_bar = self
            .terminal
            .paint(&self.terminal.get_performance_style(percentage), &bar);

        match label {
            Some(label) => format!("{} {} {}", styled_bar, percent_text, label),
            None => format!("{} {}", styled_bar, percent_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_full() {
        let terminal = Terminal::plain();
        let pb = ProgressBar::new(10, &terminal);
        let result = pb.render(100.0, Some("(Excellent)"));
        assert_eq!(result, "[##########] 100.0% (Excellent)");
    }

    #[test]
    fn test_progress_bar_half() {
        let terminal = Terminal::plain();
        let pb = ProgressBar::new(10, &terminal);
        let result = pb.render(50.0, None);
        assert_eq!(result, "[#####.....]  50.0%");
    }

    #[test]
    fn test_progress_bar_empty() {
        let terminal = Terminal::plain();
        let pb = ProgressBar::new(10, &terminal);
        assert_eq!(pb.render(0.0, None), "[..........]   0.0%");
    }

    #[test]
    fn test_progress_bar_clamps_overflow() {
        let terminal = Terminal::plain();
        let pb = ProgressBar::new(4, &terminal);
        assert!(pb.render(250.0, None).starts_with("[####]"));
    }
}
