//! Progress bar implementation for CLI operations.

use console::Term;
use console::style;
use dias_core::AssemblyObserver;
use dias_core::LogLevel;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;

const PERCENT_SCALE: u64 = 100;

/// CLI progress bar wrapper implementing `AssemblyObserver`.
///
/// Shows overall percent and the current stage; warnings and errors are
/// printed above the bar. Automatically cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    verbose: bool,
}

impl CliProgress {
    /// Creates a new CLI progress bar.
    ///
    /// # Arguments
    ///
    /// * `message` - Prefix shown before the bar (e.g., "Creating")
    /// * `verbose` - Also print info-level log lines
    #[must_use]
    pub fn new(message: &str, verbose: bool) -> Self {
        let bar = ProgressBar::new(PERCENT_SCALE);

        // Template: "Creating [████████░░░░]  42% Copying schema files..."
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_prefix(message.to_string());

        Self { bar, verbose }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl AssemblyObserver for CliProgress {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn on_progress(&self, percent: f64, status: &str) {
        let position = percent.clamp(0.0, 100.0).round() as u64;
        self.bar.set_position(position);
        self.bar.set_message(status.to_string());
    }

    fn on_log(&self, level: LogLevel, message: &str) {
        let line = match level {
            LogLevel::Warning => format!("{} {message}", style("⚠").yellow().bold()),
            LogLevel::Error => format!("{} {message}", style("✗").red().bold()),
            LogLevel::Info | LogLevel::Success if self.verbose => format!("  {message}"),
            _ => return,
        };
        self.bar.println(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_positions() {
        let progress = CliProgress::new("Testing", false);

        progress.on_progress(42.4, "Copying");
        assert_eq!(progress.bar.position(), 42);

        progress.on_progress(150.0, "Done");
        assert_eq!(progress.bar.position(), 100);

        progress.on_log(LogLevel::Warning, "Schema not found: dias_mets.xsd, skipping");
    }
}
