//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use dias_core::AssemblySummary;
use dias_core::PackageDescription;
use dias_core::ValidationResult;
use dias_core::inspection::format_size;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, c) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }

        result.chars().rev().collect()
    }

    fn write_block(&self, text: &str) {
        for line in text.lines() {
            let _ = self.term.write_line(line);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_assembly_result(&self, summary: &AssemblySummary) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.format_success(&format!(
            "Package created: {}",
            summary.container_dir.display()
        ));

        let _ = self.term.write_line("");
        let _ = self
            .term
            .write_line(&format!("  Container (AIC):  {}", summary.container_id));
        let _ = self
            .term
            .write_line(&format!("  Package (AIP):    {}", summary.package_id));
        let _ = self.term.write_line(&format!(
            "  Files copied:     {}",
            Self::format_number(summary.files_copied)
        ));
        let _ = self.term.write_line(&format!(
            "  Content size:     {}",
            format_size(summary.bytes_copied)
        ));
        let _ = self.term.write_line(&format!(
            "  Archive:          {} ({})",
            summary.archive.name,
            format_size(summary.archive.size)
        ));

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Archive SHA-256:  {}", summary.archive.checksum));
            let _ = self.term.write_line(&format!(
                "  Archive entries:  {}",
                Self::format_number(summary.archive_entries)
            ));
            let _ = self
                .term
                .write_line(&format!("  Duration:         {:?}", summary.duration));
        }

        if !summary.warnings.is_empty() {
            let _ = self.term.write_line("");
            for warning in &summary.warnings {
                self.format_warning(warning);
            }
        }

        Ok(())
    }

    fn format_validation_result(&self, package: &Path, result: &ValidationResult) -> Result<()> {
        // An invalid package is reported even in quiet mode: it is the error.
        if self.quiet && result.is_valid() {
            return Ok(());
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("Validating {}", package.display()));
            let _ = self.term.write_line("");
        }

        let summary = result.summary();
        if self.use_colors {
            for line in summary.lines() {
                let is_status = line.starts_with("Validation Result:");
                let line = match (is_status, result.is_valid()) {
                    (true, true) => style(line).green().bold().to_string(),
                    (true, false) => style(line).red().bold().to_string(),
                    (false, _) => line.to_string(),
                };
                let _ = self.term.write_line(&line);
            }
        } else {
            self.write_block(&summary);
        }

        Ok(())
    }

    fn format_description(&self, description: &PackageDescription) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.write_block(&description.summary());
        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_success(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_small() {
        assert_eq!(HumanFormatter::format_number(0), "0");
        assert_eq!(HumanFormatter::format_number(42), "42");
        assert_eq!(HumanFormatter::format_number(999), "999");
    }

    #[test]
    fn test_format_number_thousands() {
        assert_eq!(HumanFormatter::format_number(1000), "1,000");
        assert_eq!(HumanFormatter::format_number(1_234_567), "1,234,567");
        assert_eq!(
            HumanFormatter::format_number(123_456_789_012),
            "123,456,789,012"
        );
    }
}
