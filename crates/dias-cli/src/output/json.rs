//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::Status;
use anyhow::Result;
use dias_core::AssemblySummary;
use dias_core::PackageDescription;
use dias_core::ValidationResult;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_assembly_result(&self, summary: &AssemblySummary) -> Result<()> {
        #[derive(Serialize)]
        struct AssemblyOutput<'a> {
            container_dir: String,
            container_id: &'a str,
            package_id: &'a str,
            archive_path: &'a str,
            archive_checksum: &'a str,
            archive_size: u64,
            files_copied: usize,
            bytes_copied: u64,
            archive_entries: usize,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = AssemblyOutput {
            container_dir: summary.container_dir.display().to_string(),
            container_id: &summary.container_id,
            package_id: &summary.package_id,
            archive_path: &summary.archive.path,
            archive_checksum: &summary.archive.checksum,
            archive_size: summary.archive.size,
            files_copied: summary.files_copied,
            bytes_copied: summary.bytes_copied,
            archive_entries: summary.archive_entries,
            duration_ms: summary.duration.as_millis(),
            warnings: &summary.warnings,
        };

        Self::output(&JsonOutput::success("create", data))
    }

    fn format_validation_result(&self, package: &Path, result: &ValidationResult) -> Result<()> {
        #[derive(Serialize)]
        struct ValidationOutput<'a> {
            package: String,
            valid: bool,
            #[serde(flatten)]
            result: &'a ValidationResult,
        }

        let status = if result.is_valid() {
            Status::Success
        } else {
            Status::Error
        };
        let data = ValidationOutput {
            package: package.display().to_string(),
            valid: result.is_valid(),
            result,
        };

        Self::output(&JsonOutput::with_status("validate", status, data))
    }

    fn format_description(&self, description: &PackageDescription) -> Result<()> {
        Self::output(&JsonOutput::success("inspect", description))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error("unknown", format!("{error:?}"));
        let _ = Self::output(&output);
    }

    fn format_success(&self, message: &str) {
        #[derive(Serialize)]
        struct SuccessData<'a> {
            message: &'a str,
        }

        let _ = Self::output(&JsonOutput::success("unknown", SuccessData { message }));
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        let _ = Self::output(&JsonOutput::success("warning", WarningData { message }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_output_flattens_result() {
        let mut result = ValidationResult::default();
        result.add_error("info.xml not found");

        #[derive(Serialize)]
        struct Flattened<'a> {
            valid: bool,
            #[serde(flatten)]
            result: &'a ValidationResult,
        }

        let json = serde_json::to_value(Flattened {
            valid: result.is_valid(),
            result: &result,
        })
        .unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0], "info.xml not found");
        assert_eq!(json["checksums_verified"], 0);
    }
}
