//! Output formatter trait for CLI results.

use anyhow::Result;
use dias_core::AssemblySummary;
use dias_core::PackageDescription;
use dias_core::ValidationResult;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format a finished package build
    fn format_assembly_result(&self, summary: &AssemblySummary) -> Result<()>;

    /// Format the findings of a package validation
    fn format_validation_result(&self, package: &Path, result: &ValidationResult) -> Result<()>;

    /// Format a package description
    fn format_description(&self, description: &PackageDescription) -> Result<()>;

    /// Format error message
    fn format_error(&self, error: &anyhow::Error);

    /// Format success message
    fn format_success(&self, message: &str);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self::with_status(operation, Status::Success, data)
    }

    /// Carries data regardless of outcome, e.g. the findings of a failed
    /// validation.
    pub fn with_status(operation: impl Into<String>, status: Status, data: T) -> Self {
        let error = (status == Status::Error).then(|| "package is invalid".to_string());
        Self {
            operation: operation.into(),
            status,
            data: Some(data),
            error,
        }
    }

    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> JsonOutput<()> {
        JsonOutput {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_keeps_data() {
        let output = JsonOutput::with_status("validate", Status::Error, vec!["x"]);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["data"][0], "x");
        assert_eq!(json["error"], "package is invalid");
    }

    #[test]
    fn test_success_omits_error() {
        let json = serde_json::to_value(JsonOutput::success("inspect", 1)).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("error").is_none());
    }
}
