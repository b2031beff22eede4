//! Pre-flight checks run before any filesystem mutation.

use crate::PackageError;
use crate::PackageMetadata;
use crate::PackagerConfig;
use crate::Result;
use crate::creation::walker::collect_tree;
use std::fs;
use std::path::Path;

const INVALID_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const MAX_NAME_LEN: usize = 255;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One finding of a pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Human-readable message.
    pub message: String,
    /// Input field the finding refers to.
    pub field: Option<String>,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Errors, warnings and informational findings of pre-flight checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    /// Blocking findings.
    pub errors: Vec<Finding>,
    /// Non-blocking findings.
    pub warnings: Vec<Finding>,
    /// Informational findings.
    pub info: Vec<Finding>,
}

impl PreflightReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a blocking finding.
    pub fn add_error(&mut self, message: impl Into<String>, field: &str) {
        self.errors.push(finding(message, field));
    }

    /// Adds a warning.
    pub fn add_warning(&mut self, message: impl Into<String>, field: &str) {
        self.warnings.push(finding(message, field));
    }

    /// Adds an informational finding.
    pub fn add_info(&mut self, message: impl Into<String>, field: &str) {
        self.info.push(finding(message, field));
    }

    /// Appends all findings of `other`.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
    }

    /// Returns `true` if there are no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in order.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|f| f.message.clone()).collect()
    }

    /// Converts blocking findings into [`PackageError::Validation`].
    ///
    /// # Errors
    ///
    /// Returns the error messages if the report has any errors.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(PackageError::Validation(self.error_messages()))
        }
    }
}

fn finding(message: impl Into<String>, field: &str) -> Finding {
    Finding {
        message: message.into(),
        field: Some(field.to_string()),
    }
}

/// Checks that the source exists and is readable.
pub fn check_source(source: &Path) -> PreflightReport {
    let mut report = PreflightReport::new();

    if source.as_os_str().is_empty() {
        report.add_error("Source path is required", "source_path");
        return report;
    }

    let meta = match fs::metadata(source) {
        Ok(meta) => meta,
        Err(_) => {
            report.add_error(
                format!("Source path does not exist: {}", source.display()),
                "source_path",
            );
            return report;
        }
    };

    if meta.is_dir() {
        if fs::read_dir(source).is_err() {
            report.add_error(
                format!("Source path is not readable: {}", source.display()),
                "source_path",
            );
            return report;
        }
        let files = collect_tree(source, source, false).file_count();
        if files == 0 {
            report.add_warning("Source directory is empty", "source_path");
        } else {
            report.add_info(format!("Source contains {files} file(s)"), "source_path");
        }
    } else {
        if fs::File::open(source).is_err() {
            report.add_error(
                format!("Source path is not readable: {}", source.display()),
                "source_path",
            );
            return report;
        }
        report.add_info(
            format!("Source file size: {:.2} MB", meta.len() as f64 / BYTES_PER_MB),
            "source_path",
        );
    }

    report
}

/// Checks that the output directory exists and is writable, or can be
/// created.
pub fn check_output(output: &Path) -> PreflightReport {
    let mut report = PreflightReport::new();

    if output.as_os_str().is_empty() {
        report.add_error("Output path is required", "output_path");
        return report;
    }

    match fs::metadata(output) {
        Ok(meta) if !meta.is_dir() => {
            report.add_error(
                format!("Output path is not a directory: {}", output.display()),
                "output_path",
            );
        }
        Ok(meta) if meta.permissions().readonly() => {
            report.add_error(
                format!("Output directory is not writable: {}", output.display()),
                "output_path",
            );
        }
        Ok(_) => {}
        Err(_) => {
            let parent = output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            match fs::metadata(parent) {
                Err(_) => report.add_error(
                    format!("Parent directory does not exist: {}", parent.display()),
                    "output_path",
                ),
                Ok(meta) if meta.permissions().readonly() => report.add_error(
                    format!("Parent directory is not writable: {}", parent.display()),
                    "output_path",
                ),
                Ok(_) => {}
            }
        }
    }

    report
}

/// Total size of the files in `source`.
#[must_use]
pub fn source_size(source: &Path) -> u64 {
    match fs::metadata(source) {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => collect_tree(source, source, false).total_size(),
        Err(_) => 0,
    }
}

/// Free bytes on the volume holding `path` or its nearest existing ancestor.
#[must_use]
pub fn available_space(path: &Path) -> Option<u64> {
    let existing = path.ancestors().find(|p| p.exists())?;
    fs2::available_space(existing).ok()
}

/// Compares the estimated working space with the free space.
pub fn check_disk_space(source: &Path, output: &Path, config: &PackagerConfig) -> PreflightReport {
    check_disk_space_with(source_size(source), available_space(output), config)
}

/// Disk-space rule for known sizes.
pub fn check_disk_space_with(
    source_size: u64,
    free: Option<u64>,
    config: &PackagerConfig,
) -> PreflightReport {
    let mut report = PreflightReport::new();

    if source_size == 0 {
        report.add_warning("Could not determine source size", "disk_space");
        return report;
    }

    let estimated = source_size as f64 * config.package_size_multiplier;
    let required = estimated * config.disk_space_safety_margin;

    let Some(free) = free else {
        report.add_warning("Could not determine available disk space", "disk_space");
        return report;
    };
    let free = free as f64;

    let required_gb = required / BYTES_PER_GB;
    let free_gb = free / BYTES_PER_GB;
    report.add_info(
        format!("Source size: {:.2} MB", source_size as f64 / BYTES_PER_MB),
        "disk_space",
    );
    report.add_info(
        format!("Estimated package size: {:.2} MB", estimated / BYTES_PER_MB),
        "disk_space",
    );
    report.add_info(
        format!("Required space (with safety margin): {required_gb:.2} GB"),
        "disk_space",
    );
    report.add_info(format!("Available space: {free_gb:.2} GB"), "disk_space");

    if free < required {
        let shortage = (required - free) / BYTES_PER_GB;
        report.add_error(
            format!(
                "Insufficient disk space. Need {required_gb:.2} GB but only {free_gb:.2} GB \
                 available. Short by {shortage:.2} GB."
            ),
            "disk_space",
        );
    } else if free < required * 1.2 {
        report.add_error(
            format!(
                "Disk space too low for safe operation. Need at least {:.2} GB but only \
                 {free_gb:.2} GB available. Package creation may fail during tar archive \
                 creation.",
                required * 1.2 / BYTES_PER_GB
            ),
            "disk_space",
        );
    } else if free < required * 1.5 {
        report.add_warning(
            format!(
                "Low disk space. Recommended to have at least {:.2} GB free. Currently have \
                 {free_gb:.2} GB available. Consider using a drive with more space.",
                required * 1.5 / BYTES_PER_GB
            ),
            "disk_space",
        );
    } else {
        report.add_info("Sufficient disk space available", "disk_space");
    }

    report
}

/// Checks the package name.
pub fn check_package_name(name: &str) -> PreflightReport {
    let mut report = PreflightReport::new();

    if name.trim().is_empty() {
        report.add_error("Package name is required", "package_name");
        return report;
    }

    let invalid: Vec<String> = INVALID_NAME_CHARS
        .iter()
        .filter(|c| name.contains(**c))
        .map(char::to_string)
        .collect();
    if !invalid.is_empty() {
        report.add_error(
            format!(
                "Package name contains invalid characters: {}",
                invalid.join(", ")
            ),
            "package_name",
        );
    }

    if name.chars().count() > MAX_NAME_LEN {
        report.add_error(
            "Package name is too long (max 255 characters)",
            "package_name",
        );
    }

    report
}

/// Runs every pre-flight check.
///
/// The disk-space check only runs when source and output are both valid.
pub fn check_all(
    source: &Path,
    output: &Path,
    package_name: &str,
    metadata: &PackageMetadata,
    config: &PackagerConfig,
) -> PreflightReport {
    let mut report = PreflightReport::new();

    let source_report = check_source(source);
    let output_report = check_output(output);
    let paths_valid = source_report.is_valid() && output_report.is_valid();
    report.merge(source_report);
    report.merge(output_report);

    if paths_valid {
        report.merge(check_disk_space(source, output, config));
    }

    report.merge(check_package_name(package_name));
    report.merge(metadata.validate());
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_ensure_valid() {
        let mut report = PreflightReport::new();
        assert!(report.ensure_valid().is_ok());

        report.add_error("Package name is required", "package_name");
        report.add_warning("Low disk space", "output");
        match report.ensure_valid() {
            Err(PackageError::Validation(errors)) => {
                assert_eq!(errors, vec!["Package name is required"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_source() {
        let report = check_source(Path::new("/definitely/not/here"));
        assert_eq!(
            report.error_messages(),
            vec!["Source path does not exist: /definitely/not/here"]
        );
    }

    #[test]
    fn test_empty_source_dir_warns() {
        let temp = tempfile::tempdir().unwrap();
        let report = check_source(temp.path());
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].message, "Source directory is empty");
    }

    #[test]
    fn test_source_file_count() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("d")).unwrap();
        fs::write(temp.path().join("d/x"), b"x").unwrap();
        fs::write(temp.path().join("y"), b"y").unwrap();
        let report = check_source(temp.path());
        assert_eq!(report.info[0].message, "Source contains 2 file(s)");
    }

    #[test]
    fn test_output_checks() {
        let temp = tempfile::tempdir().unwrap();
        assert!(check_output(temp.path()).is_valid());
        assert!(check_output(&temp.path().join("new")).is_valid());

        let report = check_output(&temp.path().join("a/b"));
        assert!(report.error_messages()[0].starts_with("Parent directory does not exist"));

        let file = temp.path().join("f");
        fs::write(&file, b"").unwrap();
        let report = check_output(&file);
        assert!(report.error_messages()[0].starts_with("Output path is not a directory"));
    }

    #[test]
    fn test_package_name_rules() {
        assert_eq!(
            check_package_name("  ").error_messages(),
            vec!["Package name is required"]
        );
        assert_eq!(
            check_package_name("a/b:c").error_messages(),
            vec!["Package name contains invalid characters: /, :"]
        );
        assert_eq!(
            check_package_name(&"n".repeat(256)).error_messages(),
            vec!["Package name is too long (max 255 characters)"]
        );
        assert!(check_package_name("pkg").is_valid());
    }

    #[test]
    fn test_disk_space_thresholds() {
        let config = PackagerConfig::default();
        // required = 1 GiB * 3.0 * 1.5 = 4.5 GiB
        let source = GB;

        let short = check_disk_space_with(source, Some(4 * GB), &config);
        assert!(short.error_messages()[0].starts_with("Insufficient disk space. Need 4.50 GB"));
        assert!(short.error_messages()[0].ends_with("Short by 0.50 GB."));

        let tight = check_disk_space_with(source, Some(5 * GB), &config);
        assert!(tight.error_messages()[0].starts_with("Disk space too low for safe operation"));

        let low = check_disk_space_with(source, Some(6 * GB), &config);
        assert!(low.is_valid());
        assert!(low.warnings[0].message.starts_with("Low disk space"));

        let plenty = check_disk_space_with(source, Some(100 * GB), &config);
        assert!(plenty.is_valid());
        assert!(plenty.warnings.is_empty());
        assert_eq!(
            plenty.info.last().unwrap().message,
            "Sufficient disk space available"
        );
    }

    #[test]
    fn test_disk_space_unknowns_warn() {
        let config = PackagerConfig::default();
        let zero = check_disk_space_with(0, Some(GB), &config);
        assert_eq!(zero.warnings[0].message, "Could not determine source size");
        let unknown = check_disk_space_with(GB, None, &config);
        assert_eq!(
            unknown.warnings[0].message,
            "Could not determine available disk space"
        );
    }

    #[test]
    fn test_check_all_skips_disk_space_for_bad_paths() {
        let report = check_all(
            Path::new("/missing/source"),
            Path::new("/missing/output/dir"),
            "pkg",
            &PackageMetadata::default(),
            &PackagerConfig::default(),
        );
        assert!(report.errors.iter().all(|f| f.field.as_deref() != Some("disk_space")));
        assert!(report.warnings.iter().all(|f| f.field.as_deref() != Some("disk_space")));
    }
}
