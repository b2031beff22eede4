//! Error conversion utilities for CLI.
//!
//! Converts dias-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use dias_core::PackageError;
use std::fmt;
use std::path::Path;

/// Marks a failure whose details were already printed; only the exit code
/// remains to be set.
#[derive(Debug)]
pub struct Reported(pub &'static str);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for Reported {}

/// Returns `true` if `err` only carries an exit status.
pub fn is_reported(err: &anyhow::Error) -> bool {
    err.is::<Reported>()
}

/// Converts `PackageError` to user-friendly anyhow error with context
pub fn convert_package_error(err: PackageError, path: &Path) -> anyhow::Error {
    match err {
        PackageError::Metadata(reason) => {
            anyhow!(
                "Cannot load metadata '{}': {}\n\
                 HINT: Run `dias template <FILE>` to write a template listing every field.",
                path.display(),
                reason
            )
        }
        PackageError::Config(reason) => {
            anyhow!(
                "Invalid configuration '{}': {}\n\
                 HINT: Check the file passed with --config or the DIAS_* environment variables.",
                path.display(),
                reason
            )
        }
        PackageError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid package archive in '{}': {}\n\
                 HINT: The archive may be corrupted or truncated.",
                path.display(),
                reason
            )
        }
        PackageError::InvalidInput { field, message } => {
            anyhow!("Invalid {field} '{}': {message}", path.display())
        }
        PackageError::PathIo { path: failed, source } => {
            anyhow!("I/O error on '{}': {}", failed.display(), source)
        }
        PackageError::JobRejected => {
            anyhow!("Another package job is already running")
        }
        _ => anyhow::Error::from(err).context(format!("Error processing '{}'", path.display())),
    }
}

/// Adds context to a result from a dias-core operation on `path`
pub fn add_package_context<T>(
    result: Result<T, PackageError>,
    path: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_package_error(e, path))
}
