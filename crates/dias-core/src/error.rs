//! Error types for package assembly and read-back operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `PackageError`.
pub type Result<T> = std::result::Result<T, PackageError>;

/// Errors that can occur while assembling or reading a package.
#[derive(Error, Debug)]
pub enum PackageError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O operation on a specific path failed.
    #[error("I/O error on {path}: {source}")]
    PathIo {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// XML could not be written or parsed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Directory traversal failed.
    #[error("directory walk failed: {0}")]
    Walk(String),

    /// Caller-supplied input was rejected.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Pre-flight validation failed; one message per error finding.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Archive is corrupted or not a tar file.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Metadata record could not be loaded.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// The operation was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A job was submitted while another one was still running.
    #[error("a job is already running")]
    JobRejected,
}

impl PackageError {
    /// Wraps an I/O error with the path that produced it.
    pub fn at_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error only affects a single file or entry.
    ///
    /// The copy and archive loops skip recoverable faults with a warning
    /// instead of aborting the whole run.
    ///
    /// # Examples
    ///
    /// ```
    /// use dias_core::PackageError;
    ///
    /// let err = PackageError::at_path("a.txt", std::io::Error::other("denied"));
    /// assert!(err.is_recoverable());
    /// assert!(!PackageError::Cancelled.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::PathIo { .. } | Self::Walk(_))
    }

    /// Returns `true` if this error is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<quick_xml::Error> for PackageError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for PackageError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<walkdir::Error> for PackageError {
    fn from(err: walkdir::Error) -> Self {
        Self::Walk(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PackageError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Xml(format!("document is not valid UTF-8: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_messages() {
        let err = PackageError::Validation(vec![
            "Label/Title is required".to_string(),
            "Package name is required".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: Label/Title is required; Package name is required"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(PackageError::Io(std::io::Error::other("x")).is_recoverable());
        assert!(PackageError::Walk("loop".into()).is_recoverable());
        assert!(!PackageError::InvalidArchive("bad".into()).is_recoverable());
        assert!(!PackageError::JobRejected.is_recoverable());
    }

    #[test]
    fn test_path_io_display() {
        let err = PackageError::at_path("/tmp/x", std::io::Error::other("boom"));
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_cancelled() {
        assert!(PackageError::Cancelled.is_cancelled());
        assert_eq!(PackageError::Cancelled.to_string(), "operation cancelled");
    }
}
