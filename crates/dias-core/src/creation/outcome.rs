//! Result of one assembly run.

use crate::FileRecord;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Details of a successfully assembled package.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblySummary {
    /// `<output>/<container id>`
    pub container_dir: PathBuf,
    /// Container (AIC) id.
    pub container_id: String,
    /// Package (AIP/SIP) id.
    pub package_id: String,
    /// Inventory record of the package archive.
    pub archive: FileRecord,
    /// Source files copied into the package.
    pub files_copied: usize,
    /// Source bytes copied.
    pub bytes_copied: u64,
    /// Entries written to the archive.
    pub archive_entries: usize,
    /// Non-fatal problems: skipped files, missing schemas.
    pub warnings: Vec<String>,
    /// Wall-clock time of the run.
    pub duration: Duration,
}

impl AssemblySummary {
    /// Archive size in MiB.
    #[must_use]
    pub fn archive_size_mb(&self) -> f64 {
        self.archive.size as f64 / BYTES_PER_MB
    }
}

/// Terminal state of [`PackageAssembler::assemble`].
///
/// [`PackageAssembler::assemble`]: crate::PackageAssembler::assemble
#[derive(Debug, Clone)]
pub enum AssemblyOutcome {
    /// The package is complete.
    Succeeded(Box<AssemblySummary>),
    /// Pre-flight validation or a later stage failed.
    Failed {
        /// User-facing message.
        message: String,
    },
    /// The run observed a cancellation request. Partial output is left in
    /// place.
    Cancelled {
        /// User-facing message.
        message: String,
    },
}

impl AssemblyOutcome {
    /// Returns `true` for [`AssemblyOutcome::Succeeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns `true` for [`AssemblyOutcome::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Summary of a successful run.
    #[must_use]
    pub fn summary(&self) -> Option<&AssemblySummary> {
        match self {
            Self::Succeeded(summary) => Some(summary.as_ref()),
            _ => None,
        }
    }

    /// User-facing message.
    ///
    /// # Examples
    ///
    /// ```
    /// use dias_core::AssemblyOutcome;
    ///
    /// let outcome = AssemblyOutcome::Failed {
    ///     message: "Validation failed:\nPackage name is required".into(),
    /// };
    /// assert!(!outcome.is_success());
    /// assert!(outcome.message().starts_with("Validation failed:"));
    /// ```
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Succeeded(summary) => format!(
                "DIAS package created successfully at:\n{}\nArchive size: {:.2} MB",
                summary.container_dir.display(),
                summary.archive_size_mb()
            ),
            Self::Failed { message } | Self::Cancelled { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_message() {
        let summary = AssemblySummary {
            container_dir: PathBuf::from("/out/aic"),
            container_id: "aic".to_string(),
            package_id: "aip".to_string(),
            archive: FileRecord::new("content/aip.tar", "", 3 * 1024 * 1024 / 2, "", ""),
            files_copied: 1,
            bytes_copied: 1,
            archive_entries: 1,
            warnings: Vec::new(),
            duration: Duration::ZERO,
        };
        let outcome = AssemblyOutcome::Succeeded(Box::new(summary));
        assert!(outcome.is_success());
        assert_eq!(
            outcome.message(),
            "DIAS package created successfully at:\n/out/aic\nArchive size: 1.50 MB"
        );
    }

    #[test]
    fn test_cancelled_is_not_success() {
        let outcome = AssemblyOutcome::Cancelled {
            message: "Package creation cancelled".to_string(),
        };
        assert!(!outcome.is_success());
        assert!(outcome.is_cancelled());
        assert!(outcome.summary().is_none());
    }
}
