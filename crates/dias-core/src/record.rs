//! File inventory records and timestamps.

use chrono::DateTime;
use chrono::Local;
use serde::Serialize;
use std::time::SystemTime;

/// MIME type used when none can be guessed.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// MIME type of the package archive.
pub const TAR_MIME_TYPE: &str = "application/x-tar";

/// Inventory entry for one file placed in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Package-relative path using `/` separators.
    pub path: String,
    /// Lowercase hex SHA-256 digest.
    pub checksum: String,
    /// Size in bytes.
    pub size: u64,
    /// ISO-8601 timestamp with local offset.
    pub created: String,
    /// MIME type.
    pub mime_type: String,
    /// Final path component.
    pub name: String,
}

impl FileRecord {
    /// Creates a record, deriving `name` from `path`.
    pub fn new(
        path: impl Into<String>,
        checksum: impl Into<String>,
        size: u64,
        created: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            checksum: checksum.into(),
            size,
            created: created.into(),
            mime_type: mime_type.into(),
            name,
        }
    }

    /// Lower-cased extension without the dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }
}

/// Guesses a MIME type from a file name.
#[must_use]
pub fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

/// Current local time as ISO-8601 with offset.
#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Local::now())
}

/// Formats a filesystem time as ISO-8601 with local offset.
#[must_use]
pub fn system_time_timestamp(time: SystemTime) -> String {
    format_timestamp(DateTime::<Local>::from(time))
}

fn format_timestamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_nested_path() {
        let record = FileRecord::new("content/docs/a.TXT", "ab", 2, "t", "text/plain");
        assert_eq!(record.name, "a.TXT");
        assert_eq!(record.extension().as_deref(), Some("txt"));
    }

    #[test]
    fn test_extension_edge_cases() {
        let hidden = FileRecord::new(".profile", "", 0, "", DEFAULT_MIME_TYPE);
        assert_eq!(hidden.extension(), None);
        let bare = FileRecord::new("content/README", "", 0, "", DEFAULT_MIME_TYPE);
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.txt"), "text/plain");
        assert_eq!(guess_mime_type("archive.tar"), TAR_MIME_TYPE);
        assert_eq!(guess_mime_type("blob.unknownext"), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_timestamp_has_offset() {
        let ts = now_timestamp();
        let parsed = DateTime::parse_from_rfc3339(&ts);
        assert!(parsed.is_ok(), "{ts}");
    }
}
