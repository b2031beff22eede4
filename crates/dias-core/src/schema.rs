//! Location of the bundled XML schema files.
//!
//! Packages carry a copy of the structural and provenance schemas. Where
//! those files live is up to the host application, so resolution goes
//! through [`SchemaSource`].

use crate::PackagerConfig;
use std::path::Path;
use std::path::PathBuf;

/// File name of the bundled structural (METS) schema.
pub const STRUCTURAL_SCHEMA_NAME: &str = "dias_mets.xsd";

/// File name of the bundled provenance (PREMIS) schema.
pub const PROVENANCE_SCHEMA_NAME: &str = "dias_premis.xsd";

/// Resolves schema files for a package.
///
/// `None` means the schema is unavailable; assembly then skips it with a
/// warning.
pub trait SchemaSource: Send + Sync {
    /// Path of the structural schema.
    fn structural_schema(&self) -> Option<PathBuf>;

    /// Path of the provenance schema.
    fn provenance_schema(&self) -> Option<PathBuf>;
}

/// Searches a list of directories, first match wins.
///
/// # Examples
///
/// ```
/// use dias_core::schema::DirectorySchemaSource;
/// use dias_core::schema::SchemaSource;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("dias_mets.xsd"), "<xs:schema/>")?;
///
/// let source = DirectorySchemaSource::from_dirs([dir.path()]);
/// assert!(source.structural_schema().is_some());
/// assert!(source.provenance_schema().is_none());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySchemaSource {
    search_dirs: Vec<PathBuf>,
}

impl DirectorySchemaSource {
    /// Standard search order: `explicit`, `config.schema_dir`, the
    /// executable's directory, then the current directory.
    #[must_use]
    pub fn new(explicit: Option<&Path>, config: &PackagerConfig) -> Self {
        let mut search_dirs: Vec<PathBuf> = Vec::new();
        search_dirs.extend(explicit.map(Path::to_path_buf));
        search_dirs.extend(config.schema_dir.clone());
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_dirs.push(exe_dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }
        Self { search_dirs }
    }

    /// Searches exactly `dirs`, in order.
    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            search_dirs: dirs.into_iter().map(|d| d.as_ref().to_path_buf()).collect(),
        }
    }

    /// Directories searched, in order.
    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        let found = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file());
        if found.is_none() {
            tracing::debug!(name, dirs = ?self.search_dirs, "schema not found");
        }
        found
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn structural_schema(&self) -> Option<PathBuf> {
        self.find(STRUCTURAL_SCHEMA_NAME)
    }

    fn provenance_schema(&self) -> Option<PathBuf> {
        self.find(PROVENANCE_SCHEMA_NAME)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join(STRUCTURAL_SCHEMA_NAME), "b").unwrap();
        fs::write(second.path().join(PROVENANCE_SCHEMA_NAME), "b").unwrap();
        fs::write(first.path().join(PROVENANCE_SCHEMA_NAME), "a").unwrap();

        let source = DirectorySchemaSource::from_dirs([first.path(), second.path()]);
        assert_eq!(
            source.structural_schema(),
            Some(second.path().join(STRUCTURAL_SCHEMA_NAME))
        );
        assert_eq!(
            source.provenance_schema(),
            Some(first.path().join(PROVENANCE_SCHEMA_NAME))
        );
    }

    #[test]
    fn test_search_order() {
        let explicit = tempfile::tempdir().unwrap();
        let configured = tempfile::tempdir().unwrap();
        let config = PackagerConfig::default().with_schema_dir(configured.path());

        let source = DirectorySchemaSource::new(Some(explicit.path()), &config);
        assert_eq!(source.search_dirs()[0], explicit.path());
        assert_eq!(source.search_dirs()[1], configured.path());
    }

    #[test]
    fn test_directory_named_like_schema_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(STRUCTURAL_SCHEMA_NAME)).unwrap();
        let source = DirectorySchemaSource::from_dirs([dir.path()]);
        assert!(source.structural_schema().is_none());
    }
}
