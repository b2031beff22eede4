//! On-disk package layout.
//!
//! ```text
//! <container>/
//!   info.xml
//!   <package>/
//!     log.xml
//!     administrative_metadata/repository_operations/
//!     descriptive_metadata/
//!     content/
//!       <package>.tar
//!       <package>/<package>/      working tree, removed after archiving
//!         mets.xml  mets.xsd  log.xml
//!         administrative_metadata/{premis.xml, DIAS_PREMIS.xsd}
//!         content/
//!         descriptive_metadata/
//! ```

use crate::PackageError;
use crate::PackageIdentity;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

/// Container wrapper document name.
pub const INFO_XML: &str = "info.xml";
/// Provenance log document name.
pub const LOG_XML: &str = "log.xml";
/// Package structural document name.
pub const METS_XML: &str = "mets.xml";
/// Structural schema copy name.
pub const METS_XSD: &str = "mets.xsd";
/// Package provenance document name.
pub const PREMIS_XML: &str = "premis.xml";
/// Provenance schema copy name.
pub const PREMIS_XSD: &str = "DIAS_PREMIS.xsd";
/// Administrative metadata directory name.
pub const ADMINISTRATIVE_DIR: &str = "administrative_metadata";
/// Descriptive metadata directory name.
pub const DESCRIPTIVE_DIR: &str = "descriptive_metadata";
/// Content directory name.
pub const CONTENT_DIR: &str = "content";
/// Repository operations directory below the package administrative area.
pub const REPOSITORY_OPERATIONS_DIR: &str = "repository_operations";

/// Paths of one package under an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    container_dir: PathBuf,
    package_id: String,
}

impl PackageLayout {
    /// Computes the layout for `identity` below `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Path, identity: &PackageIdentity) -> Self {
        Self {
            container_dir: output_dir.join(identity.container_id()),
            package_id: identity.package_id().to_string(),
        }
    }

    /// `<container>/`
    #[must_use]
    pub fn container_dir(&self) -> &Path {
        &self.container_dir
    }

    /// `<container>/info.xml`
    #[must_use]
    pub fn info_xml(&self) -> PathBuf {
        self.container_dir.join(INFO_XML)
    }

    /// `<container>/<package>/`
    #[must_use]
    pub fn package_dir(&self) -> PathBuf {
        self.container_dir.join(&self.package_id)
    }

    /// `<container>/<package>/log.xml`
    #[must_use]
    pub fn package_log(&self) -> PathBuf {
        self.package_dir().join(LOG_XML)
    }

    /// `<container>/<package>/content/`
    #[must_use]
    pub fn package_content_dir(&self) -> PathBuf {
        self.package_dir().join(CONTENT_DIR)
    }

    /// `<container>/<package>/content/<package>.tar`
    #[must_use]
    pub fn tar_path(&self) -> PathBuf {
        self.package_content_dir()
            .join(format!("{}.tar", self.package_id))
    }

    /// Directory removed once the tar exists.
    #[must_use]
    pub fn working_parent(&self) -> PathBuf {
        self.package_content_dir().join(&self.package_id)
    }

    /// Root of the tree that is packed into the tar.
    #[must_use]
    pub fn working_root(&self) -> PathBuf {
        self.working_parent().join(&self.package_id)
    }

    /// Working-tree content directory.
    #[must_use]
    pub fn working_content_dir(&self) -> PathBuf {
        self.working_root().join(CONTENT_DIR)
    }

    /// Working-tree administrative metadata directory.
    #[must_use]
    pub fn working_admin_dir(&self) -> PathBuf {
        self.working_root().join(ADMINISTRATIVE_DIR)
    }

    /// Working-tree descriptive metadata directory.
    #[must_use]
    pub fn working_descriptive_dir(&self) -> PathBuf {
        self.working_root().join(DESCRIPTIVE_DIR)
    }

    /// Creates every directory of the skeleton.
    ///
    /// Returns the created directories in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::PathIo`] naming the directory that failed.
    pub fn create_skeleton(&self) -> Result<Vec<PathBuf>> {
        let package_dir = self.package_dir();
        let dirs = vec![
            self.container_dir.clone(),
            package_dir.clone(),
            package_dir
                .join(ADMINISTRATIVE_DIR)
                .join(REPOSITORY_OPERATIONS_DIR),
            package_dir.join(DESCRIPTIVE_DIR),
            self.package_content_dir(),
            self.working_root(),
            self.working_admin_dir(),
            self.working_content_dir(),
            self.working_descriptive_dir(),
        ];

        for dir in &dirs {
            std::fs::create_dir_all(dir).map_err(|e| PackageError::at_path(dir, e))?;
        }
        Ok(dirs)
    }
}
