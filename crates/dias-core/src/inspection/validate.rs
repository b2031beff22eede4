//! Structural validation of an assembled package.

use crate::PackageError;
use crate::PackagerConfig;
use crate::Result;
use crate::copy::sha256_file;
use crate::inspection::archive::TarListing;
use crate::inspection::archive::scan_archive;
use crate::layout::ADMINISTRATIVE_DIR;
use crate::layout::CONTENT_DIR;
use crate::layout::DESCRIPTIVE_DIR;
use crate::layout::INFO_XML;
use crate::layout::LOG_XML;
use crate::layout::METS_XML;
use crate::record::now_timestamp;
use crate::xml::CHECKSUM_TYPE;
use crate::xml::XmlNode;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

const REPORT_RULE_WIDTH: usize = 50;

/// Findings of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Problems that make the package invalid.
    pub errors: Vec<String>,
    /// Suspicious but acceptable findings.
    pub warnings: Vec<String>,
    /// Informational notes.
    pub info: Vec<String>,
    /// Files and archive members looked at.
    pub files_checked: usize,
    /// Checksums found (or, with full fixity, recomputed and matched).
    pub checksums_verified: usize,
    /// Checksums that did not match.
    pub checksums_failed: usize,
}

impl ValidationResult {
    /// A package is valid when no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records an error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Records a warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Records an informational note.
    pub fn add_info(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    /// Human-readable summary.
    ///
    /// # Examples
    ///
    /// ```
    /// use dias_core::ValidationResult;
    ///
    /// let mut result = ValidationResult::default();
    /// result.add_warning("Multiple AIP directories found: 2");
    /// let summary = result.summary();
    /// assert!(summary.contains("Validation Result: ✓ VALID"));
    /// assert!(summary.contains("  ⚠ Multiple AIP directories found: 2"));
    /// ```
    #[must_use]
    pub fn summary(&self) -> String {
        let status = if self.is_valid() {
            "✓ VALID"
        } else {
            "✗ INVALID"
        };
        let mut lines = vec![
            format!("\nValidation Result: {status}"),
            format!("Files Checked: {}", self.files_checked),
            format!("Checksums Verified: {}", self.checksums_verified),
            format!("Checksums Failed: {}", self.checksums_failed),
            format!("Errors: {}", self.errors.len()),
            format!("Warnings: {}", self.warnings.len()),
        ];

        for (title, marker, items) in [
            ("ERRORS", "✗", &self.errors),
            ("WARNINGS", "⚠", &self.warnings),
            ("INFO", "ℹ", &self.info),
        ] {
            if !items.is_empty() {
                lines.push(format!("\n{title}:"));
                lines.extend(items.iter().map(|item| format!("  {marker} {item}")));
            }
        }

        lines.join("\n")
    }

    /// Full report text: title, timestamp and summary.
    #[must_use]
    pub fn report(&self) -> String {
        [
            "DIAS Package Validation Report".to_string(),
            "=".repeat(REPORT_RULE_WIDTH),
            format!("Generated: {}", now_timestamp()),
            String::new(),
            self.summary(),
        ]
        .join("\n")
    }

    /// Writes [`report`](Self::report) to `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        fs::write(path, self.report()).map_err(|e| PackageError::at_path(path, e))?;
        tracing::info!(path = %path.display(), "validation report exported");
        Ok(())
    }
}

/// Checks the layout and metadata of an assembled package.
///
/// By default checksums in `mets.xml` are only counted. With
/// [`with_full_fixity`](Self::with_full_fixity) every archive member and
/// the archive itself are re-hashed and compared.
///
/// # Examples
///
/// ```no_run
/// use dias_core::PackageValidator;
///
/// let result = PackageValidator::new()
///     .with_full_fixity(true)
///     .validate("out/aic-uuid".as_ref());
/// println!("{}", result.summary());
/// ```
#[derive(Debug, Clone)]
pub struct PackageValidator {
    full_fixity: bool,
    hash_chunk_size: usize,
}

impl Default for PackageValidator {
    fn default() -> Self {
        Self {
            full_fixity: false,
            hash_chunk_size: PackagerConfig::default().hash_chunk_size,
        }
    }
}

impl PackageValidator {
    /// Creates a validator that counts checksums without recomputing them.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the hashing chunk size from `config`.
    #[must_use]
    pub const fn with_config(mut self, config: &PackagerConfig) -> Self {
        self.hash_chunk_size = config.hash_chunk_size;
        self
    }

    /// Enables recomputation of every recorded checksum.
    #[must_use]
    pub const fn with_full_fixity(mut self, enabled: bool) -> Self {
        self.full_fixity = enabled;
        self
    }

    /// Validates the container directory at `package_path`.
    ///
    /// Never fails: every problem becomes an error in the result.
    #[must_use]
    pub fn validate(&self, package_path: &Path) -> ValidationResult {
        let _span = tracing::info_span!("validate", path = %package_path.display()).entered();
        let mut result = ValidationResult::default();

        if !package_path.exists() {
            result.add_error(format!("Package not found: {}", package_path.display()));
            return result;
        }
        if !package_path.is_dir() {
            result.add_error(format!(
                "Package path is not a directory: {}",
                package_path.display()
            ));
            return result;
        }
        result.add_info(format!("Package location: {}", package_path.display()));

        self.check_structure(package_path, &mut result);

        tracing::info!(
            valid = result.is_valid(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validation finished"
        );
        result
    }

    fn check_structure(&self, package_path: &Path, result: &mut ValidationResult) {
        let info_path = package_path.join(INFO_XML);
        if info_path.exists() {
            result.files_checked += 1;
        } else {
            result.add_error(format!("Missing required file: {INFO_XML}"));
        }

        let info_checksum = if info_path.exists() {
            check_container_info(&info_path, result)
        } else {
            result.add_error("Missing AIC info.xml");
            None
        };

        let package_dirs = match package_directories(package_path) {
            Ok(dirs) => dirs,
            Err(e) => {
                result.add_error(format!("Cannot read package directory: {e}"));
                return;
            }
        };
        let Some(package_dir) = package_dirs.first() else {
            result.add_error("No AIP directory found");
            return;
        };
        if package_dirs.len() > 1 {
            result.add_warning(format!(
                "Multiple AIP directories found: {}",
                package_dirs.len()
            ));
        }
        result.add_info(format!("AIP UUID: {}", file_name(package_dir)));

        let log_path = package_dir.join(LOG_XML);
        if log_path.exists() {
            check_package_log(&log_path, result);
        } else {
            result.add_error("Missing AIP log.xml");
        }

        let content_dir = package_dir.join(CONTENT_DIR);
        if !content_dir.is_dir() {
            result.add_error("Missing AIP content directory");
            return;
        }

        let archives = match tar_files(&content_dir) {
            Ok(archives) => archives,
            Err(e) => {
                result.add_error(format!("Cannot read content directory: {e}"));
                return;
            }
        };
        let Some(archive) = archives.first() else {
            result.add_error("No tar archive found in content directory");
            return;
        };
        if archives.len() > 1 {
            result.add_warning(format!("Multiple tar files found: {}", archives.len()));
        }
        result.add_info(format!("SIP archive: {}", file_name(archive)));

        if self.full_fixity
            && let Some(expected) = info_checksum
        {
            self.check_archive_fixity(archive, &expected, result);
        }
        self.check_archive(archive, result);
    }

    fn check_archive_fixity(&self, archive: &Path, expected: &str, result: &mut ValidationResult) {
        match sha256_file(archive, self.hash_chunk_size) {
            Ok(actual) if actual.eq_ignore_ascii_case(expected) => {
                result.checksums_verified += 1;
                result.add_info("Archive checksum matches info.xml");
            }
            Ok(_) => {
                result.checksums_failed += 1;
                result.add_error(format!(
                    "Checksum mismatch for {} (info.xml)",
                    file_name(archive)
                ));
            }
            Err(e) => result.add_error(format!("Cannot hash archive: {e}")),
        }
    }

    fn check_archive(&self, archive: &Path, result: &mut ValidationResult) {
        let listing = match scan_archive(archive, self.full_fixity) {
            Ok(listing) => listing,
            Err(PackageError::InvalidArchive(detail)) => {
                result.add_error(format!("Tar archive is corrupted: {detail}"));
                return;
            }
            Err(e) => {
                result.add_error(format!("Error validating tar archive: {e}"));
                return;
            }
        };

        if listing.members.is_empty() {
            result.add_error("Tar archive is empty");
            return;
        }
        result.add_info(format!(
            "Tar archive contains {} items",
            listing.members.len()
        ));

        for required in [METS_XML, LOG_XML] {
            if listing.files().any(|m| m.file_name() == required) {
                result.add_info(format!("Found {required} in archive"));
            } else {
                result.add_error(format!("Missing {required} in tar archive"));
            }
        }

        if let Some(document) = &listing.structural_document {
            self.check_structural_document(document, &listing, result);
        }

        for expected in [ADMINISTRATIVE_DIR, DESCRIPTIVE_DIR, CONTENT_DIR] {
            if !listing.directories().any(|d| d.path.contains(expected)) {
                result.add_warning(format!(
                    "Expected directory '{expected}' not found in archive structure"
                ));
            }
        }

        result.files_checked += listing.members.len();
    }

    fn check_structural_document(
        &self,
        document: &str,
        listing: &TarListing,
        result: &mut ValidationResult,
    ) {
        let root = match XmlNode::parse(document) {
            Ok(root) => root,
            Err(e) => {
                result.add_error(format!("mets.xml parsing error: {e}"));
                return;
            }
        };
        if root.local_name() != "mets" {
            result.add_error("mets.xml is not a valid METS file");
            return;
        }

        match root.child("fileSec") {
            Some(file_sec) => {
                let count = file_sec.find_all("file").len();
                result.add_info(format!("mets.xml references {count} files"));
            }
            None => result.add_warning("mets.xml missing fileSec"),
        }
        if root.child("structMap").is_none() {
            result.add_warning("mets.xml missing structMap");
        }

        if self.full_fixity {
            verify_listed_checksums(&root, listing, result);
        } else {
            let found = root
                .find_all("file")
                .into_iter()
                .filter(|f| f.attr("CHECKSUM").is_some())
                .filter(|f| f.attr("CHECKSUMTYPE") == Some(CHECKSUM_TYPE))
                .count();
            result.checksums_verified += found;
            if found > 0 {
                result.add_info(format!("Found {found} checksums in mets.xml"));
            }
        }
    }
}

/// Parses `info.xml`, records findings, returns the archive checksum.
fn check_container_info(path: &Path, result: &mut ValidationResult) -> Option<String> {
    let root = match fs::read_to_string(path)
        .map_err(|e| PackageError::at_path(path, e))
        .and_then(|text| XmlNode::parse(&text))
    {
        Ok(root) => root,
        Err(e) => {
            result.add_error(format!("info.xml parsing error: {e}"));
            return None;
        }
    };

    if root.local_name() != "mets" {
        result.add_error("info.xml is not a valid METS file");
        return None;
    }

    match root.child("metsHdr") {
        Some(header) => {
            let agents = header.children_named("agent").count();
            if agents == 0 {
                result.add_warning("info.xml has no agents defined");
            } else {
                result.add_info(format!("Found {agents} agents in info.xml"));
            }
        }
        None => result.add_error("info.xml missing metsHdr"),
    }

    let file_sec = root.child("fileSec");
    if let Some(file_sec) = file_sec {
        let count = file_sec.find_all("file").len();
        result.add_info(format!("info.xml references {count} files"));
    }
    result.files_checked += 1;

    file_sec
        .and_then(|sec| sec.find("file"))
        .and_then(|file| file.attr("CHECKSUM"))
        .map(str::to_string)
}

fn check_package_log(path: &Path, result: &mut ValidationResult) {
    let parsed = fs::read_to_string(path)
        .map_err(|e| PackageError::at_path(path, e))
        .and_then(|text| XmlNode::parse(&text));
    match parsed {
        Ok(root) if root.local_name() == "premis" => result.files_checked += 1,
        Ok(_) => result.add_error("log.xml is not a valid PREMIS file"),
        Err(e) => result.add_error(format!("log.xml parsing error: {e}")),
    }
}

/// Recomputes every checksum listed in `mets.xml` against the archive
/// members.
fn verify_listed_checksums(root: &XmlNode, listing: &TarListing, result: &mut ValidationResult) {
    let actual: HashMap<&str, &str> = listing
        .files()
        .filter_map(|m| Some((m.package_relative(), m.checksum.as_deref()?)))
        .collect();

    let files = root.find_all("file").into_iter().filter_map(|file| {
        let href = file.child("FLocat")?.attr("href")?;
        Some((href, file.attr("CHECKSUMTYPE"), file.attr("CHECKSUM")?))
    });
    let references = root.find_all("mdRef").into_iter().filter_map(|md_ref| {
        Some((
            md_ref.attr("href")?,
            md_ref.attr("CHECKSUMTYPE"),
            md_ref.attr("CHECKSUM")?,
        ))
    });

    let mut verified = 0;
    for (href, kind, expected) in files.chain(references) {
        if kind != Some(CHECKSUM_TYPE) {
            continue;
        }
        let path = href.strip_prefix("file:").unwrap_or(href);
        match actual.get(path) {
            Some(found) if found.eq_ignore_ascii_case(expected) => verified += 1,
            Some(_) => {
                result.checksums_failed += 1;
                result.add_error(format!("Checksum mismatch for {path}"));
            }
            None => {
                result.checksums_failed += 1;
                result.add_error(format!("File listed in mets.xml not found in archive: {path}"));
            }
        }
    }

    result.checksums_verified += verified;
    result.add_info(format!("Verified {verified} checksums in mets.xml"));
}

/// Subdirectories of the container, sorted by name.
fn package_directories(container: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(container)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn tar_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut tars: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tar"))
        .collect();
    tars.sort();
    Ok(tars)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
