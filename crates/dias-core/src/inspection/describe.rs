//! Human-readable description of an assembled package.

use crate::PackageError;
use crate::Result;
use crate::inspection::archive::scan_archive;
use crate::layout::CONTENT_DIR;
use crate::layout::INFO_XML;
use crate::layout::LOG_XML;
use crate::layout::METS_XML;
use crate::layout::METS_XSD;
use crate::layout::PREMIS_XML;
use crate::layout::PREMIS_XSD;
use crate::record::now_timestamp;
use crate::xml::XmlNode;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

const HEAVY_RULE: &str = "═";
const LIGHT_RULE: &str = "─";
const RULE_WIDTH: usize = 70;
const LISTED_CONTENT_FILES: usize = 20;
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Member names that are package metadata rather than content.
const METADATA_NAMES: [&str; 6] = [
    METS_XML,
    LOG_XML,
    PREMIS_XML,
    METS_XSD,
    PREMIS_XSD,
    "premis.xsd",
];

/// One content file found in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentFile {
    /// File name.
    pub name: String,
    /// Path inside the archive.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// Everything [`PackageInspector`] could learn about a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageDescription {
    /// Container (AIC) id, taken from the directory name.
    pub aic_uuid: String,
    /// Package (AIP) id.
    pub aip_uuid: String,
    /// Submission (SIP) id, taken from the archive name.
    pub sip_uuid: String,
    /// Package label.
    pub label: String,
    /// Package type.
    pub package_type: String,
    /// Record status.
    pub record_status: String,
    /// Creation timestamp from the METS header.
    pub create_date: String,

    /// Archivist organizations.
    pub archivist: Vec<String>,
    /// Creator organizations.
    pub creator: Vec<String>,
    /// Producer organizations.
    pub producer: Vec<String>,
    /// Submitter organizations.
    pub submitter: Vec<String>,
    /// IP owner organizations.
    pub ipowner: Vec<String>,
    /// Preservation organizations.
    pub preservation: Vec<String>,

    /// Submission agreement reference.
    pub submission_agreement: String,
    /// Start of the content period.
    pub start_date: String,
    /// End of the content period.
    pub end_date: String,

    /// Number of content files.
    pub total_files: usize,
    /// Sum of content file sizes.
    pub total_size: u64,
    /// Content files in archive order.
    pub content_files: Vec<ContentFile>,

    /// Archive file name.
    pub archive_name: String,
    /// Archive size in bytes.
    pub archive_size: u64,
    /// Archive checksum recorded in `info.xml`.
    pub archive_checksum: String,
}

impl PackageDescription {
    /// Multi-section text rendering.
    #[must_use]
    pub fn summary(&self) -> String {
        let heavy = HEAVY_RULE.repeat(RULE_WIDTH);
        let light = LIGHT_RULE.repeat(RULE_WIDTH);
        let mut lines = vec![
            heavy.clone(),
            "DIAS PACKAGE DESCRIPTION".to_string(),
            heavy.clone(),
            String::new(),
        ];

        lines.push("PACKAGE INFORMATION".to_string());
        lines.push(light.clone());
        push_field(&mut lines, "Title", &self.label);
        push_field(&mut lines, "Type", &self.package_type);
        push_field(&mut lines, "Status", &self.record_status);
        push_field(&mut lines, "Created", &self.create_date);
        lines.push(String::new());

        lines.push("IDENTIFIERS".to_string());
        lines.push(light.clone());
        push_field(&mut lines, "AIC UUID", &self.aic_uuid);
        push_field(&mut lines, "AIP UUID", &self.aip_uuid);
        push_field(&mut lines, "SIP UUID", &self.sip_uuid);
        lines.push(String::new());

        if !self.submission_agreement.is_empty()
            || !self.start_date.is_empty()
            || !self.end_date.is_empty()
        {
            lines.push("AGREEMENT & COVERAGE".to_string());
            lines.push(light.clone());
            push_field(&mut lines, "Submission Agreement", &self.submission_agreement);
            if !self.start_date.is_empty() && !self.end_date.is_empty() {
                lines.push(format!(
                    "Content Period: {} to {}",
                    self.start_date, self.end_date
                ));
            } else {
                push_field(&mut lines, "Start Date", &self.start_date);
                push_field(&mut lines, "End Date", &self.end_date);
            }
            lines.push(String::new());
        }

        let parties = [
            ("Archivist", &self.archivist),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
            ("Submitter", &self.submitter),
            ("IP Owner", &self.ipowner),
            ("Preservation", &self.preservation),
        ];
        if parties.iter().any(|(_, names)| !names.is_empty()) {
            lines.push("RESPONSIBLE PARTIES".to_string());
            lines.push(light.clone());
            for (role, names) in parties {
                if !names.is_empty() {
                    lines.push(format!("{role}: {}", names.join(", ")));
                }
            }
            lines.push(String::new());
        }

        if !self.archive_name.is_empty() {
            lines.push("ARCHIVE".to_string());
            lines.push(light.clone());
            lines.push(format!("Archive File: {}", self.archive_name));
            if self.archive_size > 0 {
                lines.push(format!("Archive Size: {}", format_size(self.archive_size)));
            }
            push_field(&mut lines, "SHA-256", &self.archive_checksum);
            lines.push(String::new());
        }

        if !self.content_files.is_empty() || self.total_files > 0 {
            lines.push("CONTENT SUMMARY".to_string());
            lines.push(light);
            lines.push(format!("Total Files: {}", self.total_files));
            if self.total_size > 0 {
                lines.push(format!("Total Size: {}", format_size(self.total_size)));
            }
            if !self.content_files.is_empty() {
                lines.push(String::new());
                lines.push("Content Files:".to_string());
                for (index, file) in self
                    .content_files
                    .iter()
                    .take(LISTED_CONTENT_FILES)
                    .enumerate()
                {
                    lines.push(format!(
                        "  {}. {} ({})",
                        index + 1,
                        file.name,
                        format_size(file.size)
                    ));
                }
                if self.content_files.len() > LISTED_CONTENT_FILES {
                    lines.push(format!(
                        "  ... and {} more files",
                        self.content_files.len() - LISTED_CONTENT_FILES
                    ));
                }
            }
            lines.push(String::new());
        }

        lines.push(heavy);
        lines.join("\n")
    }

    /// Writes the summary followed by a generation timestamp.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let text = format!("{}\n\nGenerated: {}\n", self.summary(), now_timestamp());
        fs::write(path, text).map_err(|e| PackageError::at_path(path, e))?;
        tracing::info!(path = %path.display(), "package description exported");
        Ok(())
    }
}

fn push_field(lines: &mut Vec<String>, label: &str, value: &str) {
    if !value.is_empty() {
        lines.push(format!("{label}: {value}"));
    }
}

/// Formats a byte count with two decimals in the largest fitting unit.
///
/// # Examples
///
/// ```
/// use dias_core::inspection::format_size;
///
/// assert_eq!(format_size(512), "512.00 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} PB")
}

/// Reads the metadata of an assembled package.
///
/// Missing or unreadable parts leave the corresponding fields empty; the
/// problem is logged and inspection continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageInspector;

impl PackageInspector {
    /// Creates an inspector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Describes the container directory at `package_path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::InvalidInput`] if `package_path` is not an
    /// existing directory.
    pub fn inspect(&self, package_path: &Path) -> Result<PackageDescription> {
        if !package_path.is_dir() {
            return Err(PackageError::InvalidInput {
                field: "package".to_string(),
                message: format!("not a package directory: {}", package_path.display()),
            });
        }
        let _span = tracing::info_span!("inspect", path = %package_path.display()).entered();

        let mut description = PackageDescription {
            aic_uuid: file_name(package_path),
            ..PackageDescription::default()
        };

        let info_path = package_path.join(INFO_XML);
        if info_path.exists() {
            match read_document(&info_path) {
                Ok(root) => read_container_info(&root, &mut description),
                Err(e) => tracing::warn!(error = %e, "cannot read info.xml"),
            }
        }

        if let Some(package_dir) = first_package_dir(package_path) {
            description.aip_uuid = file_name(&package_dir);
            if let Some(archive) = first_archive(&package_dir.join(CONTENT_DIR)) {
                self.read_archive(&archive, &mut description);
            }
        }

        Ok(description)
    }

    #[allow(clippy::unused_self)]
    fn read_archive(&self, archive: &Path, description: &mut PackageDescription) {
        description.archive_name = file_name(archive);
        description.archive_size = fs::metadata(archive).map(|m| m.len()).unwrap_or_default();
        description.sip_uuid = archive
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let listing = match scan_archive(archive, false) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!(error = %e, "error reading tar archive");
                return;
            }
        };

        if let Some(document) = &listing.structural_document {
            match XmlNode::parse(document) {
                Ok(root) => {
                    if description.label.is_empty() {
                        description.label = root.attr("LABEL").unwrap_or_default().to_string();
                    }
                    if description.package_type.is_empty() {
                        description.package_type =
                            root.attr("TYPE").unwrap_or_default().to_string();
                    }
                }
                Err(e) => tracing::warn!(error = %e, "cannot parse mets.xml"),
            }
        }

        let content_marker = format!("/{CONTENT_DIR}/");
        description.content_files = listing
            .files()
            .filter(|m| m.path.contains(&content_marker))
            .filter(|m| !METADATA_NAMES.contains(&m.file_name()))
            .map(|m| ContentFile {
                name: m.file_name().to_string(),
                path: m.path.clone(),
                size: m.size,
            })
            .collect();
        description.total_files = description.content_files.len();
        description.total_size = description.content_files.iter().map(|f| f.size).sum();
    }
}

fn read_document(path: &Path) -> Result<XmlNode> {
    let text = fs::read_to_string(path).map_err(|e| PackageError::at_path(path, e))?;
    XmlNode::parse(&text)
}

fn read_container_info(root: &XmlNode, description: &mut PackageDescription) {
    description.label = root.attr("LABEL").unwrap_or_default().to_string();
    description.package_type = root.attr("TYPE").unwrap_or_default().to_string();

    if let Some(header) = root.child("metsHdr") {
        description.create_date = header.attr("CREATEDATE").unwrap_or_default().to_string();
        description.record_status = header.attr("RECORDSTATUS").unwrap_or_default().to_string();

        for agent in header.children_named("agent") {
            let Some(name) = agent.child("name").map(|n| n.text.clone()) else {
                continue;
            };
            let group = match (agent.attr("ROLE"), agent.attr("OTHERROLE")) {
                (Some("ARCHIVIST"), _) => &mut description.archivist,
                (Some("CREATOR"), _) => &mut description.creator,
                (Some("OTHER"), Some("PRODUCER")) => &mut description.producer,
                (Some("OTHER"), Some("SUBMITTER")) => &mut description.submitter,
                (Some("IPOWNER"), _) => &mut description.ipowner,
                (Some("PRESERVATION"), _) => &mut description.preservation,
                _ => continue,
            };
            group.push(name);
        }

        for record in header.children_named("altRecordID") {
            let target = match record.attr("TYPE") {
                Some("SUBMISSIONAGREEMENT") => &mut description.submission_agreement,
                Some("STARTDATE") => &mut description.start_date,
                Some("ENDDATE") => &mut description.end_date,
                _ => continue,
            };
            target.clone_from(&record.text);
        }
    }

    if let Some(checksum) = root
        .child("fileSec")
        .and_then(|sec| sec.find("file"))
        .and_then(|file| file.attr("CHECKSUM"))
    {
        description.archive_checksum = checksum.to_string();
    }
}

fn first_package_dir(container: &Path) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(container)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs.into_iter().next()
}

fn first_archive(content_dir: &Path) -> Option<PathBuf> {
    let mut tars: Vec<PathBuf> = fs::read_dir(content_dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tar"))
        .collect();
    tars.sort();
    tars.into_iter().next()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
