//! Package assembly orchestration.
//!
//! Stage order and the progress percentage reached at each one:
//!
//! | %      | stage                                                   |
//! |--------|---------------------------------------------------------|
//! | 0      | identifiers                                             |
//! | 5      | directory skeleton                                      |
//! | 10..40 | copy source with fixity                                 |
//! | 40     | schema copies                                           |
//! | 45     | `premis.xml`                                            |
//! | 55     | package `log.xml`                                       |
//! | 60     | `mets.xml`                                              |
//! | 70..80 | tar archive, then removal of the working tree           |
//! | 80     | container-level `log.xml`                               |
//! | 85     | `info.xml`                                              |
//! | 100    | done                                                    |

use crate::AssemblyObserver;
use crate::CancellationToken;
use crate::FileRecord;
use crate::LogLevel;
use crate::NoopObserver;
use crate::PackageError;
use crate::PackageIdentity;
use crate::PackageLayout;
use crate::PackageMetadata;
use crate::PackagerConfig;
use crate::ProvenanceSet;
use crate::Result;
use crate::copy::sha256_file;
use crate::creation::archiver::archive_tree;
use crate::creation::copier::copy_source;
use crate::creation::outcome::AssemblyOutcome;
use crate::creation::outcome::AssemblySummary;
use crate::creation::preflight;
use crate::creation::progress::StageKind;
use crate::creation::progress::StageProgress;
use crate::creation::walker::collect_tree;
use crate::job::panic_message;
use crate::layout::ADMINISTRATIVE_DIR;
use crate::layout::CONTENT_DIR;
use crate::layout::DESCRIPTIVE_DIR;
use crate::layout::LOG_XML;
use crate::layout::METS_XML;
use crate::layout::METS_XSD;
use crate::layout::PREMIS_XML;
use crate::layout::PREMIS_XSD;
use crate::record::guess_mime_type;
use crate::record::now_timestamp;
use crate::record::system_time_timestamp;
use crate::schema::DirectorySchemaSource;
use crate::schema::PROVENANCE_SCHEMA_NAME;
use crate::schema::STRUCTURAL_SCHEMA_NAME;
use crate::schema::SchemaSource;
use crate::xml::InfoDocument;
use crate::xml::ProvenanceDocument;
use crate::xml::StructuralDocument;
use std::fs;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const PREMIS_MIME_TYPE: &str = "text/xml";

/// Inputs of one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    /// File or directory to package.
    pub source: PathBuf,
    /// Directory receiving the container directory.
    pub output_dir: PathBuf,
    /// Package name; also the label when the metadata label is blank.
    pub package_name: String,
    /// Package metadata.
    pub metadata: PackageMetadata,
}

impl AssemblyRequest {
    /// Creates a request.
    pub fn new(
        source: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        package_name: impl Into<String>,
        metadata: PackageMetadata,
    ) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            package_name: package_name.into(),
            metadata,
        }
    }
}

/// Builds a DIAS package from a source and a metadata record.
///
/// [`assemble`](Self::assemble) never returns an error. Every failure is
/// reported as an [`AssemblyOutcome`] and on the observer's log.
///
/// # Examples
///
/// ```no_run
/// use dias_core::AssemblyRequest;
/// use dias_core::PackageAssembler;
/// use dias_core::PackageMetadata;
/// use dias_core::PackagerConfig;
///
/// let metadata = PackageMetadata::from_file("metadata.toml".as_ref())?;
/// let request = AssemblyRequest::new("records/", "out/", "records-2024", metadata);
///
/// let outcome = PackageAssembler::new(PackagerConfig::default()).assemble(&request);
/// println!("{}", outcome.message());
/// # Ok::<(), dias_core::PackageError>(())
/// ```
pub struct PackageAssembler {
    config: PackagerConfig,
    observer: Arc<dyn AssemblyObserver>,
    schemas: Box<dyn SchemaSource>,
    cancel: CancellationToken,
    identity: Option<PackageIdentity>,
}

impl std::fmt::Debug for PackageAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageAssembler")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl PackageAssembler {
    /// Creates an assembler that searches the default schema locations and
    /// reports to nobody.
    #[must_use]
    pub fn new(config: PackagerConfig) -> Self {
        let schemas = Box::new(DirectorySchemaSource::new(None, &config));
        Self {
            config,
            observer: Arc::new(NoopObserver),
            schemas,
            cancel: CancellationToken::new(),
            identity: None,
        }
    }

    /// Sets the progress and log observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AssemblyObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets where schema files are looked up.
    #[must_use]
    pub fn with_schema_source(mut self, schemas: Box<dyn SchemaSource>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Shares a cancellation token with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Uses fixed identifiers instead of generating fresh ones.
    #[must_use]
    pub fn with_identity(mut self, identity: PackageIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Token observed by this assembler.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Runs pre-flight checks and, if they pass, builds the package.
    pub fn assemble(&self, request: &AssemblyRequest) -> AssemblyOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("assemble", %run_id);
        let _guard = span.enter();

        let mut metadata = request.metadata.clone();
        if metadata.label.trim().is_empty() {
            metadata.label.clone_from(&request.package_name);
        }

        self.log(LogLevel::Info, "Validating inputs...");
        let report = preflight::check_all(
            &request.source,
            &request.output_dir,
            &request.package_name,
            &metadata,
            &self.config,
        );
        for info in &report.info {
            tracing::info!("{}", info.message);
        }
        for warning in &report.warnings {
            self.log(LogLevel::Warning, &warning.message);
        }
        if let Err(PackageError::Validation(errors)) = report.ensure_valid() {
            let message = format!("Validation failed:\n{}", errors.join("\n"));
            self.log(LogLevel::Error, &message);
            return AssemblyOutcome::Failed { message };
        }
        self.log(LogLevel::Info, "Validation passed");

        let kind = if request.source.is_file() { "file" } else { "directory" };
        self.log(
            LogLevel::Info,
            &format!(
                "Source {kind} size: {:.2} MB",
                preflight::source_size(&request.source) as f64 / BYTES_PER_MB
            ),
        );

        let built = match panic::catch_unwind(AssertUnwindSafe(|| self.build(request, &metadata))) {
            Ok(built) => built,
            Err(payload) => {
                let message = format!("Package creation failed: {}", panic_message(&*payload));
                self.log(LogLevel::Error, &message);
                return AssemblyOutcome::Failed { message };
            }
        };

        match built {
            Ok(summary) => {
                let outcome = AssemblyOutcome::Succeeded(Box::new(summary));
                tracing::info!("{}", outcome.message());
                outcome
            }
            Err(PackageError::Cancelled) => {
                let message = "Package creation cancelled".to_string();
                self.log(LogLevel::Warning, &message);
                AssemblyOutcome::Cancelled { message }
            }
            Err(e) => {
                self.log(LogLevel::Error, &format!("Error creating package: {e}"));
                self.log(LogLevel::Debug, &format!("{e:?}"));
                AssemblyOutcome::Failed {
                    message: format!("Package creation failed: {e}"),
                }
            }
        }
    }

    fn build(&self, request: &AssemblyRequest, metadata: &PackageMetadata) -> Result<AssemblySummary> {
        let started = Instant::now();
        let mut warnings = Vec::new();

        self.log(LogLevel::Info, "Starting DIAS package creation...");
        self.progress(0.0, "Initializing...");
        let identity = self.identity.clone().unwrap_or_else(PackageIdentity::generate);
        self.log(LogLevel::Info, &format!("AIC UUID: {}", identity.container_id()));
        self.log(LogLevel::Info, &format!("AIP/SIP UUID: {}", identity.package_id()));

        let layout = PackageLayout::new(&request.output_dir, &identity);
        let (package_provenance, container_provenance) = metadata.split_provenance();

        self.cancel.check()?;
        self.progress(5.0, "Creating directory structure...");
        for dir in layout.create_skeleton()? {
            let shown = dir.strip_prefix(&request.output_dir).unwrap_or(&dir);
            self.log(LogLevel::Debug, &format!("Created directory: {}", shown.display()));
        }

        self.cancel.check()?;
        self.progress(10.0, "Processing source files...");
        let copy = {
            let mut stage = StageProgress::new(&*self.observer, 10.0, 40.0, StageKind::Copy);
            copy_source(
                &request.source,
                &layout.working_content_dir(),
                CONTENT_DIR,
                self.config.copy_chunk_size,
                &self.cancel,
                &mut stage,
            )?
        };
        for failure in &copy.failures {
            let message = format!("Skipped {}: {}", failure.path.display(), failure.message);
            self.log(LogLevel::Warning, &message);
            warnings.push(message);
        }
        self.log(LogLevel::Info, &format!("Processed {} files", copy.records.len()));

        self.cancel.check()?;
        self.progress(40.0, "Copying schema files...");
        self.copy_schemas(&layout, &mut warnings)?;

        self.cancel.check()?;
        self.progress(45.0, "Generating package premis.xml...");
        let premis_path = layout.working_admin_dir().join(PREMIS_XML);
        let premis = ProvenanceDocument::new(metadata, &self.config, identity.sub_package_id())
            .with_files(&copy.records)
            .with_provenance(&package_provenance)
            .render()?;
        self.write_document(&premis_path, &premis, layout.container_dir())?;
        let premis_record = FileRecord::new(
            format!("{ADMINISTRATIVE_DIR}/{PREMIS_XML}"),
            sha256_file(&premis_path, self.config.hash_chunk_size)?,
            premis.len() as u64,
            now_timestamp(),
            PREMIS_MIME_TYPE,
        );

        self.cancel.check()?;
        self.progress(55.0, "Generating package log.xml...");
        self.write_log(
            &layout.working_root().join(LOG_XML),
            metadata,
            identity.sub_package_id(),
            None,
            &package_provenance,
            layout.container_dir(),
        )?;

        let inventory = self.gather_inventory(&layout.working_root(), &copy.records)?;

        self.cancel.check()?;
        self.progress(60.0, "Generating package mets.xml...");
        let mets = StructuralDocument::new(metadata, &self.config, identity.sub_package_id(), &inventory)
            .with_provenance(&premis_record)
            .render()?;
        self.write_document(
            &layout.working_root().join(METS_XML),
            &mets.xml,
            layout.container_dir(),
        )?;

        self.cancel.check()?;
        self.progress(70.0, "Creating package tar archive...");
        let archive = {
            let mut stage = StageProgress::new(&*self.observer, 70.0, 80.0, StageKind::Archive);
            archive_tree(
                &layout.working_root(),
                &layout.tar_path(),
                CONTENT_DIR,
                &self.cancel,
                &mut stage,
            )?
        };
        for warning in &archive.warnings {
            self.log(LogLevel::Warning, warning);
        }
        warnings.extend(archive.warnings.iter().cloned());
        self.log(
            LogLevel::Info,
            &format!(
                "Created: {} ({:.2} MB)",
                archive.record.name,
                archive.record.size as f64 / BYTES_PER_MB
            ),
        );

        let working_parent = layout.working_parent();
        fs::remove_dir_all(&working_parent)
            .map_err(|e| PackageError::at_path(&working_parent, e))?;
        self.log(LogLevel::Info, "Removed temporary package directory");

        self.cancel.check()?;
        self.progress(80.0, "Generating container log.xml...");
        self.write_log(
            &layout.package_log(),
            metadata,
            identity.package_id(),
            Some(identity.container_id()),
            &container_provenance,
            layout.container_dir(),
        )?;

        self.cancel.check()?;
        self.progress(85.0, "Generating info.xml...");
        let info = InfoDocument::new(metadata, &self.config, identity.package_id(), &archive.record)
            .render()?;
        self.write_document(&layout.info_xml(), &info, layout.container_dir())?;

        self.progress(100.0, "Package created successfully!");
        self.log(
            LogLevel::Success,
            &format!("Package created at: {}", layout.container_dir().display()),
        );
        self.log(
            LogLevel::Info,
            &format!(
                "Total archive size: {:.2} MB",
                archive.record.size as f64 / BYTES_PER_MB
            ),
        );

        Ok(AssemblySummary {
            container_dir: layout.container_dir().to_path_buf(),
            container_id: identity.container_id().to_string(),
            package_id: identity.package_id().to_string(),
            archive: archive.record,
            files_copied: copy.records.len(),
            bytes_copied: copy.bytes_copied,
            archive_entries: archive.entries_added,
            warnings,
            duration: started.elapsed(),
        })
    }

    fn copy_schemas(&self, layout: &PackageLayout, warnings: &mut Vec<String>) -> Result<()> {
        let targets = [
            (
                STRUCTURAL_SCHEMA_NAME,
                self.schemas.structural_schema(),
                layout.working_root().join(METS_XSD),
            ),
            (
                PROVENANCE_SCHEMA_NAME,
                self.schemas.provenance_schema(),
                layout.working_admin_dir().join(PREMIS_XSD),
            ),
        ];

        for (name, found, dest) in targets {
            let Some(src) = found else {
                let message = format!("Schema not found: {name}, skipping");
                self.log(LogLevel::Warning, &message);
                warnings.push(message);
                continue;
            };
            fs::copy(&src, &dest).map_err(|e| PackageError::at_path(&src, e))?;
            let shown = dest.file_name().map(|n| n.to_string_lossy().into_owned());
            self.log(
                LogLevel::Info,
                &format!("Copied schema: {}", shown.unwrap_or_default()),
            );
        }
        Ok(())
    }

    /// Inventory listed in `mets.xml`: schema and log files that exist,
    /// then the content files, then any descriptive metadata files.
    fn gather_inventory(&self, root: &Path, content: &[FileRecord]) -> Result<Vec<FileRecord>> {
        let mut inventory = Vec::new();
        for relative in [
            METS_XSD.to_string(),
            LOG_XML.to_string(),
            format!("{ADMINISTRATIVE_DIR}/{PREMIS_XSD}"),
        ] {
            let path = root.join(&relative);
            if path.is_file() {
                inventory.push(self.record_from_disk(&path, relative)?);
            }
        }

        inventory.extend(content.iter().cloned());

        let descriptive = root.join(DESCRIPTIVE_DIR);
        let listing = collect_tree(&descriptive, root, false);
        for file in listing.files() {
            inventory.push(self.record_from_disk(&file.path, file.relative.clone())?);
        }
        Ok(inventory)
    }

    fn record_from_disk(&self, path: &Path, relative: String) -> Result<FileRecord> {
        let meta = fs::metadata(path).map_err(|e| PackageError::at_path(path, e))?;
        let modified = meta.modified().map_err(|e| PackageError::at_path(path, e))?;
        let mime = guess_mime_type(&relative);
        Ok(FileRecord::new(
            relative,
            sha256_file(path, self.config.hash_chunk_size)?,
            meta.len(),
            system_time_timestamp(modified),
            mime,
        ))
    }

    fn write_log(
        &self,
        path: &Path,
        metadata: &PackageMetadata,
        object_id: &str,
        container_id: Option<&str>,
        provenance: &ProvenanceSet,
        container_dir: &Path,
    ) -> Result<()> {
        let mut document = ProvenanceDocument::new(metadata, &self.config, object_id)
            .with_provenance(provenance);
        if let Some(container_id) = container_id {
            document = document.with_container(container_id);
        }
        self.write_document(path, &document.render()?, container_dir)
    }

    fn write_document(&self, path: &Path, contents: &str, container_dir: &Path) -> Result<()> {
        fs::write(path, contents).map_err(|e| PackageError::at_path(path, e))?;
        let shown = path.strip_prefix(container_dir).unwrap_or(path);
        self.log(LogLevel::Info, &format!("Created: {}", shown.display()));
        Ok(())
    }

    fn progress(&self, percent: f64, status: &str) {
        tracing::debug!(percent, status, "stage");
        self.observer.on_progress(percent, status);
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info | LogLevel::Success => tracing::info!("{message}"),
        }
        self.observer.on_log(level, message);
    }
}
