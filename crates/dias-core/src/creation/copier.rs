//! Checksum-streaming copy of the package source.

use crate::CancellationToken;
use crate::FileRecord;
use crate::PackageError;
use crate::ProgressCallback;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_digest;
use crate::creation::walker::collect_tree;
use crate::record::guess_mime_type;
use crate::record::system_time_timestamp;
use filetime::FileTime;
use std::fs;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// A source entry that could not be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    /// Source path.
    pub path: PathBuf,
    /// Reason.
    pub message: String,
}

/// Outcome of copying a package source.
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// One record per copied file, in copy order.
    pub records: Vec<FileRecord>,
    /// Entries that were skipped.
    pub failures: Vec<CopyFailure>,
    /// Directories recreated at the destination.
    pub directories_created: usize,
    /// Total bytes copied.
    pub bytes_copied: u64,
}

impl CopyReport {
    /// Returns whether any entry was skipped.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn add_failure(&mut self, path: &Path, err: &PackageError) {
        tracing::warn!(path = %path.display(), error = %err, "skipping entry");
        self.failures.push(CopyFailure {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
}

/// Copies one file and returns its inventory record.
///
/// The digest is computed over the bytes as they are written, the source
/// permissions and access/modification times are carried over, and
/// `created` is taken from the destination's modification time after the
/// copy. `record_path` is the package-relative path stored in the record.
///
/// # Errors
///
/// Returns [`PackageError::PathIo`] naming the file that failed.
pub fn copy_file_with_fixity(
    src: &Path,
    dst: &Path,
    record_path: &str,
    buffer: &mut CopyBuffer,
) -> Result<FileRecord> {
    let mut input = fs::File::open(src).map_err(|e| PackageError::at_path(src, e))?;
    let src_meta = input.metadata().map_err(|e| PackageError::at_path(src, e))?;
    let output = fs::File::create(dst).map_err(|e| PackageError::at_path(dst, e))?;

    // A skipped file must not leave a partial copy behind: the archiver
    // would pack it without an inventory record.
    let (size, checksum) = match fill_destination(&mut input, output, &src_meta, dst, buffer) {
        Ok(copied) => copied,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(dst) {
                tracing::warn!(path = %dst.display(), error = %cleanup, "cannot remove partial copy");
            }
            return Err(e);
        }
    };

    let modified = fs::metadata(dst)
        .and_then(|m| m.modified())
        .map_err(|e| PackageError::at_path(dst, e))?;

    let record = FileRecord::new(
        record_path,
        checksum,
        size,
        system_time_timestamp(modified),
        guess_mime_type(record_path),
    );
    tracing::debug!(path = record_path, size, "copied with fixity");
    Ok(record)
}

fn fill_destination(
    input: &mut fs::File,
    output: fs::File,
    src_meta: &fs::Metadata,
    dst: &Path,
    buffer: &mut CopyBuffer,
) -> Result<(u64, String)> {
    let mut writer = BufWriter::new(output);
    let copied = copy_with_digest(input, &mut writer, buffer).map_err(|e| match e {
        PackageError::Io(source) => PackageError::at_path(dst, source),
        other => other,
    })?;
    writer.flush().map_err(|e| PackageError::at_path(dst, e))?;
    drop(writer);

    fs::set_permissions(dst, src_meta.permissions()).map_err(|e| PackageError::at_path(dst, e))?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(src_meta),
        FileTime::from_last_modification_time(src_meta),
    )
    .map_err(|e| PackageError::at_path(dst, e))?;
    Ok(copied)
}

/// Copies a file or directory tree into `content_dir`.
///
/// Record paths are `<content_prefix>/<relative path>`. For a tree every
/// directory is recreated first, empty ones included, and files follow
/// in sorted order. A file that fails is recorded in
/// [`CopyReport::failures`] and the loop continues. `cancel` is checked
/// before every entry.
///
/// # Errors
///
/// Returns [`PackageError::Cancelled`] if cancellation was requested, or
/// an I/O error if `source` cannot be inspected at all.
pub fn copy_source(
    source: &Path,
    content_dir: &Path,
    content_prefix: &str,
    chunk_size: usize,
    cancel: &CancellationToken,
    progress: &mut dyn ProgressCallback,
) -> Result<CopyReport> {
    let mut buffer = CopyBuffer::with_size(chunk_size);
    let mut report = CopyReport::default();
    let source_meta = fs::metadata(source).map_err(|e| PackageError::at_path(source, e))?;

    if source_meta.is_file() {
        cancel.check()?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PackageError::InvalidInput {
                field: "source_path".to_string(),
                message: format!("{} has no file name", source.display()),
            })?;
        let record_path = format!("{content_prefix}/{name}");
        progress.on_entry_start(Path::new(&name), 1, 1);
        match copy_file_with_fixity(source, &content_dir.join(&name), &record_path, &mut buffer) {
            Ok(record) => {
                progress.on_bytes_written(record.size);
                report.bytes_copied += record.size;
                report.records.push(record);
            }
            Err(e) if e.is_recoverable() => report.add_failure(source, &e),
            Err(e) => return Err(e),
        }
        progress.on_entry_complete(Path::new(&name));
        progress.on_complete();
        return Ok(report);
    }

    let listing = collect_tree(source, source, false);
    for error in &listing.errors {
        report.failures.push(CopyFailure {
            path: source.to_path_buf(),
            message: error.clone(),
        });
    }

    for dir in listing.directories() {
        cancel.check()?;
        let dest = content_dir.join(&dir.relative);
        match fs::create_dir_all(&dest) {
            Ok(()) => report.directories_created += 1,
            Err(e) => report.add_failure(&dir.path, &PackageError::at_path(&dest, e)),
        }
    }

    let total = listing.file_count();
    tracing::info!(files = total, "copying source tree");
    for (index, file) in listing.files().enumerate() {
        cancel.check()?;
        let relative = Path::new(&file.relative);
        progress.on_entry_start(relative, total, index + 1);

        let dest = content_dir.join(&file.relative);
        let record_path = format!("{content_prefix}/{}", file.relative);
        let copied = dest
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .map_err(|e| PackageError::at_path(&dest, e))
            .and_then(|()| copy_file_with_fixity(&file.path, &dest, &record_path, &mut buffer));

        match copied {
            Ok(record) => {
                progress.on_bytes_written(record.size);
                report.bytes_copied += record.size;
                report.records.push(record);
            }
            Err(e) if e.is_recoverable() => report.add_failure(&file.path, &e),
            Err(e) => return Err(e),
        }
        progress.on_entry_complete(relative);
    }

    progress.on_complete();
    Ok(report)
}
