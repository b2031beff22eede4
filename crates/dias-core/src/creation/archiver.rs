//! Streaming tar archiver.
//!
//! Packs one directory tree into a single uncompressed tar. Entry names are
//! relative to the parent of the tree, so the tree's own directory becomes
//! the single top-level entry. The archive digest is computed on the bytes
//! as they are written.

use crate::CancellationToken;
use crate::FileRecord;
use crate::PackageError;
use crate::ProgressCallback;
use crate::Result;
use crate::creation::walker::EntryKind;
use crate::creation::walker::TreeEntry;
use crate::creation::walker::TreeListing;
use crate::creation::walker::collect_tree;
use crate::io::DigestWriter;
use crate::record::TAR_MIME_TYPE;
use crate::record::system_time_timestamp;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tar::Builder;

/// Outcome of archiving a tree.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    /// Inventory record of the finished tar.
    pub record: FileRecord,
    /// Entries written to the archive.
    pub entries_added: usize,
    /// Entries skipped because they could not be read.
    pub entries_skipped: usize,
    /// One message per skipped entry.
    pub warnings: Vec<String>,
}

/// Packs `root` into the uncompressed tar at `tar_path`.
///
/// `record_prefix` is prepended to the tar file name in the returned
/// record, e.g. `content`. Unreadable entries are skipped with a warning;
/// `cancel` is checked before every entry.
///
/// # Errors
///
/// Returns an error if the tar cannot be written, or
/// [`PackageError::Cancelled`] on cancellation.
pub fn archive_tree(
    root: &Path,
    tar_path: &Path,
    record_prefix: &str,
    cancel: &CancellationToken,
    progress: &mut dyn ProgressCallback,
) -> Result<ArchiveReport> {
    let base = root.parent().ok_or_else(|| PackageError::InvalidInput {
        field: "archive_root".to_string(),
        message: format!("{} has no parent directory", root.display()),
    })?;
    let listing = collect_tree(root, base, true);
    write_archive(&listing, tar_path, record_prefix, cancel, progress)
}

fn write_archive(
    listing: &TreeListing,
    tar_path: &Path,
    record_prefix: &str,
    cancel: &CancellationToken,
    progress: &mut dyn ProgressCallback,
) -> Result<ArchiveReport> {
    let file = File::create(tar_path).map_err(|e| PackageError::at_path(tar_path, e))?;
    let mut builder = Builder::new(DigestWriter::new(BufWriter::new(file)));

    let mut entries_added = 0;
    let mut warnings: Vec<String> = listing
        .errors
        .iter()
        .map(|e| format!("Could not read entry: {e}"))
        .collect();

    let total = listing.entries.len();
    tracing::info!(entries = total, tar = %tar_path.display(), "creating tar archive");

    for (index, entry) in listing.entries.iter().enumerate() {
        cancel.check()?;
        let name = Path::new(&entry.relative);
        progress.on_entry_start(name, total, index + 1);

        // Every source is opened or stat'ed before its header is written, so
        // a skipped entry leaves the archive consistent. Failures after that
        // point are write errors and abort the archive.
        match entry.kind {
            EntryKind::Directory => {
                if let Err(e) = fs::metadata(&entry.path) {
                    skip_entry(entry, &e, &mut warnings);
                    continue;
                }
                builder
                    .append_dir(name, &entry.path)
                    .map_err(|e| PackageError::at_path(&entry.path, e))?;
            }
            EntryKind::File => {
                let mut input = match File::open(&entry.path) {
                    Ok(input) => input,
                    Err(e) => {
                        skip_entry(entry, &e, &mut warnings);
                        continue;
                    }
                };
                builder
                    .append_file(name, &mut input)
                    .map_err(|e| PackageError::at_path(&entry.path, e))?;
                progress.on_bytes_written(entry.size);
            }
        }

        entries_added += 1;
        progress.on_entry_complete(name);
    }

    let digest_writer = builder
        .into_inner()
        .map_err(|e| PackageError::at_path(tar_path, e))?;
    let (buffered, size, checksum) = digest_writer.finish();
    let file = buffered
        .into_inner()
        .map_err(|e| PackageError::at_path(tar_path, e.into_error()))?;
    file.sync_all()
        .map_err(|e| PackageError::at_path(tar_path, e))?;
    drop(file);

    let on_disk = fs::metadata(tar_path).map_err(|e| PackageError::at_path(tar_path, e))?;
    if on_disk.len() != size {
        return Err(PackageError::InvalidArchive(format!(
            "{} is {} bytes on disk but {size} bytes were written",
            tar_path.display(),
            on_disk.len()
        )));
    }
    let created = on_disk
        .modified()
        .map_err(|e| PackageError::at_path(tar_path, e))?;

    progress.on_complete();

    let name = tar_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let record = FileRecord::new(
        format!("{record_prefix}/{name}"),
        checksum,
        size,
        system_time_timestamp(created),
        TAR_MIME_TYPE,
    );

    tracing::info!(size, entries_added, skipped = warnings.len(), "tar archive complete");
    Ok(ArchiveReport {
        record,
        entries_added,
        entries_skipped: total + listing.errors.len() - entries_added,
        warnings,
    })
}

fn skip_entry(entry: &TreeEntry, err: &std::io::Error, warnings: &mut Vec<String>) {
    tracing::warn!(path = %entry.path.display(), error = %err, "skipping entry");
    warnings.push(format!("Could not add {} to archive: {err}", entry.relative));
}
