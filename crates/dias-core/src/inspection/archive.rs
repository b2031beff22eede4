//! Single-pass scan of a package tar.
//!
//! Every entry's data is read, so a truncated archive is detected even when
//! the tar headers themselves are intact.

use crate::PackageError;
use crate::Result;
use crate::io::DigestWriter;
use crate::layout::METS_XML;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

const BLOCK_SIZE: u64 = 512;
const END_MARKER_SIZE: u64 = 2 * BLOCK_SIZE;

/// Kind of a tar member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Link or special entry.
    Other,
}

/// One member of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarMember {
    /// Path inside the archive, without trailing `/`.
    pub path: String,
    /// Member kind.
    pub kind: MemberKind,
    /// Size from the header.
    pub size: u64,
    /// SHA-256 of the data, when hashing was requested.
    pub checksum: Option<String>,
}

impl TarMember {
    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path below the top-level directory, e.g. `content/a.txt` for
    /// `<pkg>/content/a.txt`.
    #[must_use]
    pub fn package_relative(&self) -> &str {
        self.path.split_once('/').map_or(&self.path, |(_, rest)| rest)
    }

    /// Returns `true` for regular files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == MemberKind::File
    }
}

/// Members of an archive plus the embedded structural document.
#[derive(Debug, Clone, Default)]
pub struct TarListing {
    /// Members in archive order.
    pub members: Vec<TarMember>,
    /// Text of the first `mets.xml` member, if present.
    pub structural_document: Option<String>,
}

impl TarListing {
    /// Regular file members.
    pub fn files(&self) -> impl Iterator<Item = &TarMember> {
        self.members.iter().filter(|m| m.is_file())
    }

    /// Directory members.
    pub fn directories(&self) -> impl Iterator<Item = &TarMember> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Directory)
    }
}

/// Reads every member of the tar at `path`.
///
/// With `hash_files`, each regular file's data is hashed.
///
/// # Errors
///
/// Returns [`PackageError::PathIo`] if the file cannot be opened and
/// [`PackageError::InvalidArchive`] if the archive is corrupted: bad
/// headers, entry data shorter than its header claims, or no end-of-archive
/// marker.
pub fn scan_archive(path: &Path, hash_files: bool) -> Result<TarListing> {
    let file = File::open(path).map_err(|e| PackageError::at_path(path, e))?;
    let file_len = file
        .metadata()
        .map_err(|e| PackageError::at_path(path, e))?
        .len();

    let mut archive = tar::Archive::new(BufReader::new(file));
    let mut listing = TarListing::default();
    let mut data_end = 0;

    for entry in archive.entries().map_err(corrupted)? {
        let mut entry = entry.map_err(corrupted)?;
        let name = entry
            .path()
            .map_err(corrupted)?
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        let entry_type = entry.header().entry_type();
        let kind = if entry_type.is_file() {
            MemberKind::File
        } else if entry_type.is_dir() {
            MemberKind::Directory
        } else {
            MemberKind::Other
        };
        let size = entry.size();
        let position = entry.raw_file_position();

        let is_structural = kind == MemberKind::File
            && listing.structural_document.is_none()
            && name.rsplit('/').next() == Some(METS_XML);

        let (read, checksum) = if is_structural {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(corrupted)?;
            let checksum = hash_files.then(|| crate::copy::sha256_bytes(&data));
            let read = data.len() as u64;
            listing.structural_document = Some(String::from_utf8_lossy(&data).into_owned());
            (read, checksum)
        } else if hash_files && kind == MemberKind::File {
            let mut sink = DigestWriter::new(io::sink());
            io::copy(&mut entry, &mut sink).map_err(corrupted)?;
            let (_, read, checksum) = sink.finish();
            (read, Some(checksum))
        } else {
            let read = io::copy(&mut entry, &mut io::sink()).map_err(corrupted)?;
            (read, None)
        };

        if read != size {
            return Err(PackageError::InvalidArchive(format!(
                "entry {name} is truncated ({read} of {size} bytes)"
            )));
        }

        data_end = position + size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        listing.members.push(TarMember {
            path: name,
            kind,
            size,
            checksum,
        });
    }

    if !listing.members.is_empty() && file_len < data_end + END_MARKER_SIZE {
        return Err(PackageError::InvalidArchive(
            "end-of-archive marker is missing".to_string(),
        ));
    }

    Ok(listing)
}

fn corrupted(err: io::Error) -> PackageError {
    PackageError::InvalidArchive(err.to_string())
}
