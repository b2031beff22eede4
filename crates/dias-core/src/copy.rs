//! Chunked copy and hashing primitives.
//!
//! Every byte moved into a package passes through [`copy_with_buffer`],
//! which reads into one reusable buffer and never holds a whole file in
//! memory.

use crate::PackageError;
use crate::Result;
use crate::config::MIN_CHUNK_SIZE;
use crate::io::DigestWriter;
use std::io::Read;
use std::io::Write;
use std::io::{self};
use std::path::Path;

/// Default buffer size for hashing (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Reusable heap buffer for chunked copies.
///
/// # Examples
///
/// ```
/// use dias_core::copy::CopyBuffer;
/// use dias_core::copy::copy_with_digest;
///
/// let mut buffer = CopyBuffer::with_size(8192);
/// let mut output = Vec::new();
///
/// let (bytes, digest) = copy_with_digest(&mut &b"abc"[..], &mut output, &mut buffer)?;
/// assert_eq!(bytes, 3);
/// assert!(digest.starts_with("ba7816bf"));
/// # Ok::<(), dias_core::PackageError>(())
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Vec<u8>,
}

impl CopyBuffer {
    /// Creates a buffer of [`DEFAULT_CHUNK_SIZE`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates a buffer of `size` bytes, at least [`MIN_CHUNK_SIZE`].
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            buf: vec![0u8; size.max(MIN_CHUNK_SIZE)],
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `reader` to `writer` in buffer-sized chunks.
///
/// Interrupted reads are retried.
///
/// # Errors
///
/// Returns [`PackageError::Io`] if reading or writing fails.
#[inline]
pub fn copy_with_buffer<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PackageError::Io(e)),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;
        total += bytes_read as u64;
    }

    Ok(total)
}

/// Copies `reader` to `writer` while computing SHA-256 in the same pass.
///
/// Returns the byte count and the lowercase hex digest.
///
/// # Errors
///
/// Returns [`PackageError::Io`] if reading or writing fails.
pub fn copy_with_digest<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> Result<(u64, String)> {
    let mut digest_writer = DigestWriter::new(writer);
    copy_with_buffer(reader, &mut digest_writer, buffer)?;
    digest_writer.flush()?;
    let (_, bytes, digest) = digest_writer.finish();
    Ok((bytes, digest))
}

/// Computes the SHA-256 of everything `reader` yields.
///
/// # Errors
///
/// Returns [`PackageError::Io`] if reading fails.
pub fn sha256_reader<R: Read + ?Sized>(reader: &mut R, buffer: &mut CopyBuffer) -> Result<String> {
    let (_, digest) = copy_with_digest(reader, &mut io::sink(), buffer)?;
    Ok(digest)
}

/// Computes the SHA-256 of a file, reading `chunk_size` bytes at a time.
///
/// # Errors
///
/// Returns [`PackageError::PathIo`] if the file cannot be opened or read.
pub fn sha256_file(path: &Path, chunk_size: usize) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| PackageError::at_path(path, e))?;
    let mut buffer = CopyBuffer::with_size(chunk_size);
    sha256_reader(&mut file, &mut buffer).map_err(|e| match e {
        PackageError::Io(source) => PackageError::at_path(path, source),
        other => other,
    })
}

/// SHA-256 of an in-memory byte slice.
#[must_use]
pub fn sha256_bytes(bytes: &[u8]) -> String {
    use sha2::Digest;
    hex::encode(sha2::Sha256::digest(bytes))
}

/// Re-hashes `path` and compares with `expected`, ignoring case.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
///
/// # Examples
///
/// ```no_run
/// use dias_core::copy::verify_file_fixity;
/// use std::path::Path;
///
/// let ok = verify_file_fixity(Path::new("content/a.txt"), "9f86d081...")?;
/// # Ok::<(), dias_core::PackageError>(())
/// ```
pub fn verify_file_fixity(path: &Path, expected: &str) -> Result<bool> {
    let actual = sha256_file(path, DEFAULT_CHUNK_SIZE)?;
    Ok(actual.eq_ignore_ascii_case(expected.trim()))
}
