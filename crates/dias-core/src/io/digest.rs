//! Writer that hashes and counts everything written through it.

use sha2::Digest;
use sha2::Sha256;
use std::io::Write;

/// Wrapper writer that feeds every written byte into a SHA-256 state.
///
/// Only bytes the inner writer accepted are hashed and counted, so the
/// digest always matches what reached the destination.
///
/// # Examples
///
/// ```
/// use dias_core::io::DigestWriter;
/// use std::io::Write;
///
/// let mut writer = DigestWriter::new(Vec::new());
/// writer.write_all(b"abc")?;
///
/// let (buffer, size, digest) = writer.finish();
/// assert_eq!(buffer, b"abc");
/// assert_eq!(size, 3);
/// assert_eq!(
///     digest,
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes_written: u64,
}

impl<W> DigestWriter<W> {
    /// Creates a new digest writer.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes_written: 0,
        }
    }

    /// Number of bytes accepted so far.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the inner writer, the byte count and the lowercase hex digest.
    #[must_use]
    pub fn finish(self) -> (W, u64, String) {
        let digest = hex::encode(self.hasher.finalize());
        (self.inner, self.bytes_written, digest)
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
