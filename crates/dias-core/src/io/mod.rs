//! I/O wrappers shared by the copier and the archiver.

pub mod digest;

pub use digest::DigestWriter;
