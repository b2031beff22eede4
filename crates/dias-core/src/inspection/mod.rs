//! Read-back of assembled packages.
//!
//! - [`PackageValidator`] checks structure, metadata and (optionally)
//!   fixity and reports findings as errors, warnings and notes.
//! - [`PackageInspector`] extracts a [`PackageDescription`] for display.
//!
//! Both read the package archive through [`scan_archive`], which reads
//! every member once and rejects truncated or malformed tars.

mod archive;
mod describe;
mod validate;

pub use archive::MemberKind;
pub use archive::TarListing;
pub use archive::TarMember;
pub use archive::scan_archive;
pub use describe::ContentFile;
pub use describe::PackageDescription;
pub use describe::PackageInspector;
pub use describe::format_size;
pub use validate::PackageValidator;
pub use validate::ValidationResult;
