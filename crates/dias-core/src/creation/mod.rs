//! Package creation.
//!
//! [`PackageAssembler`] drives the whole run. The stages it uses are public
//! so hosts can reuse them: the fixity copier, the tar archiver and the
//! pre-flight checks.

pub mod archiver;
pub mod assembler;
pub mod cancel;
pub mod copier;
pub mod outcome;
pub mod preflight;
pub mod progress;
pub mod walker;

pub use archiver::ArchiveReport;
pub use archiver::archive_tree;
pub use assembler::AssemblyRequest;
pub use assembler::PackageAssembler;
pub use cancel::CancellationToken;
pub use copier::CopyFailure;
pub use copier::CopyReport;
pub use copier::copy_file_with_fixity;
pub use copier::copy_source;
pub use outcome::AssemblyOutcome;
pub use outcome::AssemblySummary;
pub use preflight::Finding;
pub use preflight::PreflightReport;
