//! Assembly and verification of DIAS preservation packages.
//!
//! `dias-core` turns a file or directory into a container of nested
//! packages: a METS structural document and a PREMIS provenance document
//! describe the content, every file carries a SHA-256 checksum, and the
//! package tree is sealed into a tar archive. The same crate reads
//! packages back to validate and describe them.
//!
//! # Examples
//!
//! ```no_run
//! use dias_core::AssemblyRequest;
//! use dias_core::PackageAssembler;
//! use dias_core::PackageMetadata;
//! use dias_core::PackageValidator;
//! use dias_core::PackagerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metadata = PackageMetadata::from_file("metadata.toml".as_ref())?;
//! let request = AssemblyRequest::new("records/", "out/", "letters", metadata);
//!
//! let outcome = PackageAssembler::new(PackagerConfig::default()).assemble(&request);
//! println!("{}", outcome.message());
//!
//! if let Some(summary) = outcome.summary() {
//!     let result = PackageValidator::new().validate(&summary.container_dir);
//!     assert!(result.is_valid());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod copy;
pub mod creation;
pub mod error;
pub mod identity;
pub mod inspection;
pub mod io;
pub mod job;
pub mod layout;
pub mod metadata;
pub mod record;
pub mod report;
pub mod schema;
pub mod xml;

// Re-export main API types
pub use config::PackagerConfig;
pub use creation::AssemblyOutcome;
pub use creation::AssemblyRequest;
pub use creation::AssemblySummary;
pub use creation::CancellationToken;
pub use creation::PackageAssembler;
pub use creation::PreflightReport;
pub use error::PackageError;
pub use error::Result;
pub use identity::PackageIdentity;
pub use inspection::PackageDescription;
pub use inspection::PackageInspector;
pub use inspection::PackageValidator;
pub use inspection::ValidationResult;
pub use job::JobRunner;
pub use layout::PackageLayout;
pub use record::FileRecord;
pub use report::AssemblyObserver;
pub use report::LogLevel;
pub use report::NoopObserver;
pub use report::NoopProgress;
pub use report::ProgressCallback;
pub use report::TracingObserver;
pub use schema::DirectorySchemaSource;
pub use schema::SchemaSource;

// Re-export metadata model for easier access
pub use metadata::ArchivistAgents;
pub use metadata::CreatorAgents;
pub use metadata::IpOwnerAgents;
pub use metadata::PackageMetadata;
pub use metadata::PackageType;
pub use metadata::PreservationAgents;
pub use metadata::ProducerAgents;
pub use metadata::ProvenanceAgent;
pub use metadata::ProvenanceEvent;
pub use metadata::ProvenanceSet;
pub use metadata::RecordStatus;
pub use metadata::Relation;
pub use metadata::SubmitterAgents;
