//! XML documents of a package.
//!
//! Write side: [`InfoDocument`] (container wrapper), [`StructuralDocument`]
//! (package inventory) and [`ProvenanceDocument`] (package and container
//! logs). Read side: [`XmlNode`], and [`metadata_from_xml`] for metadata
//! records supplied as METS or Dublin Core.

pub mod description;
pub mod dom;
pub mod mets;
pub mod premis;
pub mod writer;

pub use description::metadata_from_xml;
pub use dom::XmlNode;
pub use mets::InfoDocument;
pub use mets::StructuralDocument;
pub use mets::StructuralOutput;
pub use premis::ProvenanceDocument;
pub use writer::XmlBuilder;

/// METS namespace.
pub const METS_NS: &str = "http://www.loc.gov/METS/";
/// XLink namespace.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// XML Schema instance namespace.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// DIAS PREMIS namespace.
pub const PREMIS_NS: &str = "http://arkivverket.no/standarder/PREMIS";

/// Checksum algorithm label used in every document.
pub const CHECKSUM_TYPE: &str = "SHA-256";
