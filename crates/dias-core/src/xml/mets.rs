//! METS documents: the container wrapper `info.xml` and the package
//! inventory `mets.xml`.
//!
//! Both share the root element and the `metsHdr` block. Element and
//! attribute order is fixed by the profile.

use super::CHECKSUM_TYPE;
use super::METS_NS;
use super::XLINK_NS;
use super::XSI_NS;
use super::writer::XmlBuilder;
use crate::FileRecord;
use crate::PackageMetadata;
use crate::PackagerConfig;
use crate::Result;
use crate::identity::xml_id;
use crate::layout::INFO_XML;
use crate::layout::METS_XML;
use crate::record::TAR_MIME_TYPE;
use crate::record::now_timestamp;

/// Indentation of METS documents.
pub const METS_INDENT: usize = 4;

const FILE_GROUP_ID: &str = "fgrp001";
const AMD_SEC_ID: &str = "amdSec001";
const DIGIPROV_ID: &str = "digiprovMD001";
const PROVENANCE_HREF: &str = "file:administrative_metadata/premis.xml";

/// One `mets:agent` entry of the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetsAgent {
    /// `TYPE` attribute.
    pub agent_type: &'static str,
    /// `OTHERTYPE` attribute, if any.
    pub other_type: Option<&'static str>,
    /// `ROLE` attribute.
    pub role: &'static str,
    /// `OTHERROLE` attribute, if any.
    pub other_role: Option<&'static str>,
    /// Agent name.
    pub name: String,
}

type AgentSlot = (
    &'static str,
    &'static str,
    Option<&'static str>,
    &'static str,
    Option<&'static str>,
);

const SOFTWARE: Option<&str> = Some("SOFTWARE");
const PRODUCER: Option<&str> = Some("PRODUCER");
const SUBMITTER: Option<&str> = Some("SUBMITTER");

/// Metadata field, `TYPE`, `OTHERTYPE`, `ROLE`, `OTHERROLE`.
const AGENT_SLOTS: [AgentSlot; 12] = [
    ("archivist_organization", "ORGANIZATION", None, "ARCHIVIST", None),
    ("system_name", "OTHER", SOFTWARE, "ARCHIVIST", None),
    ("system_version", "OTHER", SOFTWARE, "ARCHIVIST", None),
    ("system_format", "OTHER", SOFTWARE, "ARCHIVIST", None),
    ("creator_organization", "ORGANIZATION", None, "CREATOR", None),
    ("producer_organization", "ORGANIZATION", None, "OTHER", PRODUCER),
    ("producer_individual", "INDIVIDUAL", None, "OTHER", PRODUCER),
    ("producer_software", "OTHER", SOFTWARE, "OTHER", PRODUCER),
    ("submitter_organization", "ORGANIZATION", None, "OTHER", SUBMITTER),
    ("submitter_individual", "INDIVIDUAL", None, "OTHER", SUBMITTER),
    ("ipowner_organization", "ORGANIZATION", None, "IPOWNER", None),
    ("preservation_organization", "ORGANIZATION", None, "PRESERVATION", None),
];

/// Header agents in profile order, one per non-blank metadata field.
///
/// # Examples
///
/// ```
/// use dias_core::PackageMetadata;
/// use dias_core::xml::mets::header_agents;
///
/// let mut metadata = PackageMetadata::default();
/// metadata.creator.organization = Some("Creator".into());
/// metadata.archivist.organization = Some("Archive".into());
///
/// let roles: Vec<_> = header_agents(&metadata).iter().map(|a| a.role).collect();
/// assert_eq!(roles, ["ARCHIVIST", "CREATOR"]);
/// ```
#[must_use]
pub fn header_agents(metadata: &PackageMetadata) -> Vec<MetsAgent> {
    AGENT_SLOTS
        .iter()
        .filter_map(|&(field, agent_type, other_type, role, other_role)| {
            metadata.field_value(field).map(|name| MetsAgent {
                agent_type,
                other_type,
                role,
                other_role,
                name: name.to_string(),
            })
        })
        .collect()
}

/// `altRecordID` entries as `(TYPE, value)` in profile order.
#[must_use]
pub fn alt_record_ids(metadata: &PackageMetadata) -> Vec<(&'static str, String)> {
    let mut ids = Vec::new();
    for (kind, field) in [
        ("SUBMISSIONAGREEMENT", "submission_agreement"),
        ("STARTDATE", "start_date"),
        ("ENDDATE", "end_date"),
    ] {
        if let Some(value) = metadata.field_value(field) {
            ids.push((kind, value.to_string()));
        }
    }

    if metadata.record_status.is_relational() {
        if let Some(aic) = metadata.related_container_id() {
            ids.push(("RELATEDAIC", aic.to_string()));
        }
        if let Some(package) = metadata.related_package_id() {
            ids.push(("RELATEDPACKAGE", package.to_string()));
        }
        if let Some(relation) = metadata.resolved_relation_type() {
            ids.push(("RELATIONTYPE", relation));
        }
    }
    ids
}

fn write_root_start(
    xml: &mut XmlBuilder,
    metadata: &PackageMetadata,
    config: &PackagerConfig,
    schema_location: &str,
    object_id: &str,
) -> Result<()> {
    let id = xml_id();
    let objid = format!("UUID:{object_id}");
    xml.start(
        "mets:mets",
        &[
            ("xmlns:mets", METS_NS),
            ("xmlns:xlink", XLINK_NS),
            ("xmlns:xsi", XSI_NS),
            ("xsi:schemaLocation", schema_location),
            ("PROFILE", config.mets_profile.as_str()),
            ("LABEL", metadata.label.as_str()),
            ("TYPE", metadata.package_type.as_str()),
            ("ID", id.as_str()),
            ("OBJID", objid.as_str()),
        ],
    )
}

fn write_header(xml: &mut XmlBuilder, metadata: &PackageMetadata, document_id: &str) -> Result<()> {
    let created = now_timestamp();
    xml.start(
        "mets:metsHdr",
        &[
            ("CREATEDATE", created.as_str()),
            ("RECORDSTATUS", metadata.record_status.as_str()),
        ],
    )?;

    for agent in header_agents(metadata) {
        let mut attrs = vec![("TYPE", agent.agent_type)];
        if let Some(other_type) = agent.other_type {
            attrs.push(("OTHERTYPE", other_type));
        }
        attrs.push(("ROLE", agent.role));
        if let Some(other_role) = agent.other_role {
            attrs.push(("OTHERROLE", other_role));
        }
        xml.start("mets:agent", &attrs)?;
        xml.leaf("mets:name", &agent.name)?;
        xml.end("mets:agent")?;
    }

    for (kind, value) in alt_record_ids(metadata) {
        xml.text_element("mets:altRecordID", &[("TYPE", kind)], &value)?;
    }

    xml.leaf("mets:metsDocumentID", document_id)?;
    xml.end("mets:metsHdr")
}

fn write_file(xml: &mut XmlBuilder, record: &FileRecord, id: &str, href: &str) -> Result<()> {
    let size = record.size.to_string();
    xml.start(
        "mets:file",
        &[
            ("MIMETYPE", record.mime_type.as_str()),
            ("CHECKSUMTYPE", CHECKSUM_TYPE),
            ("CREATED", record.created.as_str()),
            ("CHECKSUM", record.checksum.as_str()),
            ("USE", "Datafile"),
            ("ID", id),
            ("SIZE", size.as_str()),
        ],
    )?;
    xml.empty(
        "mets:FLocat",
        &[
            ("xlink:href", href),
            ("LOCTYPE", "URL"),
            ("xlink:type", "simple"),
        ],
    )?;
    xml.end("mets:file")
}

/// Container wrapper document (`info.xml`) describing the package archive.
#[derive(Debug, Clone, Copy)]
pub struct InfoDocument<'a> {
    metadata: &'a PackageMetadata,
    config: &'a PackagerConfig,
    package_id: &'a str,
    archive: &'a FileRecord,
}

impl<'a> InfoDocument<'a> {
    /// Describes the archive `archive` of package `package_id`.
    #[must_use]
    pub const fn new(
        metadata: &'a PackageMetadata,
        config: &'a PackagerConfig,
        package_id: &'a str,
        archive: &'a FileRecord,
    ) -> Self {
        Self {
            metadata,
            config,
            package_id,
            archive,
        }
    }

    /// Renders the document.
    pub fn render(&self) -> Result<String> {
        let mut xml = XmlBuilder::new(METS_INDENT)?;
        write_root_start(
            &mut xml,
            self.metadata,
            self.config,
            &self.config.mets_info_schema_location,
            self.package_id,
        )?;
        write_header(&mut xml, self.metadata, INFO_XML)?;

        let file_id = xml_id();
        let href = format!("file:{}.tar", self.package_id);
        let archive = FileRecord {
            mime_type: TAR_MIME_TYPE.to_string(),
            ..self.archive.clone()
        };
        xml.start("mets:fileSec", &[])?;
        xml.start("mets:fileGrp", &[("ID", FILE_GROUP_ID), ("USE", "FILES")])?;
        write_file(&mut xml, &archive, &file_id, &href)?;
        xml.end("mets:fileGrp")?;
        xml.end("mets:fileSec")?;

        xml.start("mets:structMap", &[])?;
        xml.start("mets:div", &[("LABEL", "Package")])?;
        xml.empty("mets:div", &[("LABEL", "Content Description")])?;
        xml.start("mets:div", &[("LABEL", "Datafiles")])?;
        xml.empty("mets:fptr", &[("FILEID", file_id.as_str())])?;
        xml.end("mets:div")?;
        xml.end("mets:div")?;
        xml.end("mets:structMap")?;

        xml.end("mets:mets")?;
        xml.finish()
    }
}

/// Rendered `mets.xml` with the identifiers it assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralOutput {
    /// Document text.
    pub xml: String,
    /// `ID` of the `mdRef` pointing at the provenance document.
    pub provenance_ref_id: String,
    /// `ID` of each `mets:file`, in inventory order.
    pub file_ids: Vec<String>,
}

/// Package inventory document (`mets.xml`).
#[derive(Debug, Clone, Copy)]
pub struct StructuralDocument<'a> {
    metadata: &'a PackageMetadata,
    config: &'a PackagerConfig,
    sub_package_id: &'a str,
    files: &'a [FileRecord],
    provenance: Option<&'a FileRecord>,
}

impl<'a> StructuralDocument<'a> {
    /// Lists `files` for sub-package `sub_package_id`.
    #[must_use]
    pub const fn new(
        metadata: &'a PackageMetadata,
        config: &'a PackagerConfig,
        sub_package_id: &'a str,
        files: &'a [FileRecord],
    ) -> Self {
        Self {
            metadata,
            config,
            sub_package_id,
            files,
            provenance: None,
        }
    }

    /// Records the fixity of the provenance document on the `mdRef`.
    #[must_use]
    pub const fn with_provenance(mut self, record: &'a FileRecord) -> Self {
        self.provenance = Some(record);
        self
    }

    /// Renders the document.
    pub fn render(&self) -> Result<StructuralOutput> {
        let mut xml = XmlBuilder::new(METS_INDENT)?;
        write_root_start(
            &mut xml,
            self.metadata,
            self.config,
            &self.config.mets_sip_schema_location,
            self.sub_package_id,
        )?;
        write_header(&mut xml, self.metadata, METS_XML)?;

        let provenance_ref_id = xml_id();
        xml.start("mets:amdSec", &[("ID", AMD_SEC_ID)])?;
        xml.start("mets:digiprovMD", &[("ID", DIGIPROV_ID)])?;
        let size = self.provenance.map(|r| r.size.to_string());
        let mut attrs = vec![("MIMETYPE", "text/xml"), ("CHECKSUMTYPE", CHECKSUM_TYPE)];
        if let (Some(record), Some(size)) = (self.provenance, size.as_deref()) {
            attrs.push(("CHECKSUM", record.checksum.as_str()));
            attrs.push(("CREATED", record.created.as_str()));
            attrs.push(("SIZE", size));
        }
        attrs.extend([
            ("MDTYPE", "PREMIS"),
            ("xlink:href", PROVENANCE_HREF),
            ("LOCTYPE", "URL"),
            ("xlink:type", "simple"),
            ("ID", provenance_ref_id.as_str()),
        ]);
        xml.empty("mets:mdRef", &attrs)?;
        xml.end("mets:digiprovMD")?;
        xml.end("mets:amdSec")?;

        let mut file_ids = Vec::with_capacity(self.files.len());
        xml.start("mets:fileSec", &[])?;
        xml.start("mets:fileGrp", &[("ID", FILE_GROUP_ID), ("USE", "FILES")])?;
        for record in self.files {
            let id = xml_id();
            write_file(&mut xml, record, &id, &format!("file:{}", record.path))?;
            file_ids.push(id);
        }
        xml.end("mets:fileGrp")?;
        xml.end("mets:fileSec")?;

        xml.start("mets:structMap", &[])?;
        xml.start("mets:div", &[("LABEL", "Package")])?;
        xml.start(
            "mets:div",
            &[("ADMID", AMD_SEC_ID), ("LABEL", "Content Description")],
        )?;
        xml.empty("mets:fptr", &[("FILEID", provenance_ref_id.as_str())])?;
        xml.end("mets:div")?;
        if file_ids.is_empty() {
            xml.empty("mets:div", &[("ADMID", AMD_SEC_ID), ("LABEL", "Datafiles")])?;
        } else {
            xml.start("mets:div", &[("ADMID", AMD_SEC_ID), ("LABEL", "Datafiles")])?;
            for id in &file_ids {
                xml.empty("mets:fptr", &[("FILEID", id.as_str())])?;
            }
            xml.end("mets:div")?;
        }
        xml.end("mets:div")?;
        xml.end("mets:structMap")?;

        xml.end("mets:mets")?;
        Ok(StructuralOutput {
            xml: xml.finish()?,
            provenance_ref_id,
            file_ids,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::RecordStatus;
    use crate::xml::XmlNode;

    fn metadata() -> PackageMetadata {
        let mut metadata = PackageMetadata {
            label: "Municipal records".to_string(),
            submission_agreement: Some("SA-1".to_string()),
            start_date: Some("2020-01-01".to_string()),
            end_date: Some("2020-12-31".to_string()),
            ..PackageMetadata::default()
        };
        metadata.archivist.organization = Some("Archive".to_string());
        metadata.archivist.software_name = Some("Sys".to_string());
        metadata.creator.organization = Some("Creator".to_string());
        metadata.producer.software = Some("Exporter".to_string());
        metadata.submitter.individual = Some("Jo".to_string());
        metadata
    }

    fn archive() -> FileRecord {
        FileRecord::new("content/pkg.tar", "ab".repeat(32), 10240, "t", TAR_MIME_TYPE)
    }

    #[test]
    fn test_agent_order_and_attributes() {
        let agents = header_agents(&metadata());
        let shape: Vec<_> = agents
            .iter()
            .map(|a| (a.agent_type, a.other_type, a.role, a.other_role, a.name.as_str()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("ORGANIZATION", None, "ARCHIVIST", None, "Archive"),
                ("OTHER", Some("SOFTWARE"), "ARCHIVIST", None, "Sys"),
                ("ORGANIZATION", None, "CREATOR", None, "Creator"),
                ("OTHER", Some("SOFTWARE"), "OTHER", Some("PRODUCER"), "Exporter"),
                ("INDIVIDUAL", None, "OTHER", Some("SUBMITTER"), "Jo"),
            ]
        );
    }

    #[test]
    fn test_blank_fields_produce_no_agents() {
        let mut metadata = PackageMetadata::default();
        metadata.creator.organization = Some("   ".to_string());
        assert!(header_agents(&metadata).is_empty());
    }

    #[test]
    fn test_relation_ids_only_for_relational_status() {
        let mut metadata = metadata();
        metadata.relation.related_container_id = Some("X".to_string());

        let kinds: Vec<_> = alt_record_ids(&metadata).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec!["SUBMISSIONAGREEMENT", "STARTDATE", "ENDDATE"]);

        metadata.record_status = RecordStatus::Supplement;
        let ids = alt_record_ids(&metadata);
        assert_eq!(&ids[3..], &[
            ("RELATEDAIC", "X".to_string()),
            ("RELATIONTYPE", "supplements".to_string()),
        ]);
    }

    #[test]
    fn test_info_document_shape() {
        let metadata = metadata();
        let config = PackagerConfig::default();
        let record = archive();
        let doc = InfoDocument::new(&metadata, &config, "pkg", &record).render().unwrap();
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<mets:mets "));

        let root = XmlNode::parse(&doc).unwrap();
        assert_eq!(root.attr("OBJID"), Some("UUID:pkg"));
        assert_eq!(root.attr("LABEL"), Some("Municipal records"));
        assert_eq!(root.attr("TYPE"), Some("SIP"));
        assert!(root.attr("ID").unwrap().starts_with("ID"));

        let header = root.child("metsHdr").unwrap();
        assert_eq!(header.attr("RECORDSTATUS"), Some("NEW"));
        assert_eq!(header.child("metsDocumentID").unwrap().text, "info.xml");

        let file = root.find("file").unwrap();
        assert_eq!(file.attr("MIMETYPE"), Some("application/x-tar"));
        assert_eq!(file.attr("CHECKSUM"), Some(record.checksum.as_str()));
        assert_eq!(file.attr("SIZE"), Some("10240"));
        assert_eq!(file.child("FLocat").unwrap().attr("href"), Some("file:pkg.tar"));

        let fptr = root.find("fptr").unwrap();
        assert_eq!(fptr.attr("FILEID"), file.attr("ID"));
    }

    #[test]
    fn test_structural_document_links_ids() {
        let metadata = metadata();
        let config = PackagerConfig::default();
        let files = vec![
            FileRecord::new("log.xml", "11", 1, "t", "application/xml"),
            FileRecord::new("content/a.txt", "22", 2, "t", "text/plain"),
        ];
        let premis = FileRecord::new("administrative_metadata/premis.xml", "33", 3, "t", "text/xml");

        let out = StructuralDocument::new(&metadata, &config, "sip", &files)
            .with_provenance(&premis)
            .render()
            .unwrap();
        assert_eq!(out.file_ids.len(), 2);

        let root = XmlNode::parse(&out.xml).unwrap();
        let children: Vec<_> = root.children.iter().map(XmlNode::local_name).collect();
        assert_eq!(children, vec!["metsHdr", "amdSec", "fileSec", "structMap"]);
        assert_eq!(root.child("metsHdr").unwrap().child("metsDocumentID").unwrap().text, "mets.xml");

        let md_ref = root.find("mdRef").unwrap();
        assert_eq!(md_ref.attr("CHECKSUM"), Some("33"));
        assert_eq!(md_ref.attr("ID"), Some(out.provenance_ref_id.as_str()));
        assert_eq!(md_ref.attr("href"), Some("file:administrative_metadata/premis.xml"));

        let hrefs: Vec<_> = root
            .find_all("FLocat")
            .into_iter()
            .filter_map(|f| f.attr("href"))
            .collect();
        assert_eq!(hrefs, vec!["file:log.xml", "file:content/a.txt"]);

        let fptrs: Vec<_> = root
            .find_all("fptr")
            .into_iter()
            .filter_map(|f| f.attr("FILEID"))
            .collect();
        assert_eq!(fptrs[0], out.provenance_ref_id);
        assert_eq!(&fptrs[1..], out.file_ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_label_is_escaped() {
        let mut metadata = metadata();
        metadata.label = "R&D <2020>".to_string();
        let config = PackagerConfig::default();
        let record = archive();
        let doc = InfoDocument::new(&metadata, &config, "pkg", &record).render().unwrap();
        assert!(doc.contains("LABEL=\"R&amp;D &lt;2020&gt;\""));
        assert_eq!(XmlNode::parse(&doc).unwrap().attr("LABEL"), Some("R&D <2020>"));
    }
}
