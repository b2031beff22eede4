//! PREMIS provenance logs.
//!
//! The same generator produces the package-level log (`premis.xml`,
//! listing every content file) and the `log.xml` files, which carry only
//! the main object, the events and the agents.

use super::CHECKSUM_TYPE;
use super::PREMIS_NS;
use super::XLINK_NS;
use super::XSI_NS;
use super::writer::XmlBuilder;
use crate::FileRecord;
use crate::PackageMetadata;
use crate::PackagerConfig;
use crate::ProvenanceAgent;
use crate::ProvenanceEvent;
use crate::ProvenanceSet;
use crate::Result;
use crate::record::now_timestamp;
use uuid::Uuid;

/// Indentation of PREMIS documents.
pub const PREMIS_INDENT: usize = 2;

const LOG_CREATED_DETAIL: &str = "Log circular created";
const LOG_CREATED_NOTE: &str = "Success to create logfile";
const FILE_LOCATION_TYPE: &str = "SIP";

/// Builder for one provenance document.
///
/// # Examples
///
/// ```
/// use dias_core::PackageMetadata;
/// use dias_core::PackagerConfig;
/// use dias_core::xml::ProvenanceDocument;
///
/// let metadata = PackageMetadata::default();
/// let config = PackagerConfig::default();
/// let xml = ProvenanceDocument::new(&metadata, &config, "package-id")
///     .with_container("container-id")
///     .render()?;
/// assert!(xml.contains("<premis:relationshipSubType>is part of</premis:relationshipSubType>"));
/// # Ok::<(), dias_core::PackageError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProvenanceDocument<'a> {
    metadata: &'a PackageMetadata,
    config: &'a PackagerConfig,
    object_id: &'a str,
    container_id: Option<&'a str>,
    files: &'a [FileRecord],
    provenance: Option<&'a ProvenanceSet>,
}

impl<'a> ProvenanceDocument<'a> {
    /// Log for object `object_id` without files, container or user provenance.
    #[must_use]
    pub const fn new(
        metadata: &'a PackageMetadata,
        config: &'a PackagerConfig,
        object_id: &'a str,
    ) -> Self {
        Self {
            metadata,
            config,
            object_id,
            container_id: None,
            files: &[],
            provenance: None,
        }
    }

    /// Marks the object as part of container `container_id`.
    #[must_use]
    pub const fn with_container(mut self, container_id: &'a str) -> Self {
        self.container_id = Some(container_id);
        self
    }

    /// Adds one file object per record.
    #[must_use]
    pub const fn with_files(mut self, files: &'a [FileRecord]) -> Self {
        self.files = files;
        self
    }

    /// Appends user-defined events and agents.
    #[must_use]
    pub const fn with_provenance(mut self, provenance: &'a ProvenanceSet) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Renders the document.
    pub fn render(&self) -> Result<String> {
        let mut xml = XmlBuilder::new(PREMIS_INDENT)?;
        xml.start(
            "premis:premis",
            &[
                ("xmlns:premis", PREMIS_NS),
                ("xmlns:xsi", XSI_NS),
                ("xmlns:xlink", XLINK_NS),
                ("xsi:schemaLocation", self.config.premis_schema_location.as_str()),
                ("version", self.config.premis_version.as_str()),
            ],
        )?;

        self.write_main_object(&mut xml)?;
        for record in self.files {
            self.write_file_object(&mut xml, record)?;
        }
        self.write_log_event(&mut xml)?;
        if let Some(provenance) = self.provenance {
            for event in &provenance.events {
                self.write_user_event(&mut xml, event)?;
            }
            for agent in &provenance.agents {
                write_agent(&mut xml, agent)?;
            }
        }

        xml.end("premis:premis")?;
        xml.finish()
    }

    fn id_type(&self) -> &str {
        &self.config.object_identifier_type
    }

    fn write_main_object(&self, xml: &mut XmlBuilder) -> Result<()> {
        let metadata = self.metadata;
        xml.start("premis:object", &[("xsi:type", "premis:file")])?;

        xml.start("premis:objectIdentifier", &[])?;
        xml.leaf("premis:objectIdentifierType", self.id_type())?;
        xml.leaf("premis:objectIdentifierValue", self.object_id)?;
        xml.end("premis:objectIdentifier")?;

        xml.start("premis:preservationLevel", &[])?;
        xml.leaf("premis:preservationLevelValue", "full")?;
        xml.end("premis:preservationLevel")?;

        let created = now_timestamp();
        let mut properties = vec![
            ("aic_object", self.container_id.unwrap_or_default()),
            ("createdate", created.as_str()),
            (
                "archivist_organization",
                metadata.field_value("archivist_organization").unwrap_or_default(),
            ),
            ("label", metadata.label.as_str()),
            ("iptype", metadata.package_type.as_str()),
        ];
        let relation_type = metadata.resolved_relation_type();
        if metadata.record_status.is_relational() {
            properties.push(("record_status", metadata.record_status.as_str()));
            if let Some(relation) = relation_type.as_deref() {
                properties.push(("relation_type", relation));
            }
            if let Some(aic) = metadata.related_container_id() {
                properties.push(("related_aic_id", aic));
            }
            if let Some(package) = metadata.related_package_id() {
                properties.push(("related_package_id", package));
            }
        }
        for (kind, value) in properties {
            xml.start("premis:significantProperties", &[])?;
            xml.leaf("premis:significantPropertiesType", kind)?;
            xml.leaf("premis:significantPropertiesValue", value)?;
            xml.end("premis:significantProperties")?;
        }

        xml.start("premis:objectCharacteristics", &[])?;
        xml.leaf("premis:compositionLevel", "0")?;
        write_format(xml, "tar")?;
        xml.end("premis:objectCharacteristics")?;

        xml.start("premis:storage", &[])?;
        xml.leaf("premis:storageMedium", &self.config.preservation_platform)?;
        xml.end("premis:storage")?;

        if let Some(container) = self.container_id {
            self.write_relationship(xml, "structural", "is part of", container)?;
        }
        let derivation = relation_type.as_deref().unwrap_or("related to");
        if let Some(aic) = metadata.related_container_id() {
            self.write_relationship(xml, "derivation", derivation, aic)?;
        }
        if let Some(package) = metadata.related_package_id() {
            self.write_relationship(xml, "derivation", derivation, package)?;
        }

        xml.end("premis:object")
    }

    fn write_file_object(&self, xml: &mut XmlBuilder, record: &FileRecord) -> Result<()> {
        xml.start("premis:object", &[("xsi:type", "premis:file")])?;

        xml.start("premis:objectIdentifier", &[])?;
        xml.leaf("premis:objectIdentifierType", self.id_type())?;
        xml.leaf(
            "premis:objectIdentifierValue",
            &format!("{}/{}", self.object_id, record.path),
        )?;
        xml.end("premis:objectIdentifier")?;

        xml.start("premis:objectCharacteristics", &[])?;
        xml.leaf("premis:compositionLevel", "0")?;
        xml.start("premis:fixity", &[])?;
        xml.leaf("premis:messageDigestAlgorithm", CHECKSUM_TYPE)?;
        xml.leaf("premis:messageDigest", &record.checksum)?;
        xml.leaf(
            "premis:messageDigestOriginator",
            &self.config.checksum_originator,
        )?;
        xml.end("premis:fixity")?;
        xml.leaf("premis:size", &record.size.to_string())?;
        write_format(xml, record.extension().as_deref().unwrap_or("unknown"))?;
        xml.end("premis:objectCharacteristics")?;

        xml.start("premis:storage", &[])?;
        xml.start("premis:contentLocation", &[])?;
        xml.leaf("premis:contentLocationType", FILE_LOCATION_TYPE)?;
        xml.leaf("premis:contentLocationValue", self.object_id)?;
        xml.end("premis:contentLocation")?;
        xml.end("premis:storage")?;

        self.write_relationship(xml, "structural", "is part of", self.object_id)?;
        xml.end("premis:object")
    }

    fn write_relationship(
        &self,
        xml: &mut XmlBuilder,
        kind: &str,
        sub_kind: &str,
        related: &str,
    ) -> Result<()> {
        xml.start("premis:relationship", &[])?;
        xml.leaf("premis:relationshipType", kind)?;
        xml.leaf("premis:relationshipSubType", sub_kind)?;
        xml.start("premis:relatedObjectIdentification", &[])?;
        xml.leaf("premis:relatedObjectIdentifierType", self.id_type())?;
        xml.leaf("premis:relatedObjectIdentifierValue", related)?;
        xml.end("premis:relatedObjectIdentification")?;
        xml.end("premis:relationship")
    }

    fn write_event_identifier(&self, xml: &mut XmlBuilder) -> Result<()> {
        xml.start("premis:eventIdentifier", &[])?;
        xml.leaf("premis:eventIdentifierType", self.id_type())?;
        xml.leaf("premis:eventIdentifierValue", &Uuid::new_v4().to_string())?;
        xml.end("premis:eventIdentifier")
    }

    fn write_linking_object(&self, xml: &mut XmlBuilder) -> Result<()> {
        xml.start("premis:linkingObjectIdentifier", &[])?;
        xml.leaf("premis:linkingObjectIdentifierType", self.id_type())?;
        xml.leaf("premis:linkingObjectIdentifierValue", self.object_id)?;
        xml.end("premis:linkingObjectIdentifier")
    }

    fn write_log_event(&self, xml: &mut XmlBuilder) -> Result<()> {
        xml.start("premis:event", &[])?;
        self.write_event_identifier(xml)?;
        xml.leaf("premis:eventType", &self.config.log_creation_event_type)?;
        xml.leaf("premis:eventDateTime", &now_timestamp())?;
        xml.leaf("premis:eventDetail", LOG_CREATED_DETAIL)?;
        write_outcome(xml, "0", LOG_CREATED_NOTE)?;

        xml.start("premis:linkingAgentIdentifier", &[])?;
        xml.leaf("premis:linkingAgentIdentifierType", self.id_type())?;
        xml.leaf("premis:linkingAgentIdentifierValue", &self.config.linking_agent)?;
        xml.end("premis:linkingAgentIdentifier")?;

        self.write_linking_object(xml)?;
        xml.end("premis:event")
    }

    fn write_user_event(&self, xml: &mut XmlBuilder, event: &ProvenanceEvent) -> Result<()> {
        let date = match event.date.trim() {
            "" => now_timestamp(),
            date => date.to_string(),
        };

        xml.start("premis:event", &[])?;
        self.write_event_identifier(xml)?;
        xml.leaf("premis:eventType", &event.event_type)?;
        xml.leaf("premis:eventDateTime", &date)?;
        xml.leaf("premis:eventDetail", &event.detail)?;
        write_outcome(xml, &event.outcome, &event.outcome_detail)?;
        self.write_linking_object(xml)?;
        xml.end("premis:event")
    }
}

fn write_format(xml: &mut XmlBuilder, name: &str) -> Result<()> {
    xml.start("premis:format", &[])?;
    xml.start("premis:formatDesignation", &[])?;
    xml.leaf("premis:formatName", name)?;
    xml.end("premis:formatDesignation")?;
    xml.end("premis:format")
}

/// The detail note is omitted when blank.
fn write_outcome(xml: &mut XmlBuilder, outcome: &str, note: &str) -> Result<()> {
    xml.start("premis:eventOutcomeInformation", &[])?;
    xml.leaf("premis:eventOutcome", outcome)?;
    if !note.trim().is_empty() {
        xml.start("premis:eventOutcomeDetail", &[])?;
        xml.leaf("premis:eventOutcomeDetailNote", note)?;
        xml.end("premis:eventOutcomeDetail")?;
    }
    xml.end("premis:eventOutcomeInformation")
}

fn write_agent(xml: &mut XmlBuilder, agent: &ProvenanceAgent) -> Result<()> {
    xml.start("premis:agent", &[])?;
    xml.start("premis:agentIdentifier", &[])?;
    xml.leaf("premis:agentIdentifierType", &agent.identifier_type)?;
    xml.leaf("premis:agentIdentifierValue", &agent.identifier_value)?;
    xml.end("premis:agentIdentifier")?;
    xml.leaf("premis:agentName", &agent.name)?;
    xml.leaf("premis:agentType", &agent.agent_type)?;
    xml.end("premis:agent")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::RecordStatus;
    use crate::xml::XmlNode;

    fn property<'a>(object: &'a XmlNode, kind: &str) -> Option<&'a str> {
        object
            .children_named("significantProperties")
            .find(|p| p.child("significantPropertiesType").is_some_and(|t| t.text == kind))
            .and_then(|p| p.child("significantPropertiesValue"))
            .map(|v| v.text.as_str())
    }

    fn relationships(object: &XmlNode) -> Vec<(String, String, String)> {
        object
            .children_named("relationship")
            .map(|r| {
                (
                    r.child("relationshipType").unwrap().text.clone(),
                    r.child("relationshipSubType").unwrap().text.clone(),
                    r.find("relatedObjectIdentifierValue").unwrap().text.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_package_log_lists_files() {
        let mut metadata = PackageMetadata {
            label: "Records".to_string(),
            ..PackageMetadata::default()
        };
        metadata.archivist.organization = Some("Archive".to_string());
        let config = PackagerConfig::default();
        let files = vec![
            FileRecord::new("content/a.PDF", "aa", 4, "t", "application/pdf"),
            FileRecord::new("content/README", "bb", 6, "t", "application/octet-stream"),
        ];

        let doc = ProvenanceDocument::new(&metadata, &config, "pkg")
            .with_files(&files)
            .render()
            .unwrap();
        assert!(doc.contains("\n  <premis:object xsi:type=\"premis:file\">"));

        let root = XmlNode::parse(&doc).unwrap();
        assert_eq!(root.attr("version"), Some("2.0"));

        let objects: Vec<_> = root.children_named("object").collect();
        assert_eq!(objects.len(), 3);
        assert_eq!(property(objects[0], "aic_object"), Some(""));
        assert_eq!(property(objects[0], "archivist_organization"), Some("Archive"));
        assert_eq!(property(objects[0], "label"), Some("Records"));
        assert_eq!(property(objects[0], "iptype"), Some("SIP"));
        assert_eq!(property(objects[0], "record_status"), None);
        assert!(relationships(objects[0]).is_empty());

        let first = objects[1];
        assert_eq!(first.find("objectIdentifierValue").unwrap().text, "pkg/content/a.PDF");
        assert_eq!(first.find("messageDigest").unwrap().text, "aa");
        assert_eq!(first.find("messageDigestOriginator").unwrap().text, "ESSArch");
        assert_eq!(first.find("size").unwrap().text, "4");
        assert_eq!(first.find("formatName").unwrap().text, "pdf");
        assert_eq!(first.find("contentLocationValue").unwrap().text, "pkg");
        assert_eq!(
            relationships(first),
            vec![("structural".into(), "is part of".into(), "pkg".into())]
        );
        assert_eq!(objects[2].find("formatName").unwrap().text, "unknown");

        let event = root.child("event").unwrap();
        assert_eq!(event.child("eventType").unwrap().text, "10000");
        assert_eq!(event.child("eventDetail").unwrap().text, "Log circular created");
        assert_eq!(
            event.find("eventOutcomeDetailNote").unwrap().text,
            "Success to create logfile"
        );
        assert_eq!(event.find("linkingAgentIdentifierValue").unwrap().text, "ESSArch");
        assert_eq!(event.find("linkingObjectIdentifierValue").unwrap().text, "pkg");
    }

    #[test]
    fn test_relation_propagates() {
        let mut metadata = PackageMetadata {
            record_status: RecordStatus::Replacement,
            ..PackageMetadata::default()
        };
        metadata.relation.related_container_id = Some("old-aic".to_string());
        metadata.relation.related_package_id = Some("old-aip".to_string());
        let config = PackagerConfig::default();

        let doc = ProvenanceDocument::new(&metadata, &config, "pkg")
            .with_container("aic")
            .render()
            .unwrap();
        let root = XmlNode::parse(&doc).unwrap();
        let object = root.child("object").unwrap();

        assert_eq!(property(object, "aic_object"), Some("aic"));
        assert_eq!(property(object, "record_status"), Some("REPLACEMENT"));
        assert_eq!(property(object, "relation_type"), Some("replaces"));
        assert_eq!(property(object, "related_aic_id"), Some("old-aic"));
        assert_eq!(property(object, "related_package_id"), Some("old-aip"));
        assert_eq!(
            relationships(object),
            vec![
                ("structural".into(), "is part of".into(), "aic".into()),
                ("derivation".into(), "replaces".into(), "old-aic".into()),
                ("derivation".into(), "replaces".into(), "old-aip".into()),
            ]
        );
    }

    #[test]
    fn test_non_relational_status_ignores_relation() {
        let mut metadata = PackageMetadata::default();
        metadata.relation.related_container_id = Some("old-aic".to_string());
        let config = PackagerConfig::default();

        let doc = ProvenanceDocument::new(&metadata, &config, "pkg").render().unwrap();
        assert!(!doc.contains("old-aic"));
        assert!(!doc.contains("derivation"));
    }

    #[test]
    fn test_user_events_and_agents() {
        let metadata = PackageMetadata::default();
        let config = PackagerConfig::default();
        let provenance = ProvenanceSet {
            events: vec![
                ProvenanceEvent {
                    detail: "Exported".to_string(),
                    date: "2024-05-01".to_string(),
                    ..ProvenanceEvent::default()
                },
                ProvenanceEvent {
                    event_type: "Migration".to_string(),
                    outcome_detail: "converted".to_string(),
                    ..ProvenanceEvent::default()
                },
            ],
            agents: vec![ProvenanceAgent {
                name: "Exporter".to_string(),
                identifier_value: "exp-1".to_string(),
                ..ProvenanceAgent::default()
            }],
        };

        let doc = ProvenanceDocument::new(&metadata, &config, "pkg")
            .with_provenance(&provenance)
            .render()
            .unwrap();
        let root = XmlNode::parse(&doc).unwrap();
        let events: Vec<_> = root.children_named("event").collect();
        assert_eq!(events.len(), 3);

        assert_eq!(events[1].child("eventType").unwrap().text, "Creation");
        assert_eq!(events[1].child("eventDateTime").unwrap().text, "2024-05-01");
        assert!(events[1].find("eventOutcomeDetail").is_none());
        assert!(events[1].child("linkingAgentIdentifier").is_none());

        assert_eq!(events[2].child("eventType").unwrap().text, "Migration");
        assert!(!events[2].child("eventDateTime").unwrap().text.is_empty());
        assert_eq!(events[2].find("eventOutcomeDetailNote").unwrap().text, "converted");

        let agent = root.child("agent").unwrap();
        assert_eq!(agent.find("agentIdentifierType").unwrap().text, "NO/RA");
        assert_eq!(agent.find("agentIdentifierValue").unwrap().text, "exp-1");
        assert_eq!(agent.child("agentName").unwrap().text, "Exporter");
        assert_eq!(agent.child("agentType").unwrap().text, "software");
    }
}
