//! Reads a metadata record back from XML.
//!
//! Two shapes are accepted: a METS submission description (an `info.xml`
//! written by this crate qualifies) and a flat Dublin Core record whose root
//! is `dublin_core` or `metadata`. Header agents are mapped back to their
//! role group by `ROLE`, `OTHERROLE` and `TYPE`. Software agents of the
//! archivist fill name, version and format in document order.

use super::XmlNode;
use crate::PackageMetadata;
use crate::PackageType;
use crate::Result;

/// Builds a metadata record from METS or Dublin Core text.
///
/// When a field appears more than once the first occurrence wins.
///
/// # Errors
///
/// Returns an error for malformed XML or an unknown `RECORDSTATUS`.
pub fn metadata_from_xml(xml: &str) -> Result<PackageMetadata> {
    let root = XmlNode::parse(xml)?;
    let mets = if root.local_name() == "mets" {
        Some(&root)
    } else {
        root.find("mets")
    };

    let mut metadata = match mets {
        Some(mets) => from_mets(mets)?,
        None => PackageMetadata::default(),
    };
    apply_dublin_core(&root, &mut metadata);
    Ok(metadata)
}

fn from_mets(mets: &XmlNode) -> Result<PackageMetadata> {
    let mut metadata = PackageMetadata {
        package_type: mets.attr("TYPE").map(PackageType::resolve).unwrap_or_default(),
        label: mets.attr("LABEL").unwrap_or_default().trim().to_string(),
        ..PackageMetadata::default()
    };
    let Some(header) = mets.child("metsHdr") else {
        return Ok(metadata);
    };

    if let Some(status) = header.attr("RECORDSTATUS") {
        metadata.record_status = status.parse()?;
    }

    let mut software = Vec::new();
    for agent in header.children_named("agent") {
        let Some(name) = agent.child("name").and_then(text_of) else {
            continue;
        };
        let kind = upper(agent.attr("TYPE"));
        let role = upper(agent.attr("ROLE"));
        let other_role = upper(agent.attr("OTHERROLE"));

        let slot = match (role.as_str(), other_role.as_str(), kind.as_str()) {
            ("ARCHIVIST", _, "OTHER") => {
                software.push(name);
                continue;
            }
            ("ARCHIVIST", _, _) => &mut metadata.archivist.organization,
            ("CREATOR", _, _) => &mut metadata.creator.organization,
            ("OTHER", "PRODUCER", "INDIVIDUAL") => &mut metadata.producer.individual,
            ("OTHER", "PRODUCER", "OTHER") => &mut metadata.producer.software,
            ("OTHER", "PRODUCER", _) => &mut metadata.producer.organization,
            ("OTHER", "SUBMITTER", "INDIVIDUAL") => &mut metadata.submitter.individual,
            ("OTHER", "SUBMITTER", _) => &mut metadata.submitter.organization,
            ("IPOWNER", _, _) => &mut metadata.ipowner.organization,
            ("PRESERVATION", _, _) => &mut metadata.preservation.organization,
            _ => {
                tracing::debug!(%role, %other_role, "ignoring agent without a role group");
                continue;
            }
        };
        fill(slot, Some(name));
    }

    let mut software = software.into_iter();
    metadata.archivist.software_name = software.next();
    metadata.archivist.software_version = software.next();
    metadata.archivist.software_format = software.next();

    for alt in header.children_named("altRecordID") {
        let slot = match upper(alt.attr("TYPE")).as_str() {
            "SUBMISSIONAGREEMENT" => &mut metadata.submission_agreement,
            "STARTDATE" => &mut metadata.start_date,
            "ENDDATE" => &mut metadata.end_date,
            "RELATEDAIC" => &mut metadata.relation.related_container_id,
            "RELATEDPACKAGE" => &mut metadata.relation.related_package_id,
            "RELATIONTYPE" => &mut metadata.relation.relation_type,
            _ => continue,
        };
        fill(slot, text_of(alt));
    }

    Ok(metadata)
}

/// `title` becomes the label and `creator` the creator organization, unless
/// the METS header already set them.
fn apply_dublin_core(root: &XmlNode, metadata: &mut PackageMetadata) {
    let scope = if matches!(root.local_name(), "dublin_core" | "metadata") {
        Some(root)
    } else {
        root.find("xmlData")
    };
    let Some(scope) = scope else {
        return;
    };

    if metadata.label.trim().is_empty()
        && let Some(title) = scope.find("title").and_then(text_of)
    {
        metadata.label = title;
    }
    fill(
        &mut metadata.creator.organization,
        scope.find("creator").and_then(text_of),
    );
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn text_of(node: &XmlNode) -> Option<String> {
    Some(node.text.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn upper(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_ascii_uppercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FileRecord;
    use crate::PackagerConfig;
    use crate::RecordStatus;
    use crate::record::TAR_MIME_TYPE;
    use crate::xml::InfoDocument;

    fn full_metadata() -> PackageMetadata {
        let mut m = PackageMetadata {
            package_type: PackageType::Aip,
            record_status: RecordStatus::Supplement,
            label: "Municipal records".to_string(),
            submission_agreement: Some("SA-7".to_string()),
            start_date: Some("2019-01-01".to_string()),
            end_date: Some("2019-12-31".to_string()),
            ..PackageMetadata::default()
        };
        m.archivist.organization = Some("Archive".to_string());
        m.archivist.software_name = Some("Sys".to_string());
        m.archivist.software_version = Some("4.2".to_string());
        m.archivist.software_format = Some("SIARD".to_string());
        m.creator.organization = Some("Creator".to_string());
        m.producer.organization = Some("Producer Org".to_string());
        m.producer.individual = Some("Pat".to_string());
        m.producer.software = Some("Exporter".to_string());
        m.submitter.organization = Some("Submitter Org".to_string());
        m.submitter.individual = Some("Jo".to_string());
        m.ipowner.organization = Some("Owner".to_string());
        m.preservation.organization = Some("Keeper".to_string());
        m.relation.related_container_id = Some("aic-1".to_string());
        m.relation.related_package_id = Some("pkg-0".to_string());
        m.relation.relation_type = Some("supplements".to_string());
        m
    }

    #[test]
    fn test_info_document_loads_back() {
        let original = full_metadata();
        let config = PackagerConfig::default();
        let archive = FileRecord::new("content/p.tar", "cd".repeat(32), 2048, "t", TAR_MIME_TYPE);
        let xml = InfoDocument::new(&original, &config, "p", &archive)
            .render()
            .unwrap();

        let loaded = metadata_from_xml(&xml).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_partial_software_fills_in_order() {
        let xml = r#"<mets TYPE="dip" LABEL="L">
            <metsHdr RECORDSTATUS="test">
                <agent TYPE="OTHER" OTHERTYPE="SOFTWARE" ROLE="ARCHIVIST"><name>Sys</name></agent>
                <agent TYPE="ORGANIZATION" ROLE="EDITOR"><name>Ignored</name></agent>
                <agent TYPE="ORGANIZATION" ROLE="CREATOR"><name>First</name></agent>
                <agent TYPE="ORGANIZATION" ROLE="CREATOR"><name>Second</name></agent>
                <altRecordID TYPE="DELIVERYTYPE">x</altRecordID>
            </metsHdr>
        </mets>"#;
        let m = metadata_from_xml(xml).unwrap();
        assert_eq!(m.package_type, PackageType::Dip);
        assert_eq!(m.record_status, RecordStatus::Test);
        assert_eq!(m.archivist.software_name.as_deref(), Some("Sys"));
        assert_eq!(m.archivist.software_version, None);
        assert_eq!(m.creator.organization.as_deref(), Some("First"));
        assert_eq!(m.submission_agreement, None);
    }

    #[test]
    fn test_flat_dublin_core() {
        let xml = r#"<dublin_core>
            <title>Board minutes</title>
            <creator>Council</creator>
            <subject>Governance</subject>
        </dublin_core>"#;
        let m = metadata_from_xml(xml).unwrap();
        assert_eq!(m.label, "Board minutes");
        assert_eq!(m.creator.organization.as_deref(), Some("Council"));
        assert_eq!(m.package_type, PackageType::Sip);
        assert_eq!(m.record_status, RecordStatus::New);
    }

    #[test]
    fn test_dublin_core_inside_mets_fills_gaps() {
        let xml = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:dc="http://purl.org/dc/elements/1.1/">
            <mets:metsHdr RECORDSTATUS="NEW">
                <mets:agent TYPE="ORGANIZATION" ROLE="CREATOR"><mets:name>Header creator</mets:name></mets:agent>
            </mets:metsHdr>
            <mets:dmdSec ID="dmd1"><mets:mdWrap MDTYPE="DC"><mets:xmlData>
                <dc:title>From DC</dc:title>
                <dc:creator>DC creator</dc:creator>
            </mets:xmlData></mets:mdWrap></mets:dmdSec>
        </mets:mets>"#;
        let m = metadata_from_xml(xml).unwrap();
        assert_eq!(m.label, "From DC");
        assert_eq!(m.creator.organization.as_deref(), Some("Header creator"));
    }

    #[test]
    fn test_unknown_record_status_rejected() {
        let xml = r#"<mets><metsHdr RECORDSTATUS="LOST"/></mets>"#;
        assert!(metadata_from_xml(xml).is_err());
    }
}
