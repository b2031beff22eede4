//! Document generation is deterministic apart from identifiers and clocks.
//!
//! Each generator renders the same input twice. Generated `ID`/`FILEID`
//! attributes, creation dates, event identifiers and event times are masked;
//! everything else must match element for element.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use dias_core::FileRecord;
use dias_core::PackageMetadata;
use dias_core::PackagerConfig;
use dias_core::ProvenanceAgent;
use dias_core::ProvenanceEvent;
use dias_core::RecordStatus;
use dias_core::xml::InfoDocument;
use dias_core::xml::ProvenanceDocument;
use dias_core::xml::StructuralDocument;
use dias_core::xml::XmlNode;

const MASK: &str = "*";
const VOLATILE_ATTRS: [&str; 3] = ["ID", "FILEID", "CREATEDATE"];
const VOLATILE_TEXT: [&str; 2] = ["eventIdentifierValue", "eventDateTime"];

fn metadata() -> PackageMetadata {
    let mut metadata = PackageMetadata {
        label: "Parish registers".to_string(),
        record_status: RecordStatus::Supplement,
        submission_agreement: Some("SA-2025-03".to_string()),
        start_date: Some("1850-01-01".to_string()),
        end_date: Some("1900-12-31".to_string()),
        ..PackageMetadata::default()
    };
    metadata.archivist.organization = Some("Regional Archive".to_string());
    metadata.archivist.software_name = Some("Registry".to_string());
    metadata.creator.organization = Some("Parish".to_string());
    metadata.submitter.individual = Some("Kim".to_string());
    metadata.relation.related_container_id = Some("aic-41".to_string());
    metadata.events.push(ProvenanceEvent {
        detail: "Digitised".to_string(),
        ..ProvenanceEvent::default()
    });
    metadata.agents.push(ProvenanceAgent {
        name: "Scanner".to_string(),
        identifier_value: "scan-1".to_string(),
        ..ProvenanceAgent::default()
    });
    metadata
}

fn files() -> Vec<FileRecord> {
    vec![
        FileRecord::new("content/a.txt", "11".repeat(32), 3, "2025-01-01T00:00:00+00:00", "text/plain"),
        FileRecord::new("content/b/c.pdf", "22".repeat(32), 9, "2025-01-02T00:00:00+00:00", "application/pdf"),
    ]
}

/// Parses `xml` and blanks every value that legitimately changes per run.
fn masked(xml: &str) -> XmlNode {
    let mut root = XmlNode::parse(xml).unwrap();
    mask(&mut root);
    root
}

fn mask(node: &mut XmlNode) {
    for (key, value) in &mut node.attrs {
        if VOLATILE_ATTRS.contains(&key.as_str()) {
            *value = MASK.to_string();
        }
    }
    if VOLATILE_TEXT.contains(&node.local_name()) {
        node.text = MASK.to_string();
    }
    let is_createdate = node.local_name() == "significantProperties"
        && node
            .child("significantPropertiesType")
            .is_some_and(|t| t.text == "createdate");
    for child in &mut node.children {
        if is_createdate && child.local_name() == "significantPropertiesValue" {
            child.text = MASK.to_string();
        }
        mask(child);
    }
}

fn assert_stable(first: &str, second: &str) {
    assert_ne!(first, second, "identifiers should differ between renders");
    assert_eq!(first.lines().count(), second.lines().count());
    assert_eq!(masked(first), masked(second));
}

#[test]
fn test_info_document_is_deterministic() {
    let metadata = metadata();
    let config = PackagerConfig::default();
    let archive = FileRecord::new("content/p.tar", "ab".repeat(32), 4096, "t", "application/x-tar");
    let render = || {
        InfoDocument::new(&metadata, &config, "pkg-1", &archive)
            .render()
            .unwrap()
    };
    assert_stable(&render(), &render());
}

#[test]
fn test_structural_document_is_deterministic() {
    let metadata = metadata();
    let config = PackagerConfig::default();
    let files = files();
    let premis = FileRecord::new("administrative_metadata/premis.xml", "33".repeat(32), 5, "t", "text/xml");
    let render = || {
        StructuralDocument::new(&metadata, &config, "sub-1", &files)
            .with_provenance(&premis)
            .render()
            .unwrap()
            .xml
    };
    assert_stable(&render(), &render());
}

#[test]
fn test_provenance_document_is_deterministic() {
    let metadata = metadata();
    let config = PackagerConfig::default();
    let files = files();
    let (package_set, _) = metadata.split_provenance();
    let render = || {
        ProvenanceDocument::new(&metadata, &config, "sub-1")
            .with_files(&files)
            .with_provenance(&package_set)
            .with_container("pkg-1")
            .render()
            .unwrap()
    };
    let first = render();
    let second = render();
    assert_stable(&first, &second);

    let root = masked(&first);
    assert_eq!(root.find_all("eventIdentifierValue").len(), 2);
    assert!(root.find_all("eventDateTime").iter().all(|n| n.text == MASK));
}
