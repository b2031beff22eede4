//! Property-based tests for fixity, naming and reporting rules.
//!
//! These tests use proptest to generate arbitrary inputs and verify the
//! invariants hold across a wide range of cases.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use dias_core::PackageMetadata;
use dias_core::copy::CopyBuffer;
use dias_core::copy::copy_with_digest;
use dias_core::copy::sha256_bytes;
use dias_core::copy::verify_file_fixity;
use dias_core::creation::copy_file_with_fixity;
use dias_core::creation::preflight::check_package_name;
use dias_core::inspection::format_size;
use dias_core::xml::XmlNode;
use dias_core::xml::mets::header_agents;
use proptest::prelude::*;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

const ROLE_ORDER: [&str; 6] = [
    "ARCHIVIST",
    "CREATOR",
    "OTHER",
    "OTHER",
    "IPOWNER",
    "PRESERVATION",
];

fn optional_name() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z][A-Za-z ]{0,12}")
}

proptest! {
    /// The digest of a streamed copy equals the digest of the whole input.
    #[test]
    fn prop_copy_digest_matches_input(
        data in prop::collection::vec(any::<u8>(), 0..20_000),
        chunk in 1usize..9000,
    ) {
        let mut buffer = CopyBuffer::with_size(chunk);
        let mut out = Vec::new();
        let (size, checksum) =
            copy_with_digest(&mut Cursor::new(&data), &mut out, &mut buffer).unwrap();

        prop_assert_eq!(size, data.len() as u64);
        prop_assert_eq!(&out, &data);
        prop_assert_eq!(checksum, sha256_bytes(&data));
    }

    /// A copied file verifies against its own record and fails after any
    /// single-byte change.
    #[test]
    fn prop_copied_file_verifies(
        data in prop::collection::vec(any::<u8>(), 1..4096),
        flip in any::<prop::sample::Index>(),
    ) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let src = temp.path().join("in.bin");
        let dst = temp.path().join("out.bin");
        fs::write(&src, &data).unwrap();

        let mut buffer = CopyBuffer::new();
        let record = copy_file_with_fixity(&src, &dst, "content/in.bin", &mut buffer).unwrap();
        prop_assert!(verify_file_fixity(&dst, &record.checksum).unwrap());
        prop_assert!(verify_file_fixity(&dst, &record.checksum.to_uppercase()).unwrap());

        let mut tampered = data.clone();
        let at = flip.index(tampered.len());
        tampered[at] ^= 0x01;
        fs::write(&dst, &tampered).unwrap();
        prop_assert!(!verify_file_fixity(&dst, &record.checksum).unwrap());
    }

    /// Header agents always follow the fixed role order.
    #[test]
    fn prop_agent_order_is_fixed(
        archivist in optional_name(),
        creator in optional_name(),
        producer in optional_name(),
        submitter in optional_name(),
        ipowner in optional_name(),
        preservation in optional_name(),
    ) {
        let mut metadata = PackageMetadata::default();
        metadata.archivist.organization = archivist;
        metadata.creator.organization = creator;
        metadata.producer.organization = producer;
        metadata.submitter.organization = submitter;
        metadata.ipowner.organization = ipowner;
        metadata.preservation.organization = preservation;

        let positions: Vec<usize> = header_agents(&metadata)
            .iter()
            .map(|agent| match agent.other_role {
                Some("SUBMITTER") => 3,
                Some(_) => 2,
                None => ROLE_ORDER.iter().position(|r| *r == agent.role).unwrap(),
            })
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] <= w[1]), "{:?}", positions);
    }

    /// Larger byte counts never render with a smaller unit.
    #[test]
    fn prop_format_size_unit_monotonic(a in any::<u64>(), b in any::<u64>()) {
        let unit_rank = |s: &str| {
            ["B", "KB", "MB", "GB", "TB", "PB"]
                .iter()
                .position(|u| s.ends_with(&format!(" {u}")))
                .unwrap()
        };
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(unit_rank(&format_size(small)) <= unit_rank(&format_size(large)));
    }

    /// Names with a forbidden character are always rejected.
    #[test]
    fn prop_forbidden_name_rejected(
        prefix in "[a-z0-9_-]{0,10}",
        bad in prop::sample::select(vec!['/', '\\', ':', '*', '?', '"', '<', '>', '|']),
        suffix in "[a-z0-9_-]{0,10}",
    ) {
        let name = format!("{prefix}{bad}{suffix}");
        prop_assert!(!check_package_name(&name).is_valid());
    }

    /// Text written through the document builder parses back unchanged.
    #[test]
    fn prop_label_survives_escaping(label in "[ -~]{1,40}") {
        let mut xml = dias_core::xml::XmlBuilder::new(2).unwrap();
        xml.start("mets:mets", &[("LABEL", label.as_str())]).unwrap();
        xml.end("mets:mets").unwrap();
        let text = xml.finish().unwrap();

        let root = XmlNode::parse(&text).unwrap();
        prop_assert_eq!(root.attr("LABEL"), Some(label.as_str()));
    }
}
