//! ANARCI report parsing against captured reports

use abseq_annotate::anarci::DomainReportParser;
use abseq_common::{AbseqError, FormatError};
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("anarci")
}

#[test]
fn test_parse_heavy_chain_report() {
    let regions = DomainReportParser::new()
        .parse_file(&fixture_path().join("heavy_single_domain.txt"))
        .expect("Failed to parse ANARCI report");

    assert_eq!(regions.len(), 1);
    let region = &regions[0];
    assert_eq!(region.region_count, 1);
    assert_eq!(region.species, "human");
    assert_eq!(region.chain_type, "H");
    assert_eq!(region.start_index, 0);
    assert_eq!(region.end_index, 116);
    assert_eq!(region.residue_sequence.len(), 116);
    assert_eq!(region.position_labels.len(), 116);
}

#[test]
fn test_insertion_labels_carry_suffix() {
    let regions = DomainReportParser::new()
        .parse_file(&fixture_path().join("heavy_single_domain.txt"))
        .unwrap();
    let region = &regions[0];

    assert_eq!(region.position_labels[0], "1");
    assert!(region.position_labels.iter().any(|l| l == "35A"));
    assert!(region.position_labels.iter().any(|l| l == "82C"));
    assert_eq!(region.residue_at("35A"), Some("W"));
    assert!(region.ungapped_sequence().starts_with("EVQLVESGGG"));
}

#[test]
fn test_no_domain_report() {
    let regions = DomainReportParser::new()
        .parse_file(&fixture_path().join("no_domain.txt"))
        .unwrap();
    assert!(regions.is_empty());
}

#[test]
fn test_missing_report_is_io_error() {
    let err = DomainReportParser::new()
        .parse_file(&fixture_path().join("does_not_exist.txt"))
        .unwrap_err();
    assert!(matches!(err, AbseqError::Io(_)));
}

#[test]
fn test_truncated_report_points_at_last_line() {
    let content = std::fs::read_to_string(fixture_path().join("heavy_single_domain.txt")).unwrap();
    let truncated: String = content
        .lines()
        .filter(|line| *line != "//")
        .map(|line| format!("{line}\n"))
        .collect();
    let last = truncated.lines().count() - 1;

    let err = DomainReportParser::new().parse_str(&truncated).unwrap_err();
    assert!(matches!(err, FormatError::InvalidFormat { .. }));
    assert_eq!(err.line(), Some(last));
}
