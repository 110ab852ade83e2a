//! ANARCI numbering report parser
//!
//! Reads the text ANARCI writes with `-o` and turns every numbered domain into a
//! [`VRegionAnnotation`].
//!
//! # Format
//! ```text
//! # anarci_query_sequence
//! # ANARCI numbered
//! # Domain 1 of 1
//! # Most significant HMM hit
//! #|species|chain_type|e-value|score|seqstart_index|seqend_index|
//! #|human|H|1.3e-53|170.9|0|117|
//! # Scheme = kabat
//! H 1       E
//! H 82 A    S
//! //
//! ```
//! A report with no domain is just the query name line followed by `//`.

use abseq_common::{FormatError, FormatResult};
use std::path::Path;
use tracing::{debug, warn};

use super::models::VRegionAnnotation;

/// Line that opens a domain block
pub const HIT_MARKER: &str = "# Most significant HMM hit";

/// Line that closes the report
const TERMINATOR: &str = "//";

/// Index of the "# Domain 1 of N" line
const DOMAIN_COUNT_LINE: usize = 2;

/// Offset from the marker to the pipe-delimited hit line
const METADATA_OFFSET: usize = 2;

/// Parser for ANARCI numbering reports
#[derive(Debug, Default, Clone, Copy)]
pub struct DomainReportParser;

impl DomainReportParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a report file written by ANARCI
    pub fn parse_file(&self, path: &Path) -> abseq_common::Result<Vec<VRegionAnnotation>> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse_str(&content)?)
    }

    /// Parse the full text of a report
    ///
    /// Returns one annotation per domain block, in report order. A two-line
    /// report means ANARCI found nothing and yields an empty vector.
    pub fn parse_str(&self, content: &str) -> FormatResult<Vec<VRegionAnnotation>> {
        let lines: Vec<&str> = content.lines().collect();

        if lines.len() == 2 {
            debug!("ANARCI report has no domain");
            return Ok(Vec::new());
        }

        let region_count = parse_region_count(&lines)?;
        let mut records = Vec::new();
        let mut state = ScanState::SeekingBlock;

        for (idx, line) in lines.iter().enumerate() {
            state = match (state, LineKind::classify(line)) {
                (state, LineKind::Blank) => state,
                (ScanState::InBlock(mut block), LineKind::Residue(tokens)) => {
                    block.push_residue(idx, &tokens)?;
                    ScanState::InBlock(block)
                },
                (ScanState::SeekingBlock, LineKind::Residue(_)) => {
                    return Err(FormatError::invalid_format(
                        idx,
                        format!("residue line outside of a domain block: '{}'", line.trim()),
                    ));
                },
                (state, kind) => {
                    let state = state.close(region_count, &mut records);
                    if kind == LineKind::Marker {
                        ScanState::InBlock(BlockAccumulator::open(read_metadata(&lines, idx)?))
                    } else {
                        state
                    }
                },
            };
        }

        if let ScanState::InBlock(block) = state {
            if block.has_residues() {
                return Err(FormatError::invalid_format(
                    lines.len().saturating_sub(1),
                    "domain block is not terminated by '#' or '//'",
                ));
            }
        }

        if records.len() != region_count as usize {
            warn!(
                announced = region_count,
                found = records.len(),
                "ANARCI domain count does not match the number of numbered blocks"
            );
        }
        debug!(domains = records.len(), "Parsed ANARCI report");

        Ok(records)
    }
}

/// Scanner state
enum ScanState {
    SeekingBlock,
    InBlock(BlockAccumulator),
}

impl ScanState {
    /// Emit the open block if it holds residues and fall back to seeking
    fn close(self, region_count: u32, records: &mut Vec<VRegionAnnotation>) -> ScanState {
        match self {
            ScanState::InBlock(block) if block.has_residues() => {
                records.push(block.finish(region_count));
                ScanState::SeekingBlock
            },
            other => other,
        }
    }
}

/// Fields taken from the `#|species|chain_type|...|start|end|` line
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockMetadata {
    species: String,
    chain_type: String,
    start_index: usize,
    end_index: usize,
}

/// State owned by the block currently being read
struct BlockAccumulator {
    metadata: BlockMetadata,
    residues: Vec<String>,
    labels: Vec<String>,
}

impl BlockAccumulator {
    fn open(metadata: BlockMetadata) -> Self {
        Self {
            metadata,
            residues: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn has_residues(&self) -> bool {
        !self.residues.is_empty()
    }

    /// Residue lines are `<chain> <position> [<insertion>] <residue>`
    fn push_residue(&mut self, line: usize, tokens: &[&str]) -> FormatResult<()> {
        let label = match tokens {
            [_, position, _] => (*position).to_string(),
            [_, position, insertion, _] => format!("{position}{insertion}"),
            _ => {
                return Err(FormatError::invalid_format(
                    line,
                    format!("expected 3 or 4 tokens on a residue line, got {}", tokens.len()),
                ))
            },
        };

        // Non-empty by the match above
        if let Some(residue) = tokens.last() {
            self.residues.push((*residue).to_string());
            self.labels.push(label);
        }
        Ok(())
    }

    fn finish(self, region_count: u32) -> VRegionAnnotation {
        VRegionAnnotation {
            region_count,
            species: self.metadata.species,
            chain_type: self.metadata.chain_type,
            start_index: self.metadata.start_index,
            end_index: self.metadata.end_index,
            residue_sequence: self.residues,
            position_labels: self.labels,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    Marker,
    Comment,
    Terminator,
    Residue(Vec<&'a str>),
}

impl<'a> LineKind<'a> {
    fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed == HIT_MARKER {
            LineKind::Marker
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else if trimmed.split_whitespace().next() == Some(TERMINATOR) {
            LineKind::Terminator
        } else {
            LineKind::Residue(trimmed.split_whitespace().collect())
        }
    }
}

/// Domain count is the last token of line 2 ("# Domain 1 of 2")
fn parse_region_count(lines: &[&str]) -> FormatResult<u32> {
    let line = lines.get(DOMAIN_COUNT_LINE).ok_or_else(|| {
        FormatError::invalid_format(
            lines.len(),
            format!("report has {} lines, expected a domain count on line 2", lines.len()),
        )
    })?;

    let token = line.split_whitespace().last().ok_or_else(|| {
        FormatError::invalid_format(DOMAIN_COUNT_LINE, "domain count line is empty")
    })?;

    token.parse::<u32>().map_err(|e| FormatError::InvalidInteger {
        line: DOMAIN_COUNT_LINE,
        message: format!("Failed to parse domain count '{token}': {e}"),
    })
}

/// Read the hit line two lines below the marker at `marker_idx`
///
/// `#|human|H|1.3e-53|170.9|0|117|` gives species (1), chain type (2), start (5)
/// and inclusive end (6). The end is stored exclusive.
fn read_metadata(lines: &[&str], marker_idx: usize) -> FormatResult<BlockMetadata> {
    let idx = marker_idx + METADATA_OFFSET;
    let line = lines.get(idx).ok_or_else(|| {
        FormatError::invalid_format(marker_idx, "marker is not followed by a hit metadata line")
    })?;

    let fields: Vec<&str> = line.trim().split('|').collect();
    if fields.len() < 7 {
        return Err(FormatError::invalid_format(
            idx,
            format!("expected at least 7 pipe-delimited fields, got {}", fields.len()),
        ));
    }

    let parse_index = |value: &str, name: &str| {
        value.trim().parse::<usize>().map_err(|e| FormatError::InvalidInteger {
            line: idx,
            message: format!("Failed to parse {name} '{value}': {e}"),
        })
    };

    let start_index = parse_index(fields[5], "seqstart_index")?;
    let last_index = parse_index(fields[6], "seqend_index")?;
    if last_index < start_index {
        return Err(FormatError::invalid_format(
            idx,
            format!("domain ends at {last_index} before it starts at {start_index}"),
        ));
    }

    let end_index = last_index.checked_add(1).ok_or_else(|| {
        FormatError::invalid_format(idx, format!("seqend_index {last_index} is out of range"))
    })?;

    Ok(BlockMetadata {
        species: fields[1].trim().to_string(),
        chain_type: fields[2].trim().to_string(),
        start_index,
        end_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SINGLE_DOMAIN: &str = "# anarci_query_sequence
# ANARCI numbered
# Domain 1 of 1
# Most significant HMM hit
#|species|chain_type|e-value|score|seqstart_index|seqend_index|
#|human|H|1.3e-53|170.9|19|23|
# Most sequence-identical germlines
#|species|v_gene|v_identity|j_gene|j_identity|
#|human|IGHV3-23*01|0.71|IGHJ4*01|0.86|
# Scheme = kabat
H 1       E
H 2       V
H 82      L
H 82 A    S
H 83      -
//
";

    #[test]
    fn test_two_line_report_has_no_domain() {
        let parser = DomainReportParser::new();
        let records = parser.parse_str("# anarci_query_sequence\n//\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_single_domain() {
        let records = DomainReportParser::new().parse_str(SINGLE_DOMAIN).unwrap();
        assert_eq!(records.len(), 1);

        let region = &records[0];
        assert_eq!(region.region_count, 1);
        assert_eq!(region.species, "human");
        assert_eq!(region.chain_type, "H");
        assert_eq!(region.start_index, 19);
        assert_eq!(region.end_index, 24);
        assert_eq!(region.residue_sequence, vec!["E", "V", "L", "S", "-"]);
        assert_eq!(region.position_labels, vec!["1", "2", "82", "82A", "83"]);
    }

    #[test]
    fn test_parse_two_domains_in_order() {
        let report = "# scfv
# ANARCI numbered
# Domain 1 of 2
# Most significant HMM hit
#|species|chain_type|e-value|score|seqstart_index|seqend_index|
#|mouse|H|1e-50|160.0|0|1|
# Scheme = kabat
H 1       Q
H 2       V
# Domain 2 of 2
# Most significant HMM hit
#|species|chain_type|e-value|score|seqstart_index|seqend_index|
#|mouse|K|2e-48|150.0|10|12|
# Scheme = kabat
L 1       D
L 27 A    I
L 28      V
//
";
        let records = DomainReportParser::new().parse_str(report).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chain_type, "H");
        assert_eq!(records[0].residue_sequence, vec!["Q", "V"]);
        assert_eq!(records[1].chain_type, "K");
        assert_eq!(records[1].start_index, 10);
        assert_eq!(records[1].end_index, 13);
        assert_eq!(records[1].position_labels, vec!["1", "27A", "28"]);
        assert!(records.iter().all(|r| r.region_count == 2));
    }

    #[test]
    fn test_bad_domain_count_reports_line_two() {
        let report = SINGLE_DOMAIN.replace("# Domain 1 of 1", "# Domain 1 of one");
        let err = DomainReportParser::new().parse_str(&report).unwrap_err();
        assert!(matches!(err, FormatError::InvalidInteger { line: 2, .. }));
    }

    #[test]
    fn test_short_metadata_line_is_rejected() {
        let report = SINGLE_DOMAIN.replace("#|human|H|1.3e-53|170.9|19|23|", "#|human|H|");
        let err = DomainReportParser::new().parse_str(&report).unwrap_err();
        assert_eq!(err, FormatError::invalid_format(5, "expected at least 7 pipe-delimited fields, got 4"));
    }

    #[test]
    fn test_unparsable_start_index_is_rejected() {
        let report = SINGLE_DOMAIN.replace("|19|23|", "|start|23|");
        let err = DomainReportParser::new().parse_str(&report).unwrap_err();
        assert!(matches!(err, FormatError::InvalidInteger { line: 5, .. }));
    }

    #[test]
    fn test_residue_line_with_wrong_token_count() {
        let report = SINGLE_DOMAIN.replace("H 2       V", "H 2");
        let err = DomainReportParser::new().parse_str(&report).unwrap_err();
        assert_eq!(err.line(), Some(11));
    }

    #[test]
    fn test_unterminated_block_is_rejected() {
        let report = SINGLE_DOMAIN.replace("//\n", "");
        let err = DomainReportParser::new().parse_str(&report).unwrap_err();
        assert!(matches!(err, FormatError::InvalidFormat { line: 14, .. }));
    }

    #[test]
    fn test_residue_outside_block_is_rejected() {
        let report = "# q\n# ANARCI numbered\n# Domain 1 of 1\nH 1 E\n//\n";
        let err = DomainReportParser::new().parse_str(report).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_classify_lines() {
        assert_eq!(LineKind::classify("   "), LineKind::Blank);
        assert_eq!(LineKind::classify("  # Most significant HMM hit "), LineKind::Marker);
        assert_eq!(LineKind::classify("#|human|H|"), LineKind::Comment);
        assert_eq!(LineKind::classify("//"), LineKind::Terminator);
        assert_eq!(LineKind::classify("H 1 E"), LineKind::Residue(vec!["H", "1", "E"]));
    }

    #[test]
    fn test_end_index_overflow_is_rejected() {
        let report = SINGLE_DOMAIN.replace("|19|23|", &format!("|0|{}|", usize::MAX));
        let err = DomainReportParser::new().parse_str(&report).unwrap_err();
        assert!(matches!(err, FormatError::InvalidFormat { line: 5, .. }));
    }

    /// One generated domain: metadata plus (position, insertion, residue) rows
    #[derive(Debug, Clone)]
    struct GeneratedBlock {
        species: &'static str,
        chain: &'static str,
        start: usize,
        rows: Vec<(u16, Option<char>, char)>,
    }

    fn arb_block() -> impl Strategy<Value = GeneratedBlock> {
        let residues: Vec<char> = "ACDEFGHIKLMNPQRSTVWY-".chars().collect();
        let row = (
            1u16..130,
            prop::option::of(prop::char::range('A', 'D')),
            prop::sample::select(residues),
        );
        (
            prop::sample::select(vec!["human", "mouse", "rat"]),
            prop::sample::select(vec!["H", "K", "L"]),
            0usize..500,
            prop::collection::vec(row, 1..40),
        )
            .prop_map(|(species, chain, start, rows)| GeneratedBlock {
                species,
                chain,
                start,
                rows,
            })
    }

    fn render(blocks: &[GeneratedBlock]) -> String {
        let mut report = String::from("# anarci_query_sequence\n# ANARCI numbered\n");
        for (i, block) in blocks.iter().enumerate() {
            report.push_str(&format!("# Domain {} of {}\n", i + 1, blocks.len()));
            report.push_str(&format!("{HIT_MARKER}\n"));
            report.push_str("#|species|chain_type|e-value|score|seqstart_index|seqend_index|\n");
            report.push_str(&format!(
                "#|{}|{}|1e-30|100.0|{}|{}|\n",
                block.species,
                block.chain,
                block.start,
                block.start + block.rows.len() - 1
            ));
            report.push_str("# Scheme = kabat\n");
            for (position, insertion, residue) in &block.rows {
                let line = match insertion {
                    Some(code) => format!("{} {position} {code}    {residue}\n", block.chain),
                    None => format!("{} {position:<7} {residue}\n", block.chain),
                };
                report.push_str(&line);
            }
        }
        report.push_str("//\n");
        report
    }

    proptest! {
        #[test]
        fn prop_blocks_become_records_in_order(blocks in prop::collection::vec(arb_block(), 1..5)) {
            let records = DomainReportParser::new().parse_str(&render(&blocks)).unwrap();
            prop_assert_eq!(records.len(), blocks.len());

            for (record, block) in records.iter().zip(&blocks) {
                prop_assert_eq!(record.region_count as usize, blocks.len());
                prop_assert_eq!(&record.species, block.species);
                prop_assert_eq!(&record.chain_type, block.chain);
                prop_assert_eq!(record.start_index, block.start);
                prop_assert!(record.end_index > record.start_index);
                prop_assert_eq!(record.residue_sequence.len(), record.position_labels.len());

                let labels: Vec<String> = block
                    .rows
                    .iter()
                    .map(|(position, insertion, _)| match insertion {
                        Some(code) => format!("{position}{code}"),
                        None => position.to_string(),
                    })
                    .collect();
                prop_assert_eq!(&record.position_labels, &labels);

                let residues: Vec<String> = block.rows.iter().map(|(_, _, r)| r.to_string()).collect();
                prop_assert_eq!(&record.residue_sequence, &residues);
            }
        }
    }
}
