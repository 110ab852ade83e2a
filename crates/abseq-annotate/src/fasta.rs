//! FASTA input and query files
//!
//! Reads multi-record protein FASTA for batch annotation and writes the
//! single-record query files handed to the external tools, both through
//! `bio::io::fasta`.

use abseq_common::{FormatError, FormatResult, Result};
use bio::io::fasta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One FASTA record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastaRecord {
    /// Header text after '>' up to the first whitespace
    pub id: String,
    /// Sequence with line breaks and whitespace removed
    pub sequence: String,
}

/// Record id used in the query file for `tool`, e.g. `anarci_query_sequence`
pub fn query_id(tool: &str) -> String {
    format!("{tool}_query_sequence")
}

/// Write a single-record query file for `tool` at `path`
pub fn write_query(path: impl Into<PathBuf>, tool: &str, sequence: &str) -> Result<PathBuf> {
    let path = path.into();
    let mut writer = fasta::Writer::to_file(&path)?;
    writer.write(&query_id(tool), None, sequence.as_bytes())?;
    writer.flush()?;
    Ok(path)
}

/// Read every record of a FASTA file
pub fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_fasta(&content)?)
}

/// Parse FASTA text
///
/// Text that does not open with a header is a format error at line 0; a header
/// without an identifier or a non-ASCII sequence is an error at its header
/// line. Records with an empty sequence are kept so callers can report them.
pub fn parse_fasta(content: &str) -> FormatResult<Vec<FastaRecord>> {
    // bio does not track lines. The first record starts at line 0 (bio rejects
    // anything else there), every later one at its header.
    let header_lines: Vec<usize> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with('>'))
        .map(|(idx, _)| idx)
        .collect();

    let mut records = Vec::new();
    for (n, record) in fasta::Reader::new(content.as_bytes()).records().enumerate() {
        let line = match n {
            0 => 0,
            n => header_lines.get(n).copied().unwrap_or(0),
        };
        let record = record.map_err(|e| FormatError::invalid_format(line, e.to_string()))?;
        record
            .check()
            .map_err(|e| FormatError::invalid_format(line, e.to_string()))?;

        records.push(FastaRecord {
            id: record.id().to_string(),
            sequence: record
                .seq()
                .iter()
                .filter(|b| !b.is_ascii_whitespace())
                .map(|&b| char::from(b))
                .collect(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_id() {
        assert_eq!(query_id("signalp"), "signalp_query_sequence");
    }

    #[test]
    fn test_write_query_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_query(dir.path().join("q.fasta"), "signalp", "MKV").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), ">signalp_query_sequence\nMKV\n");
    }

    #[test]
    fn test_parse_multi_record_fasta() {
        let records = parse_fasta(">heavy chain 1\nEVQLV\nESGGG\n>light\nDIQMT QSP\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "heavy");
        assert_eq!(records[0].sequence, "EVQLVESGGG");
        assert_eq!(records[1].sequence, "DIQMTQSP");
    }

    #[test]
    fn test_sequence_before_header_is_rejected() {
        let err = parse_fasta("EVQL\n>x\nA\n").unwrap_err();
        assert_eq!(err.line(), Some(0));
    }

    #[test]
    fn test_empty_header_points_at_its_line() {
        let err = parse_fasta(">a\nEVQL\n>\nEVQL\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_read_fasta_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chains.fasta");
        std::fs::write(&path, ">h1\nEVQL\n>h2\nDIQM\n").unwrap();
        let ids: Vec<_> = read_fasta(&path).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["h1", "h2"]);
    }
}
