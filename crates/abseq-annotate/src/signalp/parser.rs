//! SignalP 5 summary parser
//!
//! # Format
//! ```text
//! # SignalP-5.0	Organism: Eukarya	Timestamp: 20200101000000
//! # ID	Prediction	SP(Sec/SPI)	OTHER	CS Position
//! signalp_query_sequence	SP(Sec/SPI)	0.998	0.002	CS pos: 19-20. VYS-EV. Pr: 0.9712
//! ```
//!
//! Only the third line carries data. A predicted signal peptide fills a fifth
//! tab field with the cleavage site; otherwise the line stops after four.

use abseq_common::{FormatError, FormatResult};
use std::path::Path;
use tracing::debug;

use super::models::SignalPeptideAnnotation;

/// 0-based index of the data line
pub const DATA_LINE: usize = 2;

/// Fields on a data line that reports a cleavage site
const SIGNAL_FIELDS: usize = 5;

/// Field holding `CS pos: <start>-<end>. ...`
const CLEAVAGE_FIELD: usize = 4;

/// Parses a SignalP summary into one [`SignalPeptideAnnotation`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalPeptideParser;

impl SignalPeptideParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a summary file
    pub fn parse_file(&self, path: &Path) -> abseq_common::Result<SignalPeptideAnnotation> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse_str(&content)?)
    }

    /// Parse summary text
    ///
    /// A report without a data line means no prediction was written and is
    /// treated as no signal peptide.
    pub fn parse_str(&self, content: &str) -> FormatResult<SignalPeptideAnnotation> {
        let Some(line) = content.lines().nth(DATA_LINE) else {
            debug!("SignalP report has no data line");
            return Ok(SignalPeptideAnnotation::absent());
        };

        let fields: Vec<&str> = line.trim().split('\t').collect();
        if fields.len() < SIGNAL_FIELDS {
            return Ok(SignalPeptideAnnotation::absent());
        }

        let cleavage_index = parse_cleavage(fields[CLEAVAGE_FIELD])?;
        debug!(cleavage_index, "Signal peptide predicted");

        Ok(SignalPeptideAnnotation::cleaved_at(cleavage_index))
    }
}

/// `CS pos: 19-20. VYS-EV. Pr: 0.9712` -> 19
fn parse_cleavage(field: &str) -> FormatResult<u32> {
    let token = field.split_whitespace().nth(2).ok_or_else(|| {
        FormatError::invalid_format(DATA_LINE, format!("no cleavage position in '{field}'"))
    })?;

    let position = token.split('.').next().unwrap_or_default();
    let position = position.split('-').next().unwrap_or_default();
    let digits_end = position
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(position.len());

    position[..digits_end]
        .parse()
        .map_err(|e| FormatError::InvalidInteger {
            line: DATA_LINE,
            message: format!("cleavage position '{token}': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "# SignalP-5.0\tOrganism: Eukarya\tTimestamp: 20200101000000\n\
                          # ID\tPrediction\tSP(Sec/SPI)\tOTHER\tCS Position\n";

    fn report(data: &str) -> String {
        format!("{HEADER}{data}\n")
    }

    #[test]
    fn test_signal_with_cleavage_site() {
        let text = report("signalp_query_sequence\tSP(Sec/SPI)\t0.998\t0.002\tCS pos: 19-20. VYS-EV. Pr: 0.9712");
        let signal = SignalPeptideParser::new().parse_str(&text).unwrap();
        assert_eq!(signal, SignalPeptideAnnotation::cleaved_at(19));
    }

    #[test]
    fn test_no_signal_line() {
        let text = report("signalp_query_sequence\tOTHER\t0.001\t0.999");
        let signal = SignalPeptideParser::new().parse_str(&text).unwrap();
        assert_eq!(signal, SignalPeptideAnnotation::absent());
    }

    #[test]
    fn test_trailing_tab_does_not_count_as_field() {
        let text = report("signalp_query_sequence\tOTHER\t0.001\t0.999\t");
        assert!(!SignalPeptideParser::new().parse_str(&text).unwrap().has_signal);
    }

    #[test]
    fn test_three_fields_is_absent() {
        let text = report("q\tOTHER\t0.5");
        assert_eq!(
            SignalPeptideParser::new().parse_str(&text).unwrap(),
            SignalPeptideAnnotation::absent()
        );
    }

    #[test]
    fn test_short_report_is_absent() {
        let parser = SignalPeptideParser::new();
        assert_eq!(parser.parse_str("").unwrap(), SignalPeptideAnnotation::absent());
        assert_eq!(parser.parse_str(HEADER).unwrap(), SignalPeptideAnnotation::absent());
    }

    #[test]
    fn test_leading_digits_only() {
        assert_eq!(parse_cleavage("CS pos: 23.").unwrap(), 23);
        assert_eq!(parse_cleavage("CS pos: 7a-8").unwrap(), 7);
    }

    #[test]
    fn test_missing_cleavage_token() {
        let text = report("q\tSP(Sec/SPI)\t0.9\t0.1\tCS pos:");
        let err = SignalPeptideParser::new().parse_str(&text).unwrap_err();
        assert_eq!(err.line(), Some(DATA_LINE));
        assert!(matches!(err, FormatError::InvalidFormat { .. }));
    }

    #[test]
    fn test_non_numeric_cleavage() {
        let text = report("q\tSP(Sec/SPI)\t0.9\t0.1\tCS pos: ?-20. ABC. Pr: 0.5");
        let err = SignalPeptideParser::new().parse_str(&text).unwrap_err();
        assert!(matches!(err, FormatError::InvalidInteger { line: DATA_LINE, .. }));
    }

    #[test]
    fn test_cleavage_text_leading_with_range_uses_third_token() {
        // third token is "pos:", which has no leading digits
        let text = report("q\tSP(Sec/SPI)\t0.9\t0.1\t23-24. CS pos: 23-24");
        let err = SignalPeptideParser::new().parse_str(&text).unwrap_err();
        match err {
            FormatError::InvalidInteger { line, message } => {
                assert_eq!(line, DATA_LINE);
                assert!(message.starts_with("cleavage position 'pos:'"), "{message}");
            },
            other => panic!("expected an integer error, got {other:?}"),
        }
    }
}
