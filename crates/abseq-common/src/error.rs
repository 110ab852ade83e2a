//! Error types for abseq
//!
//! Two layers: [`FormatError`] describes report text (or decoded report objects)
//! that do not follow the grammar a parser expects, and [`AbseqError`] is the
//! workspace-wide error that also covers tool invocation, I/O and configuration.
//!
//! "Nothing found" is never an error. Empty domain lists, no-hit alignment
//! records and absent signal peptides are ordinary values.

use thiserror::Error;

/// Result type alias for abseq operations
pub type Result<T> = std::result::Result<T, AbseqError>;

/// Result type alias for report parsers
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// Report text or report object that violates the expected grammar.
///
/// Line indices are 0-based positions in the report as handed to the parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Invalid report format at line {line}: {message}")]
    InvalidFormat { line: usize, message: String },

    #[error("Invalid integer value at line {line}: {message}")]
    InvalidInteger { line: usize, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid alignment candidate {index}: {message}")]
    InvalidCandidate { index: usize, message: String },

    #[error("Malformed XML report: {0}")]
    Xml(String),
}

impl FormatError {
    pub fn invalid_format(line: usize, message: impl Into<String>) -> Self {
        FormatError::InvalidFormat {
            line,
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        FormatError::MissingField {
            field: field.into(),
        }
    }

    /// Line the error points at, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            FormatError::InvalidFormat { line, .. }
            | FormatError::InvalidInteger { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Main error type for abseq
#[derive(Error, Debug)]
pub enum AbseqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// The external tool ran but exited unsuccessfully. Its output is never parsed.
    #[error("{tool} exited with status {status}: {stderr}")]
    Tool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Tool binary not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} finished without writing its report to {path}")]
    OutputMissing { tool: String, path: String },

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_line() {
        assert_eq!(FormatError::invalid_format(4, "short").line(), Some(4));
        assert_eq!(FormatError::missing_field("Hsp_score").line(), None);
    }

    #[test]
    fn test_format_error_converts_into_abseq_error() {
        let err: AbseqError = FormatError::invalid_format(2, "no domain count").into();
        assert!(matches!(err, AbseqError::Format(FormatError::InvalidFormat { line: 2, .. })));
        assert_eq!(err.to_string(), "Invalid report format at line 2: no domain count");
    }
}
