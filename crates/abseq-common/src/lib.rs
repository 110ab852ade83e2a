//! abseq common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Error handling and logging shared by the abseq workspace members.
//!
//! # Example
//!
//! ```no_run
//! use abseq_common::{AbseqError, FormatError, Result};
//!
//! fn domain_count(line: &str) -> Result<u32> {
//!     let token = line.split_whitespace().last().unwrap_or_default();
//!     token.parse().map_err(|_| {
//!         AbseqError::from(FormatError::invalid_format(2, format!("bad count '{token}'")))
//!     })
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{AbseqError, FormatError, FormatResult, Result};
