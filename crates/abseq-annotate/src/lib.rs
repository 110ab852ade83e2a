//! Antibody sequence annotation
//!
//! Runs external sequence-analysis tools on antibody chains and turns their
//! reports into typed records.
//!
//! # Reports
//!
//! - **ANARCI**: variable-domain numbering, parsed by [`anarci::DomainReportParser`]
//! - **BLAST**: constant-region and germline searches, decoded by
//!   [`blast::BlastReport`] and reduced by [`blast::AlignmentHitSelector`]
//! - **SignalP**: signal peptide prediction, parsed by [`signalp::SignalPeptideParser`]
//!
//! # Example
//!
//! ```no_run
//! use abseq_annotate::config::AnnotateConfig;
//! use abseq_annotate::pipeline::{annotate_sequence, AnnotateOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AnnotateConfig::load()?;
//!     let annotation = annotate_sequence("EVQLVESGGGLVQPGGSLRLSCAAS", &config, AnnotateOptions::default()).await?;
//!     println!("{}", serde_json::to_string_pretty(&annotation)?);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod anarci;
pub mod blast;
pub mod config;
pub mod fasta;
pub mod physicochem;
pub mod pipeline;
pub mod signalp;
pub mod tool;
