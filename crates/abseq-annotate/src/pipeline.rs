//! Whole-sequence annotation
//!
//! Runs every external tool on one sequence, each in its own temporary
//! workspace, and merges their parsed results with the physicochemical
//! properties into a [`SequenceAnnotation`].

use abseq_common::{AbseqError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::anarci::{find_v_regions, VRegionAnnotation};
use crate::blast::{find_constant_region, find_germline, AlignmentRecord};
use crate::config::AnnotateConfig;
use crate::fasta::read_fasta;
use crate::physicochem::PhysicochemicalProperties;
use crate::signalp::{find_signal_peptide, SignalPeptideAnnotation};

/// Which tools to leave out of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateOptions {
    pub skip_anarci: bool,
    pub skip_blastp: bool,
    pub skip_tblastn: bool,
    pub skip_signalp: bool,
}

/// Everything known about one sequence. Skipped tools leave their field empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceAnnotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sequence: String,
    pub length: usize,
    pub properties: PhysicochemicalProperties,
    pub v_regions: Option<Vec<VRegionAnnotation>>,
    /// blastp against the constant-region database
    pub constant_region: Option<AlignmentRecord>,
    /// tblastn against the variable-region database
    pub germline: Option<AlignmentRecord>,
    pub signal_peptide: Option<SignalPeptideAnnotation>,
}

/// Strip whitespace and upper-case; an empty or non-alphabetic sequence is rejected
pub fn normalize_sequence(sequence: &str) -> Result<String> {
    let normalized: String = sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(AbseqError::InvalidSequence("sequence is empty".to_string()));
    }
    if let Some(bad) = normalized.chars().find(|c| !c.is_ascii_alphabetic() && *c != '*') {
        return Err(AbseqError::InvalidSequence(format!(
            "unexpected character '{bad}' in protein sequence"
        )));
    }

    Ok(normalized)
}

/// Annotate one sequence with every tool not skipped in `options`
#[instrument(skip_all, fields(len = sequence.len()))]
pub async fn annotate_sequence(
    sequence: &str,
    config: &AnnotateConfig,
    options: AnnotateOptions,
) -> Result<SequenceAnnotation> {
    let sequence = normalize_sequence(sequence)?;
    let properties = PhysicochemicalProperties::calculate(&sequence)?;
    let seq = sequence.as_str();

    let (v_regions, constant_region, germline, signal_peptide) = tokio::try_join!(
        async {
            if options.skip_anarci {
                Ok(None)
            } else {
                find_v_regions(seq, config).await.map(Some)
            }
        },
        async {
            if options.skip_blastp {
                Ok(None)
            } else {
                find_constant_region(seq, config).await.map(Some)
            }
        },
        async {
            if options.skip_tblastn {
                Ok(None)
            } else {
                find_germline(seq, config).await.map(Some)
            }
        },
        async {
            if options.skip_signalp {
                Ok(None)
            } else {
                find_signal_peptide(seq, config).await.map(Some)
            }
        },
    )?;

    if matches!(&v_regions, Some(regions) if regions.is_empty()) {
        warn!("ANARCI found no variable domain");
    }

    Ok(SequenceAnnotation {
        id: None,
        length: sequence.len(),
        sequence,
        properties,
        v_regions,
        constant_region,
        germline,
        signal_peptide,
    })
}

/// Annotate every record of a FASTA file, one after the other
pub async fn annotate_fasta(
    path: &Path,
    config: &AnnotateConfig,
    options: AnnotateOptions,
) -> anyhow::Result<Vec<SequenceAnnotation>> {
    let records = read_fasta(path)?;
    info!(path = %path.display(), records = records.len(), "Annotating FASTA records");

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut annotations = Vec::with_capacity(records.len());
    for record in records {
        pb.set_message(format!("Annotating {}", record.id));
        let mut annotation = annotate_sequence(&record.sequence, config, options)
            .await
            .map_err(|e| anyhow::anyhow!("failed to annotate '{}': {e}", record.id))?;
        annotation.id = Some(record.id);
        annotations.push(annotation);
        pb.inc(1);
    }

    pb.finish_with_message(format!("Annotated {} sequences", annotations.len()));
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip_all() -> AnnotateOptions {
        AnnotateOptions {
            skip_anarci: true,
            skip_blastp: true,
            skip_tblastn: true,
            skip_signalp: true,
        }
    }

    #[test]
    fn test_normalize_sequence() {
        assert_eq!(normalize_sequence(" evql\nvesg ").unwrap(), "EVQLVESG");
        assert!(matches!(normalize_sequence("  \n"), Err(AbseqError::InvalidSequence(_))));
        assert!(matches!(normalize_sequence("EVQ1"), Err(AbseqError::InvalidSequence(_))));
    }

    #[tokio::test]
    async fn test_all_tools_skipped() {
        let annotation = annotate_sequence("EVQLVESGGG", &AnnotateConfig::default(), skip_all())
            .await
            .unwrap();

        assert_eq!(annotation.sequence, "EVQLVESGGG");
        assert_eq!(annotation.length, 10);
        assert!(annotation.v_regions.is_none());
        assert!(annotation.constant_region.is_none());
        assert!(annotation.germline.is_none());
        assert!(annotation.signal_peptide.is_none());
        assert!(annotation.properties.molecular_weight_kda > 0.0);
    }

    #[tokio::test]
    async fn test_missing_tool_fails_the_run() {
        let mut config = AnnotateConfig::default();
        config.signalp.bin = "/nonexistent/abseq-signalp".to_string();
        let options = AnnotateOptions {
            skip_signalp: false,
            ..skip_all()
        };

        let err = annotate_sequence("EVQLVESGGG", &config, options).await.unwrap_err();
        assert!(matches!(err, AbseqError::ToolNotFound(_)));
    }
}
