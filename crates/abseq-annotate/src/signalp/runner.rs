//! Runs SignalP 5 on one sequence

use abseq_common::{AbseqError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use super::models::SignalPeptideAnnotation;
use super::parser::SignalPeptideParser;
use crate::config::{AnnotateConfig, SignalpConfig};
use crate::tool::{ToolCommand, ToolWorkspace};

const TOOL: &str = "signalp";

/// Build `signalp -fasta <query> -tmp <dir>`, run from inside `dir`
pub fn signalp_command(config: &SignalpConfig, query: &Path, dir: &Path) -> ToolCommand {
    ToolCommand::new(TOOL, &config.bin)
        .arg("-fasta")
        .arg(query)
        .arg("-tmp")
        .arg(dir)
        .current_dir(dir)
}

/// SignalP names its summary after the query file
pub fn summary_path(query: &Path, dir: &Path) -> Result<PathBuf> {
    let stem = query
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AbseqError::Config(format!("query file has no name: {}", query.display())))?;
    Ok(dir.join(format!("{stem}_summary.signalp5")))
}

/// Predict the signal peptide of `sequence`
#[instrument(skip_all, fields(len = sequence.len()))]
pub async fn find_signal_peptide(
    sequence: &str,
    config: &AnnotateConfig,
) -> Result<SignalPeptideAnnotation> {
    let workspace = ToolWorkspace::new(TOOL, config.temp_dir.as_deref())?;
    let query = workspace.write_query(TOOL, sequence)?;

    signalp_command(&config.signalp, &query, workspace.path()).run().await?;

    let summary = summary_path(&query, workspace.path())?;
    let content = workspace.read_report(TOOL, &summary)?;
    let signal = SignalPeptideParser::new().parse_str(&content)?;
    info!(
        has_signal = signal.has_signal,
        cleavage_index = ?signal.cleavage_index,
        "SignalP prediction complete"
    );

    Ok(signal)
}
