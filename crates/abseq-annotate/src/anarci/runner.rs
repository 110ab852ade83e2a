//! Runs ANARCI on one sequence

use abseq_common::Result;
use tracing::{info, instrument};

use super::models::VRegionAnnotation;
use super::parser::DomainReportParser;
use crate::config::{AnarciConfig, AnnotateConfig};
use crate::tool::{ToolCommand, ToolWorkspace};

const TOOL: &str = "anarci";

/// Build `ANARCI -s <scheme> -i <query> -o <report>`
pub fn anarci_command(
    config: &AnarciConfig,
    query: &std::path::Path,
    report: &std::path::Path,
) -> ToolCommand {
    ToolCommand::new(TOOL, &config.bin)
        .arg("-s")
        .arg(&config.scheme)
        .arg("-i")
        .arg(query)
        .arg("-o")
        .arg(report)
}

/// Number the variable domains of `sequence`
#[instrument(skip_all, fields(len = sequence.len()))]
pub async fn find_v_regions(
    sequence: &str,
    config: &AnnotateConfig,
) -> Result<Vec<VRegionAnnotation>> {
    let workspace = ToolWorkspace::new(TOOL, config.temp_dir.as_deref())?;
    let query = workspace.write_query(TOOL, sequence)?;
    let report = workspace.file("anarci_result.txt");

    anarci_command(&config.anarci, &query, &report).run().await?;

    let content = workspace.read_report(TOOL, &report)?;
    let regions = DomainReportParser::new().parse_str(&content)?;
    info!(domains = regions.len(), "ANARCI numbering complete");

    Ok(regions)
}
