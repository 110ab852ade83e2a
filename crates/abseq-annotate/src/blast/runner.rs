//! Runs blastp and tblastn on one sequence
//!
//! Both searches write XML (`-outfmt 5`) which is decoded and reduced to a
//! single [`AlignmentRecord`] by the hit selector.

use abseq_common::Result;
use std::path::Path;
use tracing::{info, instrument};

use super::models::AlignmentRecord;
use super::xml::BlastReport;
use crate::config::{AnnotateConfig, BlastConfig};
use crate::tool::{ToolCommand, ToolWorkspace};

const BLASTP: &str = "blastp";
const TBLASTN: &str = "tblastn";

/// blastp of the query against the constant-region protein database
pub fn blastp_command(config: &BlastConfig, query: &Path, out: &Path) -> ToolCommand {
    ToolCommand::new(BLASTP, &config.blastp_bin)
        .arg("-query")
        .arg(query)
        .arg("-db")
        .arg(&config.cregion_db)
        .arg("-out")
        .arg(out)
        .args(["-outfmt", "5", "-task"])
        .arg(&config.blastp_task)
        .arg("-num_threads")
        .arg(config.threads.to_string())
}

/// tblastn of the query against the variable-region nucleotide database
pub fn tblastn_command(config: &BlastConfig, query: &Path, out: &Path) -> ToolCommand {
    ToolCommand::new(TBLASTN, &config.tblastn_bin)
        .arg("-query")
        .arg(query)
        .arg("-db")
        .arg(&config.vregion_db)
        .arg("-out")
        .arg(out)
        .args(["-outfmt", "5", "-num_threads"])
        .arg(config.threads.to_string())
        .arg("-evalue")
        .arg(config.tblastn_evalue.to_string())
}

/// Best constant-region match for `sequence`
#[instrument(skip_all, fields(len = sequence.len()))]
pub async fn find_constant_region(sequence: &str, config: &AnnotateConfig) -> Result<AlignmentRecord> {
    let workspace = ToolWorkspace::new(BLASTP, config.temp_dir.as_deref())?;
    let query = workspace.write_query(BLASTP, sequence)?;
    let out = workspace.file("blastp_result.xml");

    blastp_command(&config.blast, &query, &out).run().await?;
    select_from_report(&workspace, BLASTP, &out)
}

/// Best germline variable-region match for `sequence`
#[instrument(skip_all, fields(len = sequence.len()))]
pub async fn find_germline(sequence: &str, config: &AnnotateConfig) -> Result<AlignmentRecord> {
    let workspace = ToolWorkspace::new(TBLASTN, config.temp_dir.as_deref())?;
    let query = workspace.write_query(TBLASTN, sequence)?;
    let out = workspace.file("tblastn_result.xml");

    tblastn_command(&config.blast, &query, &out).run().await?;
    select_from_report(&workspace, TBLASTN, &out)
}

fn select_from_report(workspace: &ToolWorkspace, tool: &str, out: &Path) -> Result<AlignmentRecord> {
    let content = workspace.read_report(tool, out)?;
    let report = BlastReport::parse(&content)?;
    let query = report.single_query()?;
    let record = query.select_best()?;

    info!(
        tool,
        candidates = query.candidates.len(),
        no_hit = record.is_no_hit(),
        "BLAST search complete"
    );

    Ok(record)
}
