//! abseq - antibody sequence annotation tool

use abseq_annotate::anarci::DomainReportParser;
use abseq_annotate::blast::BlastReport;
use abseq_annotate::config::AnnotateConfig;
use abseq_annotate::pipeline::{annotate_fasta, annotate_sequence, AnnotateOptions};
use abseq_annotate::signalp::SignalPeptideParser;
use abseq_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "abseq")]
#[command(author, version, about = "Antibody sequence annotation")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write daily log files to this directory
    #[arg(long, global = true, env = "ABSEQ_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the external tools on sequences and print the merged annotation
    Annotate(AnnotateArgs),

    /// Parse an existing tool report
    Parse {
        #[command(subcommand)]
        report: Report,
    },
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// Protein sequence to annotate
    #[arg(short, long, conflicts_with = "fasta", required_unless_present = "fasta")]
    sequence: Option<String>,

    /// FASTA file with one or more protein sequences
    #[arg(short, long)]
    fasta: Option<PathBuf>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parent directory for temporary tool workspaces
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    #[arg(long)]
    skip_anarci: bool,

    #[arg(long)]
    skip_blastp: bool,

    #[arg(long)]
    skip_tblastn: bool,

    #[arg(long)]
    skip_signalp: bool,
}

#[derive(Subcommand, Debug)]
enum Report {
    /// ANARCI numbering report
    Anarci { file: PathBuf },
    /// BLAST XML (-outfmt 5); prints the selected hit of every query
    Blast { file: PathBuf },
    /// SignalP 5 summary
    Signalp { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let mut builder = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("abseq");
    if let Some(dir) = cli.log_dir {
        builder = builder.output(LogOutput::Both).log_dir(dir);
    }

    // Environment variables take precedence
    let log_config = builder.build().merge_env()?;
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Annotate(args) => annotate(args).await?,
        Command::Parse { report } => parse(report)?,
    }

    Ok(())
}

async fn annotate(args: AnnotateArgs) -> Result<()> {
    let mut config = AnnotateConfig::load()?;
    if args.temp_dir.is_some() {
        config.temp_dir = args.temp_dir;
    }
    config.validate()?;

    let options = AnnotateOptions {
        skip_anarci: args.skip_anarci,
        skip_blastp: args.skip_blastp,
        skip_tblastn: args.skip_tblastn,
        skip_signalp: args.skip_signalp,
    };

    match (args.sequence, args.fasta) {
        (Some(sequence), _) => {
            let annotation = annotate_sequence(&sequence, &config, options).await?;
            write_json(&annotation, args.output.as_deref())?;
        },
        (None, Some(fasta)) => {
            let annotations = annotate_fasta(&fasta, &config, options).await?;
            write_json(&annotations, args.output.as_deref())?;
        },
        (None, None) => bail!("either --sequence or --fasta is required"),
    }

    info!("Annotation complete");
    Ok(())
}

fn parse(report: Report) -> Result<()> {
    match report {
        Report::Anarci { file } => {
            let regions = DomainReportParser::new()
                .parse_file(&file)
                .with_context(|| format!("parsing ANARCI report {}", file.display()))?;
            write_json(&regions, None)
        },
        Report::Blast { file } => {
            let report = BlastReport::parse_file(&file)
                .with_context(|| format!("decoding BLAST XML {}", file.display()))?;
            let records = report
                .queries
                .iter()
                .map(|query| query.select_best())
                .collect::<Result<Vec<_>, _>>()?;
            write_json(&records, None)
        },
        Report::Signalp { file } => {
            let signal = SignalPeptideParser::new()
                .parse_file(&file)
                .with_context(|| format!("parsing SignalP summary {}", file.display()))?;
            write_json(&signal, None)
        },
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Wrote annotation");
        },
        None => println!("{json}"),
    }
    Ok(())
}
