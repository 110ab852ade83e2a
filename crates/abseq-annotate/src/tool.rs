//! External tool invocation
//!
//! Every tool run gets its own temporary workspace holding the query FASTA and
//! the report the tool writes. The workspace is removed when it is dropped,
//! whether the run succeeded or not. A tool that exits unsuccessfully is an
//! [`AbseqError::Tool`]; its output never reaches a parser.

use abseq_common::{AbseqError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::fasta;

/// Number of trailing stderr lines kept in a [`AbseqError::Tool`]
const STDERR_TAIL_LINES: usize = 20;

/// Temporary directory owned by one tool run
#[derive(Debug)]
pub struct ToolWorkspace {
    dir: TempDir,
}

impl ToolWorkspace {
    /// Create a workspace under `parent`, or the system temp dir when `None`
    pub fn new(tool: &str, parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("abseq-{tool}-");
        builder.prefix(&prefix);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        debug!(tool, path = %dir.path().display(), "Created tool workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write the single-record query FASTA and return its path
    pub fn write_query(&self, tool: &str, sequence: &str) -> Result<PathBuf> {
        fasta::write_query(self.file(&format!("{tool}_query.fasta")), tool, sequence)
    }

    /// Read a report the tool was expected to write
    pub fn read_report(&self, tool: &str, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(AbseqError::OutputMissing {
                tool: tool.to_string(),
                path: path.display().to_string(),
            });
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

/// A command line for one external tool
#[derive(Debug, Clone)]
pub struct ToolCommand {
    name: String,
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// `name` is used in logs and errors, `program` is what gets executed
    pub fn new(name: impl Into<String>, program: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command line as a single string, for logs
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion and fail unless the tool exits successfully
    pub async fn run(&self) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = self.current_dir {
            command.current_dir(dir);
        }

        debug!(tool = %self.name, command = %self.display(), "Starting external tool");
        let started = Instant::now();

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AbseqError::ToolNotFound(self.program.to_string_lossy().into_owned())
            } else {
                AbseqError::Io(e)
            }
        })?;

        let elapsed = started.elapsed();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "terminated by signal".to_string());
            warn!(tool = %self.name, %status, "External tool failed");
            return Err(AbseqError::Tool {
                tool: self.name.clone(),
                status,
                stderr: stderr_tail(&stderr),
            });
        }

        if !output.stdout.is_empty() {
            debug!(
                tool = %self.name,
                stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
                "Tool output"
            );
        }
        info!(
            tool = %self.name,
            elapsed_ms = elapsed.as_millis() as u64,
            "External tool finished"
        );

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
