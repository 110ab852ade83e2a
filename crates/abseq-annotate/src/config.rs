//! Annotation configuration
//!
//! Locations and parameters of the external tools. Values come from the
//! environment (optionally through a `.env` file) and fall back to the
//! defaults below; command line flags override both.

use abseq_common::{AbseqError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

/// Default ANARCI executable
pub const DEFAULT_ANARCI_BIN: &str = "ANARCI";

/// Default ANARCI numbering scheme (Kabat)
pub const DEFAULT_ANARCI_SCHEME: &str = "k";

/// Default blastp executable
pub const DEFAULT_BLASTP_BIN: &str = "blastp";

/// Default tblastn executable
pub const DEFAULT_TBLASTN_BIN: &str = "tblastn";

/// Default SignalP executable
pub const DEFAULT_SIGNALP_BIN: &str = "signalp";

/// Default constant-region protein database searched with blastp
pub const DEFAULT_CREGION_DB: &str = "./Database/cregion/cregion";

/// Default variable-region nucleotide database searched with tblastn
pub const DEFAULT_VREGION_DB: &str = "./Database/vregion/vregion";

/// Default BLAST thread count
pub const DEFAULT_BLAST_THREADS: u32 = 12;

/// Default blastp task; short queries need the short-word task
pub const DEFAULT_BLASTP_TASK: &str = "blastp-short";

/// Default tblastn e-value threshold
pub const DEFAULT_TBLASTN_EVALUE: f64 = 1000.0;

/// Full annotation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnnotateConfig {
    pub anarci: AnarciConfig,
    pub blast: BlastConfig,
    pub signalp: SignalpConfig,
    /// Parent directory for per-run temporary workspaces (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,
}

/// ANARCI settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnarciConfig {
    pub bin: String,
    /// Numbering scheme flag passed to `-s`
    pub scheme: String,
}

/// blastp / tblastn settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlastConfig {
    pub blastp_bin: String,
    pub tblastn_bin: String,
    /// Constant-region database (blastp)
    pub cregion_db: PathBuf,
    /// Variable-region database (tblastn)
    pub vregion_db: PathBuf,
    pub threads: u32,
    pub blastp_task: String,
    pub tblastn_evalue: f64,
}

/// SignalP settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalpConfig {
    pub bin: String,
}

impl Default for AnarciConfig {
    fn default() -> Self {
        Self {
            bin: DEFAULT_ANARCI_BIN.to_string(),
            scheme: DEFAULT_ANARCI_SCHEME.to_string(),
        }
    }
}

impl Default for BlastConfig {
    fn default() -> Self {
        Self {
            blastp_bin: DEFAULT_BLASTP_BIN.to_string(),
            tblastn_bin: DEFAULT_TBLASTN_BIN.to_string(),
            cregion_db: PathBuf::from(DEFAULT_CREGION_DB),
            vregion_db: PathBuf::from(DEFAULT_VREGION_DB),
            threads: DEFAULT_BLAST_THREADS,
            blastp_task: DEFAULT_BLASTP_TASK.to_string(),
            tblastn_evalue: DEFAULT_TBLASTN_EVALUE,
        }
    }
}

impl Default for SignalpConfig {
    fn default() -> Self {
        Self {
            bin: DEFAULT_SIGNALP_BIN.to_string(),
        }
    }
}

impl AnnotateConfig {
    /// Load configuration from `.env` and environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    ///
    /// - `ABSEQ_ANARCI_BIN`, `ABSEQ_ANARCI_SCHEME`
    /// - `ABSEQ_BLASTP_BIN`, `ABSEQ_TBLASTN_BIN`
    /// - `ABSEQ_CREGION_DB`, `ABSEQ_VREGION_DB`
    /// - `ABSEQ_BLAST_THREADS`, `ABSEQ_BLASTP_TASK`, `ABSEQ_TBLASTN_EVALUE`
    /// - `ABSEQ_SIGNALP_BIN`
    /// - `ABSEQ_TEMP_DIR`
    pub fn from_env() -> Result<Self> {
        let config = Self {
            anarci: AnarciConfig {
                bin: env_or("ABSEQ_ANARCI_BIN", DEFAULT_ANARCI_BIN),
                scheme: env_or("ABSEQ_ANARCI_SCHEME", DEFAULT_ANARCI_SCHEME),
            },
            blast: BlastConfig {
                blastp_bin: env_or("ABSEQ_BLASTP_BIN", DEFAULT_BLASTP_BIN),
                tblastn_bin: env_or("ABSEQ_TBLASTN_BIN", DEFAULT_TBLASTN_BIN),
                cregion_db: PathBuf::from(env_or("ABSEQ_CREGION_DB", DEFAULT_CREGION_DB)),
                vregion_db: PathBuf::from(env_or("ABSEQ_VREGION_DB", DEFAULT_VREGION_DB)),
                threads: env_parse("ABSEQ_BLAST_THREADS")?.unwrap_or(DEFAULT_BLAST_THREADS),
                blastp_task: env_or("ABSEQ_BLASTP_TASK", DEFAULT_BLASTP_TASK),
                tblastn_evalue: env_parse("ABSEQ_TBLASTN_EVALUE")?
                    .unwrap_or(DEFAULT_TBLASTN_EVALUE),
            },
            signalp: SignalpConfig {
                bin: env_or("ABSEQ_SIGNALP_BIN", DEFAULT_SIGNALP_BIN),
            },
            temp_dir: std::env::var("ABSEQ_TEMP_DIR").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let binaries = [
            ("ABSEQ_ANARCI_BIN", &self.anarci.bin),
            ("ABSEQ_BLASTP_BIN", &self.blast.blastp_bin),
            ("ABSEQ_TBLASTN_BIN", &self.blast.tblastn_bin),
            ("ABSEQ_SIGNALP_BIN", &self.signalp.bin),
        ];
        for (name, value) in binaries {
            if value.trim().is_empty() {
                return Err(AbseqError::Config(format!("{name} must not be empty")));
            }
        }
        if self.anarci.scheme.trim().is_empty() {
            return Err(AbseqError::Config("ABSEQ_ANARCI_SCHEME must not be empty".to_string()));
        }
        if self.blast.threads == 0 {
            return Err(AbseqError::Config(
                "ABSEQ_BLAST_THREADS must be greater than 0".to_string(),
            ));
        }
        if self.blast.tblastn_evalue.is_nan() || self.blast.tblastn_evalue <= 0.0 {
            return Err(AbseqError::Config(
                "ABSEQ_TBLASTN_EVALUE must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional variable; a set but malformed value is an error
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AbseqError::Config(format!("{name}='{raw}' is invalid: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnnotateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.anarci.scheme, "k");
        assert_eq!(config.blast.threads, 12);
        assert_eq!(config.blast.blastp_task, "blastp-short");
    }

    #[test]
    fn test_zero_threads_rejected() {
        let mut config = AnnotateConfig::default();
        config.blast.threads = 0;
        assert!(matches!(config.validate(), Err(AbseqError::Config(_))));
    }

    #[test]
    fn test_non_positive_evalue_rejected() {
        let mut config = AnnotateConfig::default();
        config.blast.tblastn_evalue = 0.0;
        assert!(config.validate().is_err());
        config.blast.tblastn_evalue = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_binary_rejected() {
        let mut config = AnnotateConfig::default();
        config.signalp.bin = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ABSEQ_SIGNALP_BIN"));
    }
}
