//! V-region annotation model

use serde::{Deserialize, Serialize};

/// One numbered variable domain found in a query sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VRegionAnnotation {
    /// Total number of domains the report announced (same for every block)
    pub region_count: u32,
    /// Species of the most significant HMM hit (e.g. "human")
    pub species: String,
    /// Chain type code (e.g. "H", "K", "L")
    pub chain_type: String,
    /// First query position covered by the domain (0-based)
    pub start_index: usize,
    /// One past the last query position covered by the domain
    pub end_index: usize,
    /// Numbered residues in report order; gaps appear as "-"
    pub residue_sequence: Vec<String>,
    /// Numbering label per residue, with the insertion code appended (e.g. "82A")
    pub position_labels: Vec<String>,
}

impl VRegionAnnotation {
    /// Number of numbered positions in the domain
    pub fn len(&self) -> usize {
        self.residue_sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residue_sequence.is_empty()
    }

    /// The residues joined into a sequence string, gaps removed
    pub fn ungapped_sequence(&self) -> String {
        self.residue_sequence
            .iter()
            .filter(|r| r.as_str() != "-")
            .map(String::as_str)
            .collect()
    }

    /// Residue numbered with `label`, if present
    pub fn residue_at(&self, label: &str) -> Option<&str> {
        self.position_labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.residue_sequence[i].as_str())
    }
}
