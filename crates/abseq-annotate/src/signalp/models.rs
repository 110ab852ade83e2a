//! Signal peptide models

use serde::{Deserialize, Serialize};

/// Signal peptide prediction for one sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalPeptideAnnotation {
    pub has_signal: bool,
    /// Last residue of the signal peptide (1-based), as reported in `CS pos`
    pub cleavage_index: Option<u32>,
}

impl SignalPeptideAnnotation {
    /// No signal peptide predicted
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn cleaved_at(cleavage_index: u32) -> Self {
        Self {
            has_signal: true,
            cleavage_index: Some(cleavage_index),
        }
    }

    /// The mature chain once the signal peptide is removed
    pub fn mature_sequence<'a>(&self, sequence: &'a str) -> &'a str {
        match self.cleavage_index {
            Some(cut) if self.has_signal => sequence.get(cut as usize..).unwrap_or(""),
            _ => sequence,
        }
    }
}
