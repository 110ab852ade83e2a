//! BLAST alignment models

use serde::{Deserialize, Serialize};

/// Inclusive 1-based coordinates as BLAST reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqRange {
    pub start: u64,
    pub end: u64,
}

impl SeqRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of positions covered, whichever direction the range runs
    pub fn span(&self) -> u64 {
        self.start.abs_diff(self.end) + 1
    }
}

/// Reading frames of query and subject (0 when not translated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub query: i8,
    pub subject: i8,
}

/// One candidate hit for a query: the hit and its first HSP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentCandidate {
    pub bit_score: f64,
    pub e_value: f64,
    pub raw_score: f64,
    pub identities: u32,
    pub positives: u32,
    pub gaps: u32,
    pub align_length: u32,
    pub subject_length: u32,
    pub query_range: SeqRange,
    pub subject_range: SeqRange,
    /// Aligned query text, gaps included
    pub matched_query: String,
    /// Aligned subject text, gaps included
    pub matched_subject: String,
    /// Match line between the two aligned strings
    pub midline: String,
    /// "Plus"/"Minus" for translated subjects, absent for protein-protein hits
    pub strand: Option<String>,
    pub frame: Frame,
    /// `hit_id` and `hit_def` joined by a space
    pub title: String,
    pub accession: String,
    pub hit_id: String,
    pub hit_def: String,
    /// HSPs the hit carried; only the first is represented here
    pub hsp_count: usize,
}

impl AlignmentCandidate {
    /// `identities / align_length`, `None` for an empty alignment
    pub fn identity_ratio(&self) -> Option<f64> {
        (self.align_length > 0).then(|| f64::from(self.identities) / f64::from(self.align_length))
    }

    /// `align_length / subject_length`, `None` for an empty subject
    pub fn coverage_ratio(&self) -> Option<f64> {
        (self.subject_length > 0)
            .then(|| f64::from(self.align_length) / f64::from(self.subject_length))
    }
}

/// The selected candidate plus its derived ratios
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentHit {
    /// Query definition line, when the hit came from a decoded report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    #[serde(flatten)]
    pub candidate: AlignmentCandidate,
    /// In [0, 1]
    pub identity_ratio: f64,
    /// Greater than 0
    pub coverage_ratio: f64,
}

/// Outcome of hit selection for one query
///
/// Either a hit or the no-hit marker; a no-hit record carries nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentRecord {
    no_hit: bool,
    #[serde(flatten)]
    hit: Option<AlignmentHit>,
}

impl AlignmentRecord {
    /// Record for a query without any candidate
    pub fn no_hit() -> Self {
        Self {
            no_hit: true,
            hit: None,
        }
    }

    pub(crate) fn from_hit(hit: AlignmentHit) -> Self {
        Self {
            no_hit: false,
            hit: Some(hit),
        }
    }

    pub fn is_no_hit(&self) -> bool {
        self.no_hit
    }

    pub fn hit(&self) -> Option<&AlignmentHit> {
        self.hit.as_ref()
    }

    pub(crate) fn with_query_name(mut self, name: Option<String>) -> Self {
        if let Some(hit) = self.hit.as_mut() {
            hit.query_name = name;
        }
        self
    }
}
