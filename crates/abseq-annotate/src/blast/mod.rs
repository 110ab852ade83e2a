//! BLAST searches and best-hit selection
//!
//! blastp finds the constant region of a chain and tblastn its germline
//! variable segment. Both reports are decoded from XML by [`BlastReport`] and
//! reduced to one [`AlignmentRecord`] by [`AlignmentHitSelector`].

pub mod models;
pub mod runner;
pub mod selector;
pub mod xml;

pub use models::{AlignmentCandidate, AlignmentHit, AlignmentRecord, Frame, SeqRange};
pub use runner::{find_constant_region, find_germline};
pub use selector::AlignmentHitSelector;
pub use xml::{BlastReport, QueryHits};
