//! Best-hit selection among a query's BLAST candidates
//!
//! BLAST orders hits by e-value. For antibody constant and germline lookups a
//! long, moderately similar hit often outranks a shorter near-identical one, so
//! candidates are re-ranked by `raw_score * identity_ratio^2` and the highest
//! value wins. Equal values keep the earliest candidate in BLAST's order.

use abseq_common::{FormatError, FormatResult};
use tracing::debug;

use super::models::{AlignmentCandidate, AlignmentHit, AlignmentRecord};

/// Selects one [`AlignmentRecord`] from an ordered candidate list
#[derive(Debug, Default, Clone, Copy)]
pub struct AlignmentHitSelector;

impl AlignmentHitSelector {
    pub fn new() -> Self {
        Self
    }

    /// Pick the best candidate and derive its ratios
    ///
    /// An empty slice gives [`AlignmentRecord::no_hit`]. Every candidate must be
    /// scorable; one that is not fails the whole selection.
    pub fn select(&self, candidates: &[AlignmentCandidate]) -> FormatResult<AlignmentRecord> {
        let Some(index) = self.best_index(candidates)? else {
            debug!("No BLAST candidates");
            return Ok(AlignmentRecord::no_hit());
        };

        let selected = &candidates[index];
        let identity_ratio = identity_ratio(index, selected)?;
        let coverage_ratio = selected.coverage_ratio().ok_or_else(|| {
            FormatError::InvalidCandidate {
                index,
                message: "subject_length is 0".to_string(),
            }
        })?;

        debug!(
            index,
            candidates = candidates.len(),
            accession = %selected.accession,
            identity_ratio,
            coverage_ratio,
            "Selected BLAST hit"
        );

        Ok(AlignmentRecord::from_hit(AlignmentHit {
            query_name: None,
            candidate: selected.clone(),
            identity_ratio,
            coverage_ratio,
        }))
    }

    /// Position of the candidate with the highest re-ranked score
    ///
    /// Only a strictly greater score replaces the current best, so the first
    /// of several equal candidates is returned.
    pub fn best_index(&self, candidates: &[AlignmentCandidate]) -> FormatResult<Option<usize>> {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let score = rescored(index, candidate)?;
            match best {
                Some((_, top)) if score <= top => {},
                _ => best = Some((index, score)),
            }
        }

        Ok(best.map(|(index, _)| index))
    }
}

fn identity_ratio(index: usize, candidate: &AlignmentCandidate) -> FormatResult<f64> {
    if candidate.identities > candidate.align_length {
        return Err(FormatError::InvalidCandidate {
            index,
            message: format!(
                "identities ({}) exceed align_length ({})",
                candidate.identities, candidate.align_length
            ),
        });
    }

    candidate.identity_ratio().ok_or_else(|| FormatError::InvalidCandidate {
        index,
        message: "align_length is 0".to_string(),
    })
}

fn rescored(index: usize, candidate: &AlignmentCandidate) -> FormatResult<f64> {
    let ratio = identity_ratio(index, candidate)?;
    let score = candidate.raw_score * ratio * ratio;
    if !score.is_finite() {
        return Err(FormatError::InvalidCandidate {
            index,
            message: format!("raw_score {} is not a finite number", candidate.raw_score),
        });
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blast::models::{Frame, SeqRange};
    use proptest::prelude::*;

    fn candidate(accession: &str, raw_score: f64, identities: u32, align_length: u32) -> AlignmentCandidate {
        AlignmentCandidate {
            bit_score: raw_score / 2.0,
            e_value: 1e-20,
            raw_score,
            identities,
            positives: identities,
            gaps: 0,
            align_length,
            subject_length: 100,
            query_range: SeqRange::new(1, u64::from(align_length)),
            subject_range: SeqRange::new(1, u64::from(align_length)),
            matched_query: String::new(),
            matched_subject: String::new(),
            midline: String::new(),
            strand: None,
            frame: Frame::default(),
            title: format!("gnl|BL_ORD_ID|0 {accession}"),
            accession: accession.to_string(),
            hit_id: "gnl|BL_ORD_ID|0".to_string(),
            hit_def: accession.to_string(),
            hsp_count: 1,
        }
    }

    #[test]
    fn test_empty_candidates_is_no_hit() {
        let record = AlignmentHitSelector::new().select(&[]).unwrap();
        assert!(record.is_no_hit());
        assert!(record.hit().is_none());
    }

    #[test]
    fn test_identity_outweighs_raw_score() {
        // 500 * 0.5^2 = 125 versus 200 * 1.0^2 = 200
        let candidates = vec![candidate("long", 500.0, 50, 100), candidate("exact", 200.0, 40, 40)];
        let record = AlignmentHitSelector::new().select(&candidates).unwrap();
        let hit = record.hit().unwrap();
        assert_eq!(hit.candidate.accession, "exact");
        assert_eq!(hit.identity_ratio, 1.0);
        assert!((hit.coverage_ratio - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let candidates = vec![
            candidate("first", 100.0, 10, 10),
            candidate("second", 100.0, 20, 20),
            candidate("third", 25.0, 10, 10),
        ];
        assert_eq!(AlignmentHitSelector::new().best_index(&candidates).unwrap(), Some(0));
    }

    #[test]
    fn test_zero_align_length_is_rejected() {
        let candidates = vec![candidate("ok", 100.0, 10, 10), candidate("empty", 100.0, 0, 0)];
        let err = AlignmentHitSelector::new().select(&candidates).unwrap_err();
        assert!(matches!(err, FormatError::InvalidCandidate { index: 1, .. }));
    }

    #[test]
    fn test_zero_subject_length_is_rejected() {
        let mut only = candidate("x", 100.0, 10, 10);
        only.subject_length = 0;
        let err = AlignmentHitSelector::new().select(&[only]).unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidCandidate {
                index: 0,
                message: "subject_length is 0".to_string()
            }
        );
    }

    #[test]
    fn test_identities_above_length_is_rejected() {
        let err = AlignmentHitSelector::new()
            .select(&[candidate("x", 100.0, 11, 10)])
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidCandidate { index: 0, .. }));
    }

    fn arb_candidate() -> impl Strategy<Value = AlignmentCandidate> {
        (0u32..2000, 1u32..300)
            .prop_flat_map(|(score, len)| (Just(score), Just(len), 0..=len))
            .prop_map(|(score, len, ident)| candidate("p", f64::from(score), ident, len))
    }

    proptest! {
        #[test]
        fn prop_selects_earliest_maximum(candidates in prop::collection::vec(arb_candidate(), 1..12)) {
            let record = AlignmentHitSelector::new().select(&candidates).unwrap();
            let hit = record.hit().unwrap();

            let scores: Vec<f64> = candidates
                .iter()
                .map(|c| {
                    let r = f64::from(c.identities) / f64::from(c.align_length);
                    c.raw_score * r * r
                })
                .collect();
            let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let expected = scores.iter().position(|s| *s == max).unwrap();

            prop_assert_eq!(&hit.candidate, &candidates[expected]);
            prop_assert!((0.0..=1.0).contains(&hit.identity_ratio));
            prop_assert!(hit.coverage_ratio > 0.0);
        }
    }
}
