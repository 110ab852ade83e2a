//! BLAST XML (`-outfmt 5`) decoder
//!
//! Turns the XML report into one [`QueryHits`] per `<Iteration>`, each holding
//! that query's candidates in report order. A candidate is built from a `<Hit>`
//! and its first `<Hsp>`.
//!
//! The serde pass trims element text, which would shift a midline that starts
//! or ends with a mismatch column. The aligned strings are therefore read a
//! second time with a raw event reader that keeps whitespace.
//!
//! # Format
//! ```text
//! <BlastOutput>
//!   <BlastOutput_program>blastp</BlastOutput_program>
//!   <BlastOutput_iterations>
//!     <Iteration>
//!       <Iteration_query-def>blastp_query_sequence</Iteration_query-def>
//!       <Iteration_hits>
//!         <Hit>
//!           <Hit_id>gnl|BL_ORD_ID|3</Hit_id>
//!           <Hit_def>IGHG1_HUMAN</Hit_def>
//!           <Hit_len>330</Hit_len>
//!           <Hit_hsps><Hsp>...</Hsp></Hit_hsps>
//!         </Hit>
//!       </Iteration_hits>
//!     </Iteration>
//!   </BlastOutput_iterations>
//! </BlastOutput>
//! ```

use abseq_common::{FormatError, FormatResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::models::{AlignmentCandidate, AlignmentRecord, Frame, SeqRange};
use super::selector::AlignmentHitSelector;

// ============================================================================
// Raw XML shape
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawBlastOutput {
    #[serde(rename = "BlastOutput_program", default)]
    program: Option<String>,
    #[serde(rename = "BlastOutput_db", default)]
    database: Option<String>,
    #[serde(rename = "BlastOutput_iterations", default)]
    iterations: RawIterations,
}

#[derive(Debug, Default, Deserialize)]
struct RawIterations {
    #[serde(rename = "Iteration", default)]
    items: Vec<RawIteration>,
}

#[derive(Debug, Deserialize)]
struct RawIteration {
    #[serde(rename = "Iteration_query-ID", default)]
    query_id: Option<String>,
    #[serde(rename = "Iteration_query-def", default)]
    query_def: Option<String>,
    #[serde(rename = "Iteration_query-len", default)]
    query_len: Option<u64>,
    #[serde(rename = "Iteration_hits", default)]
    hits: RawHits,
    #[serde(rename = "Iteration_message", default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHits {
    #[serde(rename = "Hit", default)]
    items: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "Hit_id", default)]
    id: Option<String>,
    #[serde(rename = "Hit_def", default)]
    def: Option<String>,
    #[serde(rename = "Hit_accession", default)]
    accession: Option<String>,
    #[serde(rename = "Hit_len", default)]
    len: Option<u32>,
    #[serde(rename = "Hit_hsps", default)]
    hsps: RawHsps,
}

#[derive(Debug, Default, Deserialize)]
struct RawHsps {
    #[serde(rename = "Hsp", default)]
    items: Vec<RawHsp>,
}

#[derive(Debug, Deserialize)]
struct RawHsp {
    #[serde(rename = "Hsp_bit-score", default)]
    bit_score: Option<f64>,
    #[serde(rename = "Hsp_score", default)]
    score: Option<f64>,
    #[serde(rename = "Hsp_evalue", default)]
    evalue: Option<f64>,
    #[serde(rename = "Hsp_query-from", default)]
    query_from: Option<u64>,
    #[serde(rename = "Hsp_query-to", default)]
    query_to: Option<u64>,
    #[serde(rename = "Hsp_hit-from", default)]
    hit_from: Option<u64>,
    #[serde(rename = "Hsp_hit-to", default)]
    hit_to: Option<u64>,
    #[serde(rename = "Hsp_query-frame", default)]
    query_frame: Option<i8>,
    #[serde(rename = "Hsp_hit-frame", default)]
    hit_frame: Option<i8>,
    #[serde(rename = "Hsp_identity", default)]
    identity: Option<u32>,
    #[serde(rename = "Hsp_positive", default)]
    positive: Option<u32>,
    #[serde(rename = "Hsp_gaps", default)]
    gaps: Option<u32>,
    #[serde(rename = "Hsp_align-len", default)]
    align_len: Option<u32>,
    #[serde(rename = "Hsp_qseq", default)]
    qseq: Option<String>,
    #[serde(rename = "Hsp_hseq", default)]
    hseq: Option<String>,
    #[serde(rename = "Hsp_midline", default)]
    midline: Option<String>,
}

// ============================================================================
// Untrimmed alignment strings
// ============================================================================

/// `Hsp_qseq`, `Hsp_hseq` and `Hsp_midline` of one `<Hsp>`, whitespace intact
#[derive(Debug, Default)]
struct HspText {
    qseq: Option<String>,
    hseq: Option<String>,
    midline: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum AlignedField {
    Query,
    Subject,
    Midline,
}

impl AlignedField {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"Hsp_qseq" => Some(Self::Query),
            b"Hsp_hseq" => Some(Self::Subject),
            b"Hsp_midline" => Some(Self::Midline),
            _ => None,
        }
    }
}

impl HspText {
    fn slot(&mut self, field: AlignedField) -> &mut Option<String> {
        match field {
            AlignedField::Query => &mut self.qseq,
            AlignedField::Subject => &mut self.hseq,
            AlignedField::Midline => &mut self.midline,
        }
    }
}

fn xml_error(e: impl std::fmt::Display) -> FormatError {
    FormatError::Xml(e.to_string())
}

/// Aligned strings of every `<Hsp>` in document order
fn read_alignment_text(content: &str) -> FormatResult<Vec<HspText>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut hsps: Vec<HspText> = Vec::new();
    let mut open: Option<AlignedField> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.name().as_ref() == b"Hsp" => hsps.push(HspText::default()),
            Event::Start(e) => {
                open = AlignedField::from_tag(e.name().as_ref());
                if let (Some(field), Some(hsp)) = (open, hsps.last_mut()) {
                    *hsp.slot(field) = Some(String::new());
                }
            },
            Event::Empty(e) => {
                if let (Some(field), Some(hsp)) =
                    (AlignedField::from_tag(e.name().as_ref()), hsps.last_mut())
                {
                    *hsp.slot(field) = Some(String::new());
                }
            },
            Event::Text(text) => {
                if let (Some(field), Some(hsp)) = (open, hsps.last_mut()) {
                    let text = text.unescape().map_err(xml_error)?;
                    hsp.slot(field).get_or_insert_with(String::new).push_str(&text);
                }
            },
            Event::End(_) => open = None,
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(hsps)
}

/// Put the untrimmed strings back into the serde-decoded HSPs
fn restore_alignment_text(raw: &mut RawBlastOutput, texts: Vec<HspText>) -> FormatResult<()> {
    let hsps: Vec<&mut RawHsp> = raw
        .iterations
        .items
        .iter_mut()
        .flat_map(|iteration| iteration.hits.items.iter_mut())
        .flat_map(|hit| hit.hsps.items.iter_mut())
        .collect();

    if hsps.len() != texts.len() {
        return Err(FormatError::Xml(format!(
            "found {} <Hsp> elements but decoded {}",
            texts.len(),
            hsps.len()
        )));
    }

    for (hsp, text) in hsps.into_iter().zip(texts) {
        if text.qseq.is_some() {
            hsp.qseq = text.qseq;
        }
        if text.hseq.is_some() {
            hsp.hseq = text.hseq;
        }
        if text.midline.is_some() {
            hsp.midline = text.midline;
        }
    }
    Ok(())
}

// ============================================================================
// Decoded report
// ============================================================================

/// Candidates reported for one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHits {
    pub query_id: Option<String>,
    /// Query definition line (the FASTA header)
    pub query_name: Option<String>,
    pub query_length: Option<u64>,
    /// In BLAST's own order
    pub candidates: Vec<AlignmentCandidate>,
    /// e.g. "No hits found"
    pub message: Option<String>,
}

impl QueryHits {
    /// Run hit selection over this query's candidates
    pub fn select_best(&self) -> FormatResult<AlignmentRecord> {
        AlignmentHitSelector::new()
            .select(&self.candidates)
            .map(|record| record.with_query_name(self.query_name.clone()))
    }
}

/// A decoded BLAST XML report
#[derive(Debug, Clone, PartialEq)]
pub struct BlastReport {
    pub program: Option<String>,
    pub database: Option<String>,
    pub queries: Vec<QueryHits>,
}

impl BlastReport {
    /// Decode BLAST XML text
    pub fn parse(content: &str) -> FormatResult<Self> {
        let mut raw: RawBlastOutput = quick_xml::de::from_str(content).map_err(xml_error)?;
        restore_alignment_text(&mut raw, read_alignment_text(content)?)?;

        let queries = raw
            .iterations
            .items
            .into_iter()
            .map(QueryHits::try_from)
            .collect::<FormatResult<Vec<_>>>()?;

        debug!(
            program = raw.program.as_deref().unwrap_or("unknown"),
            queries = queries.len(),
            "Decoded BLAST XML report"
        );

        Ok(Self {
            program: raw.program,
            database: raw.database,
            queries,
        })
    }

    /// Decode a BLAST XML file
    pub fn parse_file(path: &Path) -> abseq_common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content)?)
    }

    /// The report's only query; runs submit exactly one sequence
    pub fn single_query(&self) -> FormatResult<&QueryHits> {
        match self.queries.as_slice() {
            [query] => Ok(query),
            [] => Err(FormatError::missing_field("Iteration")),
            many => Err(FormatError::Xml(format!(
                "expected a single query iteration, found {}",
                many.len()
            ))),
        }
    }
}

impl TryFrom<RawIteration> for QueryHits {
    type Error = FormatError;

    fn try_from(raw: RawIteration) -> FormatResult<Self> {
        let candidates = raw
            .hits
            .items
            .into_iter()
            .map(AlignmentCandidate::try_from)
            .collect::<FormatResult<Vec<_>>>()?;

        Ok(Self {
            query_id: raw.query_id,
            query_name: raw.query_def,
            query_length: raw.query_len,
            candidates,
            message: raw.message,
        })
    }
}

impl TryFrom<RawHit> for AlignmentCandidate {
    type Error = FormatError;

    fn try_from(hit: RawHit) -> FormatResult<Self> {
        let hsp_count = hit.hsps.items.len();
        let hsp = hit
            .hsps
            .items
            .into_iter()
            .next()
            .ok_or_else(|| FormatError::missing_field("Hsp"))?;

        let hit_id = require(hit.id, "Hit_id")?;
        let hit_def = hit.def.unwrap_or_default();
        let frame = Frame {
            query: hsp.query_frame.unwrap_or(0),
            subject: hsp.hit_frame.unwrap_or(0),
        };

        Ok(AlignmentCandidate {
            bit_score: require(hsp.bit_score, "Hsp_bit-score")?,
            e_value: require(hsp.evalue, "Hsp_evalue")?,
            raw_score: require(hsp.score, "Hsp_score")?,
            identities: require(hsp.identity, "Hsp_identity")?,
            positives: require(hsp.positive, "Hsp_positive")?,
            gaps: hsp.gaps.unwrap_or(0),
            align_length: require(hsp.align_len, "Hsp_align-len")?,
            subject_length: require(hit.len, "Hit_len")?,
            query_range: SeqRange::new(
                require(hsp.query_from, "Hsp_query-from")?,
                require(hsp.query_to, "Hsp_query-to")?,
            ),
            subject_range: SeqRange::new(
                require(hsp.hit_from, "Hsp_hit-from")?,
                require(hsp.hit_to, "Hsp_hit-to")?,
            ),
            matched_query: require(hsp.qseq, "Hsp_qseq")?,
            matched_subject: require(hsp.hseq, "Hsp_hseq")?,
            midline: hsp.midline.unwrap_or_default(),
            strand: strand_of(frame.subject),
            frame,
            title: format!("{hit_id} {hit_def}"),
            accession: hit.accession.unwrap_or_default(),
            hit_id,
            hit_def,
            hsp_count,
        })
    }
}

fn require<T>(value: Option<T>, field: &str) -> FormatResult<T> {
    value.ok_or_else(|| FormatError::missing_field(field))
}

/// Translated subjects carry a signed frame; its sign is the strand
fn strand_of(frame: i8) -> Option<String> {
    match frame.signum() {
        1 => Some("Plus".to_string()),
        -1 => Some("Minus".to_string()),
        _ => None,
    }
}
