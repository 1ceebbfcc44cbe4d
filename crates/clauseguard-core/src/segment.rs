//! Clause segmentation.
//!
//! Splits normalized contract text into addressable clause units on
//! structural markers (numbered articles, sections, 第N条-style headings),
//! assigning monotonically increasing IDs and byte offsets into the source.
//!
//! A marker-less document above the configured length threshold is rejected:
//! treating a whole contract as one clause would defeat every downstream
//! per-clause analysis.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::effect::EffectLexicon;
use crate::types::{Clause, ClauseId};

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error(
        "no structural markers found in {length} bytes of text (threshold {threshold}); \
         refusing to treat the document as a single clause"
    )]
    NoStructure { length: usize, threshold: usize },
}

// One pattern per marker convention, tried in order per line.
fn marker_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // "Article 12 (Termination)" / "Section 3." / "Clause 7:"
            r"(?i)^\s*(?:article|section|clause)\s+\d+[A-Za-z]?\s*(?:\(([^)]+)\))?[.:]?",
            // "§ 12" / "§12(1)"
            r"^\s*§\s*\d+",
            // "12." / "12)" at line start followed by prose
            r"^\s*\d{1,3}[.)]\s+\S",
            // "第12条（解除）"
            r"^\s*第\d+条(?:[（(]([^）)]+)[）)])?",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("marker pattern must compile"))
        .collect()
    })
}

/// Offset and optional heading of one structural marker.
struct MarkerHit {
    line_start: usize,
    heading: Option<String>,
}

fn find_marker(line: &str, line_start: usize) -> Option<MarkerHit> {
    for pattern in marker_patterns() {
        if let Some(caps) = pattern.captures(line) {
            let heading = caps
                .get(1)
                .map(|g| g.as_str().trim().to_string())
                .filter(|h| !h.is_empty());
            return Some(MarkerHit {
                line_start,
                heading,
            });
        }
    }
    None
}

/// Split normalized contract text into clauses.
///
/// `max_unstructured_len` bounds how much marker-less text is acceptable as
/// a single clause; longer marker-less input is a [`SegmentError`].
/// Side-effect-free.
pub fn segment(
    text: &str,
    lexicon: &EffectLexicon,
    max_unstructured_len: usize,
) -> Result<Vec<Clause>, SegmentError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut hits: Vec<MarkerHit> = Vec::new();
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        if let Some(hit) = find_marker(line.trim_end_matches('\n'), offset) {
            hits.push(hit);
        }
        offset += line.len();
    }

    if hits.is_empty() {
        if text.len() > max_unstructured_len {
            return Err(SegmentError::NoStructure {
                length: text.len(),
                threshold: max_unstructured_len,
            });
        }
        // Short fragment: acceptable as one clause.
        return Ok(vec![make_clause(ClauseId(0), None, text, 0, text.len(), lexicon)]);
    }

    let mut clauses = Vec::with_capacity(hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let start = hit.line_start;
        let end = hits.get(i + 1).map_or(text.len(), |next| next.line_start);
        clauses.push(make_clause(
            ClauseId(i as u32),
            hit.heading.clone(),
            &text[start..end],
            start,
            end,
            lexicon,
        ));
    }
    debug!(clauses = clauses.len(), "segmented document");
    Ok(clauses)
}

fn make_clause(
    id: ClauseId,
    heading: Option<String>,
    slice: &str,
    start_offset: usize,
    end_offset: usize,
    lexicon: &EffectLexicon,
) -> Clause {
    let text = slice.trim().to_string();
    let effects = lexicon.extract(&text);
    Clause {
        id,
        heading,
        text,
        start_offset,
        end_offset,
        effects,
    }
}
