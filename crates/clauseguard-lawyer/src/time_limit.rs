//! Time-limit detection.
//!
//! Liability-type and termination-type clauses that state no period run
//! forever. A clause bearing a time-sensitive effect tag is flagged
//! `NO_TIME_LIMIT` when no temporal-bound proposition is derivable from its
//! text, using the same extraction as the FOL translator, so the detector and
//! the logic stage cannot disagree about what counts as a bound.
//!
//! Carve-outs: willful-misconduct/gross-negligence exclusions and express
//! deference to statutory periods are routinely left unbounded, and flagging
//! them would be noise.

use std::sync::OnceLock;

use regex::Regex;

use clauseguard_core::{
    CitationId, Clause, DetectorId, EffectTag, Finding, FindingSource, Severity,
};
use clauseguard_logic::extract_temporal_bounds;

const DETECTOR_CONFIDENCE: f64 = 0.7;

fn exception_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(?:willful misconduct|gross negligence|intentional (?:act|misconduct)|as (?:provided|prescribed) by (?:law|statute)|statutory (?:period|limitation)|故意|重過失|法令の定め)",
        )
        .expect("exception pattern must compile")
    })
}

/// Open-ended liability and warranty exposure outranks the rest.
fn severity_for(tags: &[EffectTag]) -> Severity {
    if tags.iter().any(|t| {
        matches!(
            t,
            EffectTag::Liability | EffectTag::Warranty | EffectTag::Indemnity
        )
    }) {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Flag the clause if a time-sensitive effect has no derivable bound.
pub fn detect(clause: &Clause) -> Vec<Finding> {
    let sensitive: Vec<EffectTag> = clause
        .effects
        .iter()
        .map(|e| e.tag)
        .filter(EffectTag::is_time_sensitive)
        .collect();
    if sensitive.is_empty() {
        return Vec::new();
    }
    if exception_pattern().is_match(&clause.text) {
        return Vec::new();
    }
    if !extract_temporal_bounds(&clause.text).is_empty() {
        return Vec::new();
    }

    let tag_list = sensitive
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    vec![Finding {
        clause_id: clause.id,
        source: FindingSource::Detector(DetectorId::NoTimeLimit),
        severity: severity_for(&sensitive),
        confidence: DETECTOR_CONFIDENCE,
        legal_basis: vec![CitationId("CIVIL_CODE_LIMITATION_PERIODS".into())],
        rationale: format!("no temporal bound stated for {tag_list}"),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clauseguard_core::{ClauseId, EffectLexicon};

    fn clause(text: &str) -> Clause {
        let lexicon = EffectLexicon::built_in();
        Clause {
            id: ClauseId(0),
            heading: None,
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len(),
            effects: lexicon.extract(text),
        }
    }

    #[test]
    fn unbounded_liability_is_high() {
        let f = detect(&clause(
            "The Supplier shall be liable for any defect in the delivered goods.",
        ));
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, Severity::High);
        assert_eq!(f[0].source, FindingSource::Detector(DetectorId::NoTimeLimit));
    }

    #[test]
    fn bounded_liability_is_clean() {
        let f = detect(&clause(
            "The Supplier shall be liable for defects notified within 2 years of delivery.",
        ));
        assert!(f.is_empty());
    }

    #[test]
    fn unbounded_termination_right_is_medium() {
        let f = detect(&clause("Either party may terminate this Agreement."));
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, Severity::Medium);
    }

    #[test]
    fn notice_period_counts_as_bound() {
        let f = detect(&clause(
            "Either party may terminate by giving 30 days' prior written notice.",
        ));
        assert!(f.is_empty());
    }

    #[test]
    fn fault_carve_out_is_exempt() {
        let f = detect(&clause(
            "The Supplier shall be liable without limit in cases of willful misconduct or \
             gross negligence.",
        ));
        assert!(f.is_empty(), "carve-out clauses are customarily unbounded");
    }

    #[test]
    fn statutory_deference_is_exempt() {
        let f = detect(&clause(
            "Warranty claims may be brought within the statutory period.",
        ));
        assert!(f.is_empty());
    }

    #[test]
    fn vague_japanese_term_clause_is_flagged() {
        // A contract-term clause that never states a date.
        let f = detect(&clause("契約期間は当事者が適宜定める"));
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].severity, Severity::Medium);
        assert!(f[0].rationale.contains("contract-term"));
    }

    #[test]
    fn non_time_sensitive_clause_is_ignored() {
        let f = detect(&clause("The Customer shall pay the fees monthly in arrears."));
        assert!(f.is_empty());
    }

    #[test]
    fn japanese_duration_counts_as_bound() {
        let f = detect(&clause("契約期間は2年間とする。"));
        assert!(f.is_empty());
    }
}
