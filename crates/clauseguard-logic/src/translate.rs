//! Rule-based FOL translation.
//!
//! Deterministic extraction over the fixed predicate vocabulary, not a
//! semantic parser. Obligations and rights come from clause-role markers
//! (party + modal strength), conditions from conditional connectives,
//! temporal bounds from explicit duration expressions. Unextractable
//! fragments are dropped: translation is best-effort and lossy by design,
//! and the `coverage` figure is what keeps that honest downstream: the
//! verifier refuses to call a thinly-translated clause Sat.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use clauseguard_core::{
    Clause, Finding, FindingSource, PatternId, Predicate, Proposition,
};

/// Translation output: ordered propositions plus text coverage.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Insertion order follows textual order.
    pub propositions: Vec<Proposition>,
    /// Fraction of clause text contributing to at least one proposition.
    pub coverage: f64,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("translator pattern must compile")
}

struct Extractors {
    party: Regex,
    obligation_neg: Regex,
    obligation_pos: Regex,
    right_neg: Regex,
    right_pos: Regex,
    condition: Regex,
    temporal: Vec<Regex>,
}

fn extractors() -> &'static Extractors {
    static EXTRACTORS: OnceLock<Extractors> = OnceLock::new();
    EXTRACTORS.get_or_init(|| Extractors {
        party: re(
            r"(?:\bParty [A-Z]\b|\bthe (?:Customer|Provider|Supplier|Company|Employee|Employer|Tenant|Landlord|Licensor|Licensee|Contractor|Receiving Party|Disclosing Party)\b)",
        ),
        obligation_neg: re(r"(?i)\b(?:shall not|must not)\s+((?:\w+[-’']?)+(?:\s+\w+){0,2})"),
        obligation_pos: re(r"(?i)\b(?:shall|must)\s+((?:\w+[-’']?)+(?:\s+\w+){0,2})"),
        right_neg: re(r"(?i)\bmay not\s+((?:\w+[-’']?)+(?:\s+\w+){0,2})"),
        right_pos: re(r"(?i)\b(?:may|is entitled to)\s+((?:\w+[-’']?)+(?:\s+\w+){0,2})"),
        condition: re(
            r"(?i)\b(?:if|unless|provided that|in the event(?: of| that)?|subject to)\s+((?:\w+[-’']?)+(?:\s+\w+){0,2})",
        ),
        temporal: vec![
            re(r"(?i)\bwithin\s+(\d+|one|two|three|five|ten|thirty|sixty|ninety)\s+(?:calendar\s+|business\s+)?(days?|months?|years?)\b"),
            re(r"(?i)\bfor (?:a period of )?(\d+|one|two|three|five|ten)\s+(days?|months?|years?)\b"),
            re(r"(?i)\b(\d+)\s*(?:calendar\s+|business\s+)?days[’']?\s*(?:prior\s+)?(?:written\s+)?notice\b"),
            re(r"(?i)\bno later than\b"),
            re(r"(?i)\bexpir(?:y|es|ation) of the (?:term|period)\b"),
            re(r"(?i)\b(\d+|one|two|three|five|ten|twelve|thirty|sixty|ninety)\s+(?:calendar\s+|business\s+)?(days?|months?|years?)\b"),
            re(r"(\d+)\s*(?:年|ヶ月|か月|箇月|日)間?"),
        ],
    })
}

/// Normalize a captured action phrase into a ground argument.
fn norm_arg(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| {
            w.to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Extract temporal-bound propositions alone.
///
/// Shared with the time-limit detector: a clause "has a time limit" exactly
/// when this returns something.
pub fn extract_temporal_bounds(text: &str) -> Vec<Proposition> {
    let ex = extractors();
    let mut out = Vec::new();
    for pattern in &ex.temporal {
        for caps in pattern.captures_iter(text) {
            let args: Vec<String> = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|g| norm_arg(g.as_str()))
                .collect();
            let prop = Proposition {
                predicate: Predicate::TemporalBound,
                args: if args.is_empty() {
                    vec![norm_arg(caps.get(0).map(|g| g.as_str()).unwrap_or_default())]
                } else {
                    args
                },
                polarity: true,
            };
            if !out.contains(&prop) {
                out.push(prop);
            }
        }
    }
    out
}

/// Translate one clause (plus its raw findings) into propositions.
///
/// `risk_index` maps catalog pattern ids to the risk proposition they
/// assert; findings from those patterns contribute clause-level propositions
/// after the text-derived ones. Finding-derived propositions do not count
/// toward coverage; they describe the match, not the text.
pub fn translate(
    clause: &Clause,
    findings: &[Finding],
    risk_index: &HashMap<PatternId, Proposition>,
) -> Translation {
    let ex = extractors();
    let mut propositions: Vec<Proposition> = Vec::new();
    let mut covered = 0usize;
    let mut total = 0usize;

    for segment in clause.text.split(['.', ';', '\n']) {
        let weight = segment.chars().filter(|c| c.is_alphanumeric()).count();
        if weight < 3 {
            continue;
        }
        total += weight;
        let before = propositions.len();

        for m in ex.party.find_iter(segment) {
            push_unique(
                &mut propositions,
                Proposition::positive(Predicate::Party, &[&norm_arg(m.as_str())]),
            );
        }

        // Negated modals first so `shall not` is not read as `shall`.
        let mut neg_spans: Vec<(usize, usize)> = Vec::new();
        for caps in ex.obligation_neg.captures_iter(segment) {
            let whole = caps.get(0).unwrap();
            neg_spans.push((whole.start(), whole.end()));
            push_unique(
                &mut propositions,
                Proposition::negative(
                    Predicate::Obligation,
                    &[&norm_arg(caps.get(1).unwrap().as_str())],
                ),
            );
        }
        for caps in ex.right_neg.captures_iter(segment) {
            let whole = caps.get(0).unwrap();
            neg_spans.push((whole.start(), whole.end()));
            push_unique(
                &mut propositions,
                Proposition::negative(
                    Predicate::Right,
                    &[&norm_arg(caps.get(1).unwrap().as_str())],
                ),
            );
        }
        for caps in ex.obligation_pos.captures_iter(segment) {
            let whole = caps.get(0).unwrap();
            if overlaps(&neg_spans, whole.start()) {
                continue;
            }
            push_unique(
                &mut propositions,
                Proposition::positive(
                    Predicate::Obligation,
                    &[&norm_arg(caps.get(1).unwrap().as_str())],
                ),
            );
        }
        for caps in ex.right_pos.captures_iter(segment) {
            let whole = caps.get(0).unwrap();
            if overlaps(&neg_spans, whole.start()) {
                continue;
            }
            push_unique(
                &mut propositions,
                Proposition::positive(
                    Predicate::Right,
                    &[&norm_arg(caps.get(1).unwrap().as_str())],
                ),
            );
        }
        for caps in ex.condition.captures_iter(segment) {
            push_unique(
                &mut propositions,
                Proposition::positive(
                    Predicate::Condition,
                    &[&norm_arg(caps.get(1).unwrap().as_str())],
                ),
            );
        }
        for prop in extract_temporal_bounds(segment) {
            push_unique(&mut propositions, prop);
        }

        if propositions.len() > before {
            covered += weight;
        }
    }

    // Findings with mapped patterns assert their risk propositions.
    for finding in findings {
        if let FindingSource::Pattern(id) = &finding.source {
            if let Some(prop) = risk_index.get(id) {
                push_unique(&mut propositions, prop.clone());
            }
        }
    }

    let coverage = if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    };
    trace!(
        clause_id = %clause.id,
        propositions = propositions.len(),
        coverage,
        "translated clause"
    );
    Translation {
        propositions,
        coverage,
    }
}

fn push_unique(props: &mut Vec<Proposition>, prop: Proposition) {
    if !props.contains(&prop) {
        props.push(prop);
    }
}

fn overlaps(spans: &[(usize, usize)], pos: usize) -> bool {
    spans.iter().any(|&(start, end)| pos >= start && pos < end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clauseguard_core::ClauseId;

    fn clause(text: &str) -> Clause {
        Clause {
            id: ClauseId(0),
            heading: None,
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len(),
            effects: vec![],
        }
    }

    fn translate_text(text: &str) -> Translation {
        translate(&clause(text), &[], &HashMap::new())
    }

    #[test]
    fn shall_becomes_obligation() {
        let t = translate_text("The Supplier shall deliver the goods within 30 days.");
        assert!(t.propositions.iter().any(|p| p.predicate == Predicate::Obligation
            && p.polarity
            && p.args[0].starts_with("deliver")));
    }

    #[test]
    fn shall_not_is_negative_not_positive() {
        let t = translate_text("The Receiving Party shall not disclose the information.");
        let obligations: Vec<_> = t
            .propositions
            .iter()
            .filter(|p| p.predicate == Predicate::Obligation)
            .collect();
        assert_eq!(obligations.len(), 1);
        assert!(!obligations[0].polarity);
        assert!(obligations[0].args[0].starts_with("disclose"));
    }

    #[test]
    fn may_becomes_right() {
        let t = translate_text("The Customer may suspend payment if delivery is late.");
        assert!(t
            .propositions
            .iter()
            .any(|p| p.predicate == Predicate::Right && p.polarity));
        assert!(t
            .propositions
            .iter()
            .any(|p| p.predicate == Predicate::Condition));
    }

    #[test]
    fn parties_are_extracted() {
        let t = translate_text("Party A shall notify the Customer.");
        let parties: Vec<_> = t
            .propositions
            .iter()
            .filter(|p| p.predicate == Predicate::Party)
            .collect();
        assert_eq!(parties.len(), 2);
    }

    #[test]
    fn temporal_bounds_from_durations() {
        let bounds = extract_temporal_bounds(
            "The warranty runs for a period of 2 years; claims must be made within thirty days.",
        );
        assert_eq!(bounds.len(), 2);
        assert!(bounds.iter().all(|p| p.predicate == Predicate::TemporalBound));
    }

    #[test]
    fn vague_term_clause_extracts_nothing_temporal() {
        let bounds =
            extract_temporal_bounds("The contract period shall be determined as appropriate.");
        assert!(bounds.is_empty());
    }

    #[test]
    fn untranslatable_text_has_zero_coverage() {
        // Vague Japanese renewal term with no extractable structure.
        let t = translate_text("契約期間は当事者が適宜定める");
        assert!(t.propositions.is_empty());
        assert_eq!(t.coverage, 0.0);
    }

    #[test]
    fn coverage_reflects_untranslated_fragments() {
        let t = translate_text(
            "The Supplier shall deliver the goods within 30 days. \
             Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod.",
        );
        assert!(t.coverage > 0.0 && t.coverage < 1.0, "coverage {}", t.coverage);
    }

    #[test]
    fn findings_contribute_risk_propositions() {
        let prop = Proposition::positive(Predicate::Obligation, &["liability-exemption-unlimited"]);
        let pattern = PatternId("ng.generic.blanket-liability-exemption".into());
        let mut index = HashMap::new();
        index.insert(pattern.clone(), prop.clone());
        let finding = Finding {
            clause_id: ClauseId(0),
            source: FindingSource::Pattern(pattern),
            severity: clauseguard_core::Severity::Critical,
            confidence: 0.85,
            legal_basis: vec![],
            rationale: "test".into(),
        };
        let t = translate(
            &clause("In no event shall the Provider be liable for any damages."),
            &[finding],
            &index,
        );
        assert!(t.propositions.contains(&prop));
    }

    #[test]
    fn propositions_follow_textual_order() {
        let t = translate_text(
            "If the goods are defective, the Customer may reject them. \
             The Supplier shall replace rejected goods within 14 days.",
        );
        let cond_pos = t
            .propositions
            .iter()
            .position(|p| p.predicate == Predicate::Condition)
            .unwrap();
        let bound_pos = t
            .propositions
            .iter()
            .position(|p| p.predicate == Predicate::TemporalBound)
            .unwrap();
        assert!(cond_pos < bound_pos);
    }

    #[test]
    fn repeated_marker_deduplicates() {
        let t = translate_text("The Supplier shall pay. The Supplier shall pay.");
        let count = t
            .propositions
            .iter()
            .filter(|p| p.predicate == Predicate::Obligation)
            .count();
        assert_eq!(count, 1);
    }
}
