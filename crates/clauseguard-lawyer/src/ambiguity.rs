//! Ambiguity detection.
//!
//! Three independent checks per clause, each free to fire on its own, so a
//! clause accumulates every ambiguity reason it earns:
//!
//! - a conditional marker whose consequence is never stated,
//! - a judgment-dependent action with no deciding party in reach,
//! - a referenced standard with no defined value.
//!
//! The vague-standard table keeps the handful of Japanese terms the
//! detection corpus was validated against alongside the English ones; the
//! table is data and grows per language pack.

use std::sync::OnceLock;

use regex::Regex;

use clauseguard_core::{
    CitationId, Clause, DetectorId, Finding, FindingSource, Severity,
};

const DETECTOR_CONFIDENCE: f64 = 0.7;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("ambiguity pattern must compile")
}

struct Patterns {
    conditional: Regex,
    consequence: Regex,
    judgment: Regex,
    party: Regex,
    vague: Vec<(Regex, &'static str)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        conditional: re(r"(?i)\b(?:if|unless|in the event(?: of| that)?|where|in case of)\b"),
        consequence: re(r"(?i)\b(?:shall|must|may|will|is entitled to|becomes|terminates)\b"),
        judgment: re(
            r"(?i)(?:shall be (?:determined|decided|approved|assessed|inspected|confirmed)|as deemed (?:appropriate|necessary|fit)|subject to approval|at (?:its|their) discretion)",
        ),
        party: re(
            r"(?:\bParty [A-Z]\b|\beither party\b|\bthe (?:Customer|Provider|Supplier|Company|Employee|Employer|Tenant|Landlord|Licensor|Licensee|Contractor)\b)",
        ),
        vague: vec![
            (re(r"(?i)\breasonable(?:\s|-)?(?:efforts?|time|period|costs?)?\b"), "reasonable"),
            (re(r"(?i)\bappropriate(?:ly)?\b"), "appropriate"),
            (re(r"(?i)\bpromptly\b"), "promptly"),
            (re(r"(?i)\bwithout undue delay\b"), "without undue delay"),
            (re(r"(?i)\bin a timely manner\b"), "timely"),
            (re(r"(?i)\bas necessary\b"), "as necessary"),
            (re(r"(?i)\bsatisfactory\b"), "satisfactory"),
            (re(r"(?i)\bjust cause\b"), "just cause"),
            (re(r"適宜"), "as-appropriate (適宜)"),
            (re(r"適切に"), "appropriately (適切に)"),
            (re(r"速やかに"), "promptly (速やかに)"),
            (re(r"遅滞なく"), "without delay (遅滞なく)"),
            (re(r"合理的"), "reasonable (合理的)"),
        ],
    })
}

fn finding(clause: &Clause, severity: Severity, rationale: String) -> Finding {
    Finding {
        clause_id: clause.id,
        source: FindingSource::Detector(DetectorId::AmbiguousClause),
        severity,
        confidence: DETECTOR_CONFIDENCE,
        legal_basis: vec![CitationId("CONTRACT_DRAFTING_PRACTICE".into())],
        rationale,
    }
}

/// Run all three ambiguity checks against one clause.
pub fn detect(clause: &Clause) -> Vec<Finding> {
    let p = patterns();
    let mut findings = Vec::new();

    // 1. Conditional without a stated consequence, sentence by sentence.
    for sentence in clause.text.split(['.', ';', '\n']) {
        if sentence.trim().len() < 8 {
            continue;
        }
        if p.conditional.is_match(sentence) && !p.consequence.is_match(sentence) {
            findings.push(finding(
                clause,
                Severity::Medium,
                format!(
                    "condition \"{}\" has no stated consequence of non-performance",
                    sentence.trim().chars().take(60).collect::<String>()
                ),
            ));
        }
    }

    // 2. Judgment-dependent term with no deciding party in the sentence.
    for sentence in clause.text.split(['.', ';', '\n']) {
        if let Some(m) = p.judgment.find(sentence) {
            if !p.party.is_match(sentence) {
                findings.push(finding(
                    clause,
                    Severity::High,
                    format!(
                        "\"{}\" does not specify which party decides",
                        m.as_str()
                    ),
                ));
            }
        }
    }

    // 3. Referenced standards with no defined value; each term once.
    for (pattern, label) in &p.vague {
        if pattern.is_match(&clause.text) {
            findings.push(finding(
                clause,
                Severity::Medium,
                format!("the standard \"{label}\" has no defined value or procedure"),
            ));
        }
    }

    findings
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

    #[test]
    fn conditional_without_consequence() {
        let f = detect(&clause("In the event of force majeure affecting either party."));
        assert!(f.iter().any(|f| f.rationale.contains("no stated consequence")));
    }

    #[test]
    fn conditional_with_consequence_is_fine() {
        let f = detect(&clause(
            "If delivery is late, the Customer may cancel the order.",
        ));
        assert!(!f.iter().any(|f| f.rationale.contains("no stated consequence")));
    }

    #[test]
    fn judgment_without_deciding_party_is_high() {
        let f = detect(&clause("Acceptance shall be determined upon inspection."));
        let hit = f
            .iter()
            .find(|f| f.rationale.contains("which party decides"))
            .expect("unclear subject should fire");
        assert_eq!(hit.severity, Severity::High);
    }

    #[test]
    fn judgment_with_named_party_passes() {
        let f = detect(&clause(
            "Acceptance shall be determined by the Customer upon inspection.",
        ));
        assert!(!f.iter().any(|f| f.rationale.contains("which party decides")));
    }

    #[test]
    fn vague_standards_accumulate() {
        let f = detect(&clause(
            "The Supplier shall remedy defects promptly and take appropriate measures \
             within a reasonable period.",
        ));
        let vague: Vec<_> = f
            .iter()
            .filter(|f| f.rationale.contains("no defined value"))
            .collect();
        assert!(vague.len() >= 3, "expected three vague standards, got {vague:?}");
        assert!(vague.iter().all(|f| f.severity == Severity::Medium));
    }

    #[test]
    fn japanese_vague_standard_detected() {
        let f = detect(&clause("契約期間は当事者が適宜定める"));
        assert!(
            f.iter()
                .any(|f| f.rationale.contains("適宜") && f.severity == Severity::Medium),
            "適宜 should register as an undefined standard"
        );
    }

    #[test]
    fn all_findings_carry_detector_source() {
        let f = detect(&clause("Work shall be performed promptly as deemed appropriate."));
        assert!(!f.is_empty());
        for finding in &f {
            assert_eq!(
                finding.source,
                FindingSource::Detector(DetectorId::AmbiguousClause)
            );
            assert!(!finding.legal_basis.is_empty());
        }
    }

    #[test]
    fn precise_clause_is_clean() {
        let f = detect(&clause(
            "The Supplier shall deliver the goods to the Customer within 30 days of the order.",
        ));
        assert!(f.is_empty(), "got {f:?}");
    }
}
