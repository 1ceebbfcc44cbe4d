//! Verdict card rendering.
//!
//! One compact card per clause: severity badge, findings with their sources
//! and legal bases, the verification line, and any proposed rewrite.

use clauseguard_core::{FindingSource, Severity, Verdict, VerifyStatus};

const RULE: &str = "────────────────────────────────────────";

fn badge(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[CRITICAL]",
        Severity::High => "[HIGH]    ",
        Severity::Medium => "[MEDIUM]  ",
        Severity::Low => "[LOW]     ",
        Severity::Safe => "[SAFE]    ",
    }
}

fn source_label(source: &FindingSource) -> String {
    match source {
        FindingSource::Pattern(id) => id.0.clone(),
        FindingSource::Detector(id) => id.as_str().to_string(),
    }
}

/// Render one verdict as a card.
pub fn render_verdict(verdict: &Verdict) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} clause {}\n",
        badge(verdict.final_severity),
        verdict.clause_id
    ));

    for finding in &verdict.findings {
        let basis: Vec<&str> = finding.legal_basis.iter().map(|c| c.0.as_str()).collect();
        out.push_str(&format!(
            "  - {} {} ({:.0}%) {}\n",
            finding.severity,
            source_label(&finding.source),
            finding.confidence * 100.0,
            finding.rationale,
        ));
        if !basis.is_empty() {
            out.push_str(&format!("      basis: {}\n", basis.join(", ")));
        }
    }

    if let Some(verification) = &verdict.verification {
        let status = match verification.status {
            VerifyStatus::Sat => "SAT",
            VerifyStatus::Unsat => "UNSAT",
            VerifyStatus::Unknown => "UNKNOWN",
        };
        out.push_str(&format!(
            "  verification: {status} ({} ms)\n",
            verification.elapsed.as_millis()
        ));
        for prop in &verification.unsat_core {
            out.push_str(&format!("      core: {prop}\n"));
        }
    }

    if let Some(rewrite) = &verdict.rewrite {
        out.push_str(&format!("  rewrite: {}\n", rewrite.proposed_text));
    }

    out
}

/// Render the whole report in document order with a summary header.
pub fn render_report(verdicts: &[Verdict]) -> String {
    let mut out = String::new();
    let flagged = verdicts
        .iter()
        .filter(|v| v.final_severity > Severity::Safe)
        .count();
    out.push_str(&format!(
        "{RULE}\n{} clauses analyzed, {} flagged\n{RULE}\n",
        verdicts.len(),
        flagged
    ));
    for verdict in verdicts {
        out.push_str(&render_verdict(verdict));
        out.push_str(&format!("{RULE}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clauseguard_core::{
        CitationId, ClauseId, DetectorId, Finding, Predicate, Proposition, Rewrite,
        VerificationResult,
    };
    use std::time::Duration;

    fn verdict() -> Verdict {
        let core = vec![
            Proposition::positive(Predicate::Obligation, &["waive-all-claims"]),
            Proposition::negative(Predicate::Obligation, &["waive-all-claims"]),
        ];
        Verdict {
            clause_id: ClauseId(2),
            final_severity: Severity::Critical,
            findings: vec![Finding {
                clause_id: ClauseId(2),
                source: FindingSource::Detector(DetectorId::AmbiguousClause),
                severity: Severity::Medium,
                confidence: 0.7,
                legal_basis: vec![CitationId("CONTRACT_DRAFTING_PRACTICE".into())],
                rationale: "the standard \"reasonable\" has no defined value or procedure".into(),
            }],
            verification: Some(VerificationResult {
                clause_id: ClauseId(2),
                status: VerifyStatus::Unsat,
                unsat_core: core.clone(),
                elapsed: Duration::from_millis(3),
            }),
            rewrite: Rewrite::proof_carrying((0, 10), "Bound the waiver.".into(), core),
        }
    }

    #[test]
    fn card_shows_badge_findings_and_core() {
        let card = render_verdict(&verdict());
        assert!(card.contains("[CRITICAL]"));
        assert!(card.contains("AMBIGUOUS_CLAUSE"));
        assert!(card.contains("basis: CONTRACT_DRAFTING_PRACTICE"));
        assert!(card.contains("verification: UNSAT"));
        assert!(card.contains("core: Obligation(waive-all-claims)"));
        assert!(card.contains("rewrite: Bound the waiver."));
    }

    #[test]
    fn report_counts_flagged_clauses() {
        let safe = Verdict {
            clause_id: ClauseId(0),
            final_severity: Severity::Safe,
            findings: vec![],
            verification: None,
            rewrite: None,
        };
        let report = render_report(&[safe, verdict()]);
        assert!(report.contains("2 clauses analyzed, 1 flagged"));
    }
}
