//! Verdict aggregation.
//!
//! Pure and total: every clause gets exactly one verdict, and the
//! no-downgrade invariant (final severity never below the worst
//! constituent finding) is enforced in one place, here.

use clauseguard_core::{
    Clause, Finding, Rewrite, Severity, VerificationResult, Verdict, VerifyStatus,
};

/// Merge one clause's findings, verification, and rewrite into its verdict.
///
/// Severity floors, applied after the max over findings:
/// - Unsat forces at least High: a formal contradiction outranks any
///   heuristic match.
/// - Unknown forces at least Medium: a clause the solver could not clear
///   is a risk signal, never a pass.
/// - Sat changes nothing; safety signals never lower a risk severity.
pub fn aggregate(
    clause: &Clause,
    findings: Vec<Finding>,
    verification: Option<VerificationResult>,
    rewrite: Option<Rewrite>,
) -> Verdict {
    let mut final_severity = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::Safe);

    match verification.as_ref().map(|v| v.status) {
        Some(VerifyStatus::Unsat) => final_severity = final_severity.max(Severity::High),
        Some(VerifyStatus::Unknown) => final_severity = final_severity.max(Severity::Medium),
        Some(VerifyStatus::Sat) | None => {}
    }

    Verdict {
        clause_id: clause.id,
        final_severity,
        findings,
        verification,
        rewrite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clauseguard_core::{CitationId, ClauseId, DetectorId, FindingSource};
    use std::time::Duration;

    fn clause() -> Clause {
        Clause {
            id: ClauseId(3),
            heading: None,
            text: "test clause".into(),
            start_offset: 0,
            end_offset: 11,
            effects: vec![],
        }
    }

    fn finding(severity: Severity) -> Finding {
        Finding {
            clause_id: ClauseId(3),
            source: FindingSource::Detector(DetectorId::AmbiguousClause),
            severity,
            confidence: 0.7,
            legal_basis: vec![CitationId("TEST".into())],
            rationale: "test".into(),
        }
    }

    fn verification(status: VerifyStatus) -> VerificationResult {
        VerificationResult {
            clause_id: ClauseId(3),
            status,
            unsat_core: vec![],
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn severity_is_max_of_findings() {
        let v = aggregate(
            &clause(),
            vec![finding(Severity::Low), finding(Severity::High), finding(Severity::Medium)],
            None,
            None,
        );
        assert_eq!(v.final_severity, Severity::High);
    }

    #[test]
    fn no_findings_is_safe() {
        let v = aggregate(&clause(), vec![], None, None);
        assert_eq!(v.final_severity, Severity::Safe);
        assert_eq!(v.clause_id, ClauseId(3));
    }

    #[test]
    fn unsat_forces_at_least_high() {
        let v = aggregate(
            &clause(),
            vec![finding(Severity::Low)],
            Some(verification(VerifyStatus::Unsat)),
            None,
        );
        assert_eq!(v.final_severity, Severity::High);
    }

    #[test]
    fn unsat_does_not_lower_critical() {
        let v = aggregate(
            &clause(),
            vec![finding(Severity::Critical)],
            Some(verification(VerifyStatus::Unsat)),
            None,
        );
        assert_eq!(v.final_severity, Severity::Critical);
    }

    #[test]
    fn unknown_forces_at_least_medium() {
        let v = aggregate(
            &clause(),
            vec![finding(Severity::Low)],
            Some(verification(VerifyStatus::Unknown)),
            None,
        );
        assert_eq!(v.final_severity, Severity::Medium);
    }

    #[test]
    fn unknown_never_lowers() {
        let v = aggregate(
            &clause(),
            vec![finding(Severity::High)],
            Some(verification(VerifyStatus::Unknown)),
            None,
        );
        assert_eq!(v.final_severity, Severity::High);
    }

    #[test]
    fn sat_changes_nothing() {
        let v = aggregate(
            &clause(),
            vec![finding(Severity::Medium)],
            Some(verification(VerifyStatus::Sat)),
            None,
        );
        assert_eq!(v.final_severity, Severity::Medium);
    }

    #[test]
    fn safe_findings_do_not_raise() {
        let v = aggregate(&clause(), vec![finding(Severity::Safe)], None, None);
        assert_eq!(v.final_severity, Severity::Safe);
    }
}
