//! Formal verification stage.
//!
//! A confirmation/explanation layer, not the primary detector: it only runs
//! for clauses the pattern and lawyer-thinking stages already flagged at
//! Medium or above. Fail-closed throughout: timeout, oracle failure, and
//! thin translation coverage all surface as Unknown, never Sat.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use clauseguard_core::{ClauseId, Proposition, VerificationResult, VerifyStatus};

use crate::axioms::Axiom;
use crate::oracle::{OracleOutcome, SatOracle};
use crate::translate::Translation;

pub struct Verifier {
    coverage_threshold: f64,
}

impl Verifier {
    pub fn new(coverage_threshold: f64) -> Self {
        Self { coverage_threshold }
    }

    /// Check one clause's propositions conjoined with the applicable axioms.
    ///
    /// `axioms` must already be filtered for the active domain. The oracle
    /// gets the clause propositions first (textual order), then the axiom
    /// propositions, so unsat-core tie-breaking favors clause text.
    pub fn verify(
        &self,
        oracle: &dyn SatOracle,
        clause_id: ClauseId,
        translation: &Translation,
        axioms: &[&Axiom],
        budget: Duration,
    ) -> VerificationResult {
        let started = Instant::now();
        let deadline = started + budget;

        let mut assertions: Vec<Proposition> = translation.propositions.clone();
        for axiom in axioms {
            assertions.extend(axiom.propositions.iter().cloned());
        }

        let outcome = oracle.check(&assertions, deadline);
        let elapsed = started.elapsed();

        let (status, unsat_core) = match outcome {
            Ok(OracleOutcome::Unsat { core }) => (VerifyStatus::Unsat, core),
            Ok(OracleOutcome::Sat) => {
                if translation.coverage < self.coverage_threshold {
                    // Too little of the clause was formalized to call it
                    // proved safe.
                    (VerifyStatus::Unknown, Vec::new())
                } else {
                    (VerifyStatus::Sat, Vec::new())
                }
            }
            Ok(OracleOutcome::Unknown) => (VerifyStatus::Unknown, Vec::new()),
            Err(e) => {
                warn!(clause_id = %clause_id, error = %e, "oracle failure, failing closed");
                (VerifyStatus::Unknown, Vec::new())
            }
        };

        info!(
            clause_id = %clause_id,
            status = ?status,
            core = unsat_core.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "verification complete"
        );
        VerificationResult {
            clause_id,
            status,
            unsat_core,
            elapsed,
        }
    }
}
