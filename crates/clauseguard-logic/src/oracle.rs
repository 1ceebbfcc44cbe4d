//! Satisfiability oracle boundary.
//!
//! The verifier only ever talks to [`SatOracle`]; the concrete solver is
//! swappable without touching translation or aggregation. The built-in
//! [`UnitOracle`] decides consistency of ground unit literals (the shape
//! every proposition in the fixed vocabulary takes) and extracts a minimal
//! contradictory pair as the unsat core.

use std::collections::HashMap;
use std::time::Instant;

use thiserror::Error;

use clauseguard_core::{Predicate, Proposition};

/// Outcome of one satisfiability check.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutcome {
    Sat,
    Unsat {
        /// Minimal contradictory subset, in assertion order.
        core: Vec<Proposition>,
    },
    /// Deadline exhausted before a decision.
    Unknown,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle rejected assertion set: {0}")]
    Rejected(String),
    #[error("oracle backend failure: {0}")]
    Backend(String),
}

/// Abstract satisfiability oracle: assert propositions, query status,
/// extract a core.
pub trait SatOracle: Send + Sync {
    fn check(
        &self,
        assertions: &[Proposition],
        deadline: Instant,
    ) -> Result<OracleOutcome, OracleError>;
}

/// Built-in backend: consistency of ground unit literals.
///
/// An assertion set is unsatisfiable exactly when some atom
/// (predicate + args) is asserted with both polarities. The minimal core is
/// a single conflicting pair, since no smaller unsatisfiable subset of unit
/// literals exists, chosen as the pair that completes earliest in
/// assertion order, which implements the fewest-propositions-then-earliest
/// tie-break.
#[derive(Debug, Default)]
pub struct UnitOracle;

const DEADLINE_STRIDE: usize = 64;

impl SatOracle for UnitOracle {
    fn check(
        &self,
        assertions: &[Proposition],
        deadline: Instant,
    ) -> Result<OracleOutcome, OracleError> {
        // atom -> (polarity, index of first assertion)
        let mut seen: HashMap<(Predicate, &[String]), (bool, usize)> = HashMap::new();

        for (index, prop) in assertions.iter().enumerate() {
            if index % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
                return Ok(OracleOutcome::Unknown);
            }
            let key = (prop.predicate, prop.args.as_slice());
            match seen.get(&key) {
                Some(&(polarity, first_index)) if polarity != prop.polarity => {
                    // First contradiction to complete is the minimal core.
                    let core = vec![assertions[first_index].clone(), prop.clone()];
                    return Ok(OracleOutcome::Unsat { core });
                }
                Some(_) => {}
                None => {
                    seen.insert(key, (prop.polarity, index));
                }
            }
        }
        Ok(OracleOutcome::Sat)
    }
}
