pub mod axioms;
pub mod oracle;
pub mod rewrite;
pub mod translate;
pub mod verify;

pub use axioms::{Axiom, applicable_axioms, built_in_axioms};
pub use oracle::{OracleError, OracleOutcome, SatOracle, UnitOracle};
pub use rewrite::RewriteEngine;
pub use translate::{Translation, extract_temporal_bounds, translate};
pub use verify::Verifier;
