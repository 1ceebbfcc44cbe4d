//! Lawyer-thinking decomposition.
//!
//! Three independent analyses over the full clause set of one document,
//! modeled on how a reviewing lawyer actually reads: what is ambiguous,
//! what contradicts or duplicates what, and what has no end date. Their
//! findings merge into the same stream as the pattern engine's.

pub mod ambiguity;
pub mod coherence;
pub mod time_limit;

use clauseguard_core::{Clause, Finding};

pub use coherence::{CoherenceGraph, EdgeKind};

/// Run all three detectors over a document's clause set.
pub fn decompose(clauses: &[Clause], duplication_threshold: f64) -> Vec<Finding> {
    let mut findings = Vec::new();
    for clause in clauses {
        findings.extend(ambiguity::detect(clause));
        findings.extend(time_limit::detect(clause));
    }
    let graph = CoherenceGraph::build(clauses, duplication_threshold);
    findings.extend(graph.findings());
    findings
}
