//! Run configuration.
//!
//! Every detection threshold the pipeline consults lives here, loadable from
//! JSON, so calibration against a labeled corpus is a data change.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Domain;

/// Tunable configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Active contract domain (pattern and axiom pack selection).
    pub domain: Domain,
    /// Marker-less text longer than this fails segmentation.
    pub max_unstructured_len: usize,
    /// Token-set similarity at or above which a clause matches a golden
    /// structure.
    pub golden_similarity_threshold: f64,
    /// Minimum fraction of clause text that must contribute propositions
    /// before a Sat result is trusted; below it the verifier reports
    /// Unknown.
    pub coverage_threshold: f64,
    /// Effect/condition similarity at or above which two clauses count as
    /// duplicated rather than merely related.
    pub duplication_similarity_threshold: f64,
    /// Wall-clock budget per clause for the satisfiability oracle.
    pub solver_budget: Duration,
    /// Engine version stamped into audit records.
    pub engine_version: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            domain: Domain::Generic,
            max_unstructured_len: 2_000,
            golden_similarity_threshold: 0.82,
            coverage_threshold: 0.55,
            duplication_similarity_threshold: 0.5,
            solver_budget: Duration::from_secs(2),
            engine_version: concat!("clauseguard/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.domain, Domain::Generic);
        assert!(cfg.golden_similarity_threshold > cfg.duplication_similarity_threshold);
        assert!(cfg.coverage_threshold > 0.0 && cfg.coverage_threshold < 1.0);
        assert!(cfg.engine_version.starts_with("clauseguard/"));
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"domain": "labor", "coverage_threshold": 0.7}"#).unwrap();
        assert_eq!(cfg.domain, Domain::Labor);
        assert_eq!(cfg.coverage_threshold, 0.7);
        // untouched fields keep their defaults
        assert_eq!(cfg.max_unstructured_len, 2_000);
    }

    #[test]
    fn solver_budget_round_trips() {
        let cfg = AnalysisConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.solver_budget, cfg.solver_budget);
    }
}
