//! Shared data model for the clause analysis pipeline.
//!
//! Everything downstream of the segmenter refers to clauses by [`ClauseId`];
//! the `Clause` itself is owned by the pipeline run and never mutated after
//! segmentation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effect::EffectAssignment;

/// Stable identifier of a clause within one document run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClauseId(pub u32);

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{:03}", self.0)
    }
}

/// One addressable clause unit produced by the segmenter.
///
/// Immutable once segmented. `start_offset`/`end_offset` are byte offsets
/// into the normalized source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    pub id: ClauseId,
    /// Clause heading, when the structural marker carried one.
    pub heading: Option<String>,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Legal effects extracted at segmentation time from the tag lexicon.
    pub effects: Vec<EffectAssignment>,
}

/// Risk severity ladder. `Safe` is the verdict floor; among findings, only
/// golden-structure SAFE findings carry it; risk findings start at `Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract domain selecting pattern and axiom packs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Generic,
    Labor,
    #[serde(rename = "realestate")]
    RealEstate,
    ItSaas,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Labor => "labor",
            Self::RealEstate => "realestate",
            Self::ItSaas => "it_saas",
        }
    }
}

/// Citation key into the external legal reference set (statute or case law).
/// The core never parses the referenced text, only carries the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationId(pub String);

/// Identifier of a catalog pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternId(pub String);

/// The three lawyer-thinking detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectorId {
    AmbiguousClause,
    CoherenceCheck,
    NoTimeLimit,
}

impl DetectorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmbiguousClause => "AMBIGUOUS_CLAUSE",
            Self::CoherenceCheck => "COHERENCE_CHECK",
            Self::NoTimeLimit => "NO_TIME_LIMIT",
        }
    }
}

/// What produced a finding: a catalog pattern or a lawyer-thinking detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    Pattern(PatternId),
    Detector(DetectorId),
}

/// One risk (or safety) signal attached to a clause.
///
/// Findings are produced, never mutated; a clause may carry many.
/// `confidence` is informational only; it never gates emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub clause_id: ClauseId,
    pub source: FindingSource,
    pub severity: Severity,
    pub confidence: f64,
    pub legal_basis: Vec<CitationId>,
    pub rationale: String,
}

/// Fixed predicate vocabulary of the logic stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    Obligation,
    Right,
    Condition,
    TemporalBound,
    Party,
}

/// A ground logic proposition over the fixed vocabulary.
///
/// Insertion order within a clause follows textual order; satisfiability
/// does not depend on it, but unsat-core tie-breaking does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proposition {
    pub predicate: Predicate,
    pub args: Vec<String>,
    pub polarity: bool,
}

impl Proposition {
    pub fn positive(predicate: Predicate, args: &[&str]) -> Self {
        Self {
            predicate,
            args: args.iter().map(|a| a.to_string()).collect(),
            polarity: true,
        }
    }

    pub fn negative(predicate: Predicate, args: &[&str]) -> Self {
        Self {
            polarity: false,
            ..Self::positive(predicate, args)
        }
    }

    /// The atom this proposition asserts or denies.
    pub fn atom(&self) -> (Predicate, &[String]) {
        (self.predicate, &self.args)
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.polarity { "" } else { "¬" };
        write!(f, "{sign}{:?}({})", self.predicate, self.args.join(", "))
    }
}

/// Outcome of the satisfiability check for one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyStatus {
    Sat,
    Unsat,
    /// Solver timeout, solver error, or insufficient translation coverage.
    /// A risk signal, never a pass.
    Unknown,
}

/// Result of verifying one clause against the statutory axioms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub clause_id: ClauseId,
    pub status: VerifyStatus,
    /// Minimal contradictory subset when `status == Unsat`, else empty.
    pub unsat_core: Vec<Proposition>,
    /// Wall-clock spent in the oracle. Excluded from verdict hashing.
    pub elapsed: Duration,
}

/// A proof-carrying rewrite proposal.
///
/// `justification` is the exact unsat core that produced the proposal;
/// construct via [`Rewrite::proof_carrying`], which refuses an empty core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rewrite {
    pub original_span: (usize, usize),
    pub proposed_text: String,
    pub justification: Vec<Proposition>,
}

impl Rewrite {
    /// Build a rewrite carrying its proof. Returns `None` for an empty core:
    /// a rewrite without a justifying contradiction is a protocol violation.
    pub fn proof_carrying(
        original_span: (usize, usize),
        proposed_text: String,
        justification: Vec<Proposition>,
    ) -> Option<Self> {
        if justification.is_empty() {
            return None;
        }
        Some(Self {
            original_span,
            proposed_text,
            justification,
        })
    }
}

/// The single source of truth for one clause: merged findings, optional
/// verification, optional rewrite, and the aggregated severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub clause_id: ClauseId,
    pub final_severity: Severity,
    pub findings: Vec<Finding>,
    pub verification: Option<VerificationResult>,
    pub rewrite: Option<Rewrite>,
}
