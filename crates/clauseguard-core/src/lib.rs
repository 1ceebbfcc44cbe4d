pub mod config;
pub mod effect;
pub mod segment;
pub mod types;

pub use config::AnalysisConfig;
pub use effect::{EffectAssignment, EffectCondition, EffectLexicon, EffectTag};
pub use segment::{SegmentError, segment};
pub use types::{
    CitationId, Clause, ClauseId, DetectorId, Domain, Finding, FindingSource, PatternId,
    Proposition, Predicate, Rewrite, Severity, VerificationResult, Verdict, VerifyStatus,
};
