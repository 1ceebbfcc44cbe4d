pub mod catalog;
pub mod engine;

pub use catalog::{Catalog, CatalogError, MatcherSpec, PatternKind, PatternSpec};
pub use engine::{PatternEngine, ScanOutcome};
