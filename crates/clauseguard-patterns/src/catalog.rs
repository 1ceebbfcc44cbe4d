//! Declarative pattern catalog.
//!
//! Patterns, whitelists, and golden structures are data: JSON packs per
//! domain, compiled once per run. Adding a domain means adding a pack, not a
//! code path. The built-in packs ship embedded; external packs load from
//! disk and merge on top.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use clauseguard_core::{CitationId, Domain, PatternId, Proposition, Severity};

const BUILTIN_PACKS: &[(&str, &str)] = &[
    ("generic", include_str!("catalog/generic.json")),
    ("labor", include_str!("catalog/labor.json")),
    ("realestate", include_str!("catalog/realestate.json")),
    ("it_saas", include_str!("catalog/it_saas.json")),
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read pattern pack {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse pattern pack {pack}: {source}")]
    Parse {
        pack: String,
        source: serde_json::Error,
    },
    #[error("pattern {id} has an invalid matcher: {source}")]
    BadMatcher { id: String, source: regex::Error },
    #[error("NG pattern {id} is missing a severity")]
    MissingSeverity { id: String },
    #[error("duplicate pattern id {id}")]
    DuplicateId { id: String },
}

/// Catalog pattern kinds, in the order the engine evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    Ng,
    Safe,
    Whitelist,
}

/// Matcher specification; specificity decides the finding confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatcherSpec {
    /// Case-insensitive literal phrase. Most specific.
    Phrase(String),
    /// Regular expression over the clause text.
    Structural(String),
    /// Every keyword must appear (case-insensitive). Least specific.
    Keywords(Vec<String>),
}

impl MatcherSpec {
    /// Confidence is derived from matcher specificity; it is informational
    /// only and never gates emission.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Phrase(_) => 0.95,
            Self::Structural(_) => 0.85,
            Self::Keywords(_) => 0.70,
        }
    }
}

/// One declarative pattern entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub id: String,
    pub kind: PatternKind,
    pub domain: Domain,
    /// Required for NG patterns; ignored for whitelist entries.
    #[serde(default)]
    pub severity: Option<Severity>,
    pub matcher: MatcherSpec,
    #[serde(default)]
    pub legal_basis: Vec<String>,
    pub rationale: String,
    /// Risk proposition asserted into the logic stage when this pattern
    /// matches; what lets statutory axioms contradict the clause.
    #[serde(default)]
    pub risk_proposition: Option<Proposition>,
}

/// A canonical, pre-vetted safe clause shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenSpec {
    pub id: String,
    pub domain: Domain,
    pub text: String,
    pub rationale: String,
    #[serde(default)]
    pub legal_basis: Vec<String>,
}

/// One JSON pack: patterns plus golden structures for a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPack {
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
    #[serde(default)]
    pub golden_structures: Vec<GoldenSpec>,
}

pub(crate) enum CompiledMatcher {
    Phrase(String),
    Structural(Regex),
    Keywords(Vec<String>),
}

impl CompiledMatcher {
    pub(crate) fn matches(&self, text: &str) -> bool {
        match self {
            Self::Phrase(phrase) => text.to_lowercase().contains(phrase),
            Self::Structural(re) => re.is_match(text),
            Self::Keywords(words) => {
                let lower = text.to_lowercase();
                words.iter().all(|w| lower.contains(w))
            }
        }
    }
}

pub(crate) struct CompiledPattern {
    pub id: PatternId,
    pub kind: PatternKind,
    pub domain: Domain,
    pub severity: Option<Severity>,
    pub confidence: f64,
    pub matcher: CompiledMatcher,
    pub legal_basis: Vec<CitationId>,
    pub rationale: String,
    pub risk_proposition: Option<Proposition>,
}

/// Compiled catalog, loaded once per run and never mutated.
pub struct Catalog {
    pub(crate) patterns: Vec<CompiledPattern>,
    pub(crate) golden: Vec<GoldenSpec>,
}

impl Catalog {
    /// The embedded packs for all built-in domains.
    pub fn built_in() -> Self {
        let mut catalog = Self {
            patterns: Vec::new(),
            golden: Vec::new(),
        };
        for (name, json) in BUILTIN_PACKS {
            let pack: CatalogPack = serde_json::from_str(json)
                .unwrap_or_else(|e| panic!("built-in pack {name} must parse: {e}"));
            catalog
                .merge(pack, name)
                .unwrap_or_else(|e| panic!("built-in pack {name} must compile: {e}"));
        }
        catalog
    }

    /// Load an additional pack from disk and merge it on top.
    pub fn load_pack(&mut self, path: &Path) -> Result<(), CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let pack: CatalogPack =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                pack: path.display().to_string(),
                source,
            })?;
        let count = pack.patterns.len();
        self.merge(pack, &path.display().to_string())?;
        info!(path = %path.display(), patterns = count, "merged pattern pack");
        Ok(())
    }

    fn merge(&mut self, pack: CatalogPack, _origin: &str) -> Result<(), CatalogError> {
        for spec in pack.patterns {
            if self.patterns.iter().any(|p| p.id.0 == spec.id) {
                return Err(CatalogError::DuplicateId { id: spec.id });
            }
            if spec.kind == PatternKind::Ng && spec.severity.is_none() {
                return Err(CatalogError::MissingSeverity { id: spec.id });
            }
            let confidence = spec.matcher.confidence();
            let matcher = match &spec.matcher {
                MatcherSpec::Phrase(p) => CompiledMatcher::Phrase(p.to_lowercase()),
                MatcherSpec::Structural(re) => CompiledMatcher::Structural(
                    Regex::new(re).map_err(|source| CatalogError::BadMatcher {
                        id: spec.id.clone(),
                        source,
                    })?,
                ),
                MatcherSpec::Keywords(words) => CompiledMatcher::Keywords(
                    words.iter().map(|w| w.to_lowercase()).collect(),
                ),
            };
            self.patterns.push(CompiledPattern {
                id: PatternId(spec.id),
                kind: spec.kind,
                domain: spec.domain,
                severity: spec.severity,
                confidence,
                matcher,
                legal_basis: spec.legal_basis.into_iter().map(CitationId).collect(),
                rationale: spec.rationale,
                risk_proposition: spec.risk_proposition,
            });
        }
        self.golden.extend(pack.golden_structures);
        Ok(())
    }

    /// Map of pattern id to the risk proposition it asserts, for the FOL
    /// translator.
    pub fn risk_propositions(&self) -> HashMap<PatternId, Proposition> {
        self.patterns
            .iter()
            .filter_map(|p| {
                p.risk_proposition
                    .clone()
                    .map(|prop| (p.id.clone(), prop))
            })
            .collect()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn golden_count(&self) -> usize {
        self.golden.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_packs_compile() {
        let catalog = Catalog::built_in();
        assert!(catalog.pattern_count() >= 15, "expected a usable catalog");
        assert!(catalog.golden_count() >= 3);
    }

    #[test]
    fn ng_patterns_all_carry_severity() {
        let catalog = Catalog::built_in();
        for p in &catalog.patterns {
            if p.kind == PatternKind::Ng {
                assert!(p.severity.is_some(), "NG pattern {} lacks severity", p.id.0);
            }
        }
    }

    #[test]
    fn matcher_confidence_ordering() {
        let phrase = MatcherSpec::Phrase("x".into());
        let structural = MatcherSpec::Structural("x".into());
        let keywords = MatcherSpec::Keywords(vec!["x".into()]);
        assert!(phrase.confidence() > structural.confidence());
        assert!(structural.confidence() > keywords.confidence());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut catalog = Catalog::built_in();
        let pack = CatalogPack {
            patterns: vec![PatternSpec {
                id: "ng.generic.blanket-liability-exemption".into(),
                kind: PatternKind::Ng,
                domain: Domain::Generic,
                severity: Some(Severity::High),
                matcher: MatcherSpec::Phrase("x".into()),
                legal_basis: vec![],
                rationale: "dup".into(),
                risk_proposition: None,
            }],
            golden_structures: vec![],
        };
        assert!(matches!(
            catalog.merge(pack, "test"),
            Err(CatalogError::DuplicateId { .. })
        ));
    }

    #[test]
    fn ng_without_severity_rejected() {
        let mut catalog = Catalog {
            patterns: vec![],
            golden: vec![],
        };
        let pack = CatalogPack {
            patterns: vec![PatternSpec {
                id: "ng.test.nosev".into(),
                kind: PatternKind::Ng,
                domain: Domain::Generic,
                severity: None,
                matcher: MatcherSpec::Phrase("x".into()),
                legal_basis: vec![],
                rationale: "no severity".into(),
                risk_proposition: None,
            }],
            golden_structures: vec![],
        };
        assert!(matches!(
            catalog.merge(pack, "test"),
            Err(CatalogError::MissingSeverity { .. })
        ));
    }

    #[test]
    fn risk_proposition_index_is_populated() {
        let catalog = Catalog::built_in();
        let index = catalog.risk_propositions();
        assert!(
            index.contains_key(&PatternId(
                "ng.generic.blanket-liability-exemption".into()
            )),
            "blanket exemption must assert a risk proposition"
        );
    }

    #[test]
    fn external_pack_merges_on_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance.json");
        std::fs::write(
            &path,
            r#"{
                "patterns": [{
                    "id": "ng.finance.principal-loss-hidden",
                    "kind": "NG",
                    "domain": "generic",
                    "severity": "HIGH",
                    "matcher": {"kind": "keywords", "value": ["principal", "no risk"]},
                    "legal_basis": ["FIN_INSTRUMENTS_ACT_40"],
                    "rationale": "Concealing principal-loss risk."
                }]
            }"#,
        )
        .unwrap();
        let mut catalog = Catalog::built_in();
        let before = catalog.pattern_count();
        catalog.load_pack(&path).unwrap();
        assert_eq!(catalog.pattern_count(), before + 1);
        assert!(catalog
            .patterns
            .iter()
            .any(|p| p.id.0 == "ng.finance.principal-loss-hidden"));
    }

    #[test]
    fn phrase_matching_is_case_insensitive() {
        let m = CompiledMatcher::Phrase("without notice".into());
        assert!(m.matches("The Provider may act WITHOUT NOTICE."));
        assert!(!m.matches("with ninety days notice"));
    }

    #[test]
    fn keyword_matching_requires_all() {
        let m = CompiledMatcher::Keywords(vec!["penalty".into(), "without limit".into()]);
        assert!(m.matches("A penalty accrues without limit."));
        assert!(!m.matches("A penalty accrues, capped at fees paid."));
    }
}
