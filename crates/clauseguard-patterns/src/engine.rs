//! Pattern engine: whitelist, golden structures, then NG scan.
//!
//! Matching is deterministic and order-independent across NG patterns: no
//! early exit, so a clause may carry several simultaneous findings. Risk and
//! safety signals coexist in the output; only whitelist suppression (which
//! never touches Critical) removes findings here, everything else is the
//! aggregator's business.

use std::collections::BTreeSet;

use tracing::debug;

use clauseguard_core::{
    CitationId, Clause, Domain, Finding, FindingSource, PatternId, Severity,
};

use crate::catalog::{Catalog, PatternKind};

/// Result of scanning one clause.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    /// Whether a whitelist entry for the active domain matched.
    pub whitelisted: bool,
    /// NG patterns whose findings were suppressed by the whitelist.
    pub suppressed: Vec<PatternId>,
}

pub struct PatternEngine {
    catalog: Catalog,
}

impl PatternEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Scan one clause under the active domain.
    ///
    /// Generic patterns always apply; domain packs add to them.
    pub fn scan(&self, clause: &Clause, domain: Domain, golden_threshold: f64) -> ScanOutcome {
        let in_scope =
            |d: Domain| d == Domain::Generic || d == domain;

        // 1. Whitelist.
        let whitelist_hits: Vec<&PatternId> = self
            .catalog
            .patterns
            .iter()
            .filter(|p| p.kind == PatternKind::Whitelist && in_scope(p.domain))
            .filter(|p| p.matcher.matches(&clause.text))
            .map(|p| &p.id)
            .collect();
        let whitelisted = !whitelist_hits.is_empty();

        let mut findings = Vec::new();

        // 2. Golden structures: similarity against canonical safe shapes.
        for golden in self.catalog.golden.iter().filter(|g| in_scope(g.domain)) {
            let similarity = token_set_similarity(&clause.text, &golden.text);
            if similarity >= golden_threshold {
                findings.push(Finding {
                    clause_id: clause.id,
                    source: FindingSource::Pattern(PatternId(golden.id.clone())),
                    severity: Severity::Safe,
                    confidence: similarity,
                    legal_basis: golden
                        .legal_basis
                        .iter()
                        .cloned()
                        .map(CitationId)
                        .collect(),
                    rationale: format!("matches golden structure: {}", golden.rationale),
                });
            }
        }

        // 3. NG patterns: every match emits, independent of SAFE findings.
        let mut suppressed = Vec::new();
        for pattern in self
            .catalog
            .patterns
            .iter()
            .filter(|p| p.kind == PatternKind::Ng && in_scope(p.domain))
        {
            if !pattern.matcher.matches(&clause.text) {
                continue;
            }
            let severity = pattern
                .severity
                .expect("NG severity validated at catalog load");
            if whitelisted && severity < Severity::Critical {
                debug!(
                    clause_id = %clause.id,
                    pattern = %pattern.id.0,
                    whitelist = ?whitelist_hits,
                    "whitelist suppressed sub-critical finding"
                );
                suppressed.push(pattern.id.clone());
                continue;
            }
            findings.push(Finding {
                clause_id: clause.id,
                source: FindingSource::Pattern(pattern.id.clone()),
                severity,
                confidence: pattern.confidence,
                legal_basis: pattern.legal_basis.clone(),
                rationale: pattern.rationale.clone(),
            });
        }

        debug!(
            clause_id = %clause.id,
            findings = findings.len(),
            whitelisted,
            suppressed = suppressed.len(),
            "pattern scan complete"
        );
        ScanOutcome {
            findings,
            whitelisted,
            suppressed,
        }
    }
}

/// Jaccard similarity over lowercase word tokens.
///
/// Cheap and order-insensitive, which is what golden-structure comparison
/// needs: the catalog text is canonical, real clauses reorder and reword.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    intersection as f64 / union as f64
}

fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
