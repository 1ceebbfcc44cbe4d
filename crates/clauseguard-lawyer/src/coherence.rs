//! Cross-clause coherence checking.
//!
//! An explicit graph over the document: nodes are clause IDs, labeled edges
//! record a conflict or duplication on a shared effect tag. Contradictions
//! can chain across more than two clauses, so conflict flagging walks
//! connected components rather than stopping at the first pair.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use clauseguard_core::{
    CitationId, Clause, ClauseId, DetectorId, EffectCondition, EffectTag, Finding,
    FindingSource, Severity,
};

const DETECTOR_CONFIDENCE: f64 = 0.7;

/// Edge label: what kind of incoherence links two clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Same tag, incompatible trigger conditions (or opposing grants).
    Conflict,
    /// Same tag asserted redundantly; creates override ambiguity.
    Duplication,
}

/// One labeled edge of the coherence graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoherenceEdge {
    pub a: ClauseId,
    pub b: ClauseId,
    pub tag: EffectTag,
    pub kind: EdgeKind,
}

/// The coherence graph for one document.
pub struct CoherenceGraph {
    nodes: Vec<ClauseId>,
    edges: Vec<CoherenceEdge>,
}

impl CoherenceGraph {
    /// Build the graph from the full, materialized clause set.
    ///
    /// Pair enumeration is canonical (lower clause ID first), so edge order
    /// is deterministic regardless of how clauses were produced.
    pub fn build(clauses: &[Clause], duplication_threshold: f64) -> Self {
        let nodes = clauses.iter().map(|c| c.id).collect();
        let mut edges = Vec::new();

        for (i, a) in clauses.iter().enumerate() {
            for b in &clauses[i + 1..] {
                for effect_a in &a.effects {
                    for effect_b in &b.effects {
                        if effect_a.tag != effect_b.tag {
                            continue;
                        }
                        match (&effect_a.condition, &effect_b.condition) {
                            (EffectCondition::Unconditional, EffectCondition::Conditioned(_))
                            | (EffectCondition::Conditioned(_), EffectCondition::Unconditional) => {
                                edges.push(CoherenceEdge {
                                    a: a.id,
                                    b: b.id,
                                    tag: effect_a.tag,
                                    kind: EdgeKind::Conflict,
                                });
                            }
                            (ca, cb) if ca == cb => {
                                if effect_similarity(a, b) >= duplication_threshold {
                                    edges.push(CoherenceEdge {
                                        a: a.id,
                                        b: b.id,
                                        tag: effect_a.tag,
                                        kind: EdgeKind::Duplication,
                                    });
                                }
                            }
                            // Distinct trigger conditions coexist.
                            _ => {}
                        }
                    }
                }
            }
        }

        debug!(
            nodes = clauses.len(),
            edges = edges.len(),
            "coherence graph built"
        );
        Self { nodes, edges }
    }

    pub fn edges(&self) -> &[CoherenceEdge] {
        &self.edges
    }

    /// Connected components over conflict edges only (transitive closure:
    /// A conflicts B, B conflicts C flags all three).
    pub fn conflict_components(&self) -> Vec<BTreeSet<ClauseId>> {
        let mut parent: BTreeMap<ClauseId, ClauseId> =
            self.nodes.iter().map(|&n| (n, n)).collect();

        fn find(parent: &mut BTreeMap<ClauseId, ClauseId>, x: ClauseId) -> ClauseId {
            let p = parent[&x];
            if p == x {
                return x;
            }
            let root = find(parent, p);
            parent.insert(x, root);
            root
        }

        for edge in self.edges.iter().filter(|e| e.kind == EdgeKind::Conflict) {
            let ra = find(&mut parent, edge.a);
            let rb = find(&mut parent, edge.b);
            if ra != rb {
                parent.insert(ra, rb);
            }
        }

        let mut components: BTreeMap<ClauseId, BTreeSet<ClauseId>> = BTreeMap::new();
        for &node in &self.nodes {
            let root = find(&mut parent, node);
            components.entry(root).or_default().insert(node);
        }
        components
            .into_values()
            .filter(|c| c.len() > 1)
            .collect()
    }

    /// One `COHERENCE_CHECK` finding per implicated clause.
    pub fn findings(&self) -> Vec<Finding> {
        let mut by_clause: BTreeMap<ClauseId, (Vec<String>, usize)> = BTreeMap::new();

        for component in self.conflict_components() {
            let conflict_edges = self
                .edges
                .iter()
                .filter(|e| {
                    e.kind == EdgeKind::Conflict
                        && component.contains(&e.a)
                        && component.contains(&e.b)
                })
                .count();
            for &id in &component {
                let others: Vec<String> = component
                    .iter()
                    .filter(|&&o| o != id)
                    .map(|o| o.to_string())
                    .collect();
                let tags: BTreeSet<&str> = self
                    .edges
                    .iter()
                    .filter(|e| e.kind == EdgeKind::Conflict && (e.a == id || e.b == id))
                    .map(|e| e.tag.as_str())
                    .collect();
                let entry = by_clause.entry(id).or_default();
                entry.0.push(format!(
                    "conflicting {} with {}",
                    tags.into_iter().collect::<Vec<_>>().join(", "),
                    others.join(", ")
                ));
                entry.1 = entry.1.max(conflict_edges);
            }
        }

        for edge in self.edges.iter().filter(|e| e.kind == EdgeKind::Duplication) {
            for (id, other) in [(edge.a, edge.b), (edge.b, edge.a)] {
                by_clause.entry(id).or_default().0.push(format!(
                    "duplicated {} with {} (override ambiguity)",
                    edge.tag.as_str(),
                    other
                ));
            }
        }

        by_clause
            .into_iter()
            .map(|(clause_id, (reasons, conflict_edges))| Finding {
                clause_id,
                source: FindingSource::Detector(DetectorId::CoherenceCheck),
                severity: if conflict_edges >= 2 {
                    Severity::High
                } else {
                    Severity::Medium
                },
                confidence: DETECTOR_CONFIDENCE,
                legal_basis: vec![CitationId("CONTRACT_DRAFTING_PRACTICE".into())],
                rationale: reasons.join("; "),
            })
            .collect()
    }
}

/// Jaccard over (tag, condition) assignments; how much of the two clauses'
/// legal effect is literally the same.
fn effect_similarity(a: &Clause, b: &Clause) -> f64 {
    let sa: BTreeSet<_> = a
        .effects
        .iter()
        .map(|e| (e.tag, format!("{:?}", e.condition)))
        .collect();
    let sb: BTreeSet<_> = b
        .effects
        .iter()
        .map(|e| (e.tag, format!("{:?}", e.condition)))
        .collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    intersection as f64 / union as f64
}
