//! Document-level pipeline orchestration.
//!
//! Clauses are independent through the pattern and translation stages and
//! run as parallel blocking tasks. The coherence checker needs the full
//! clause set, so a barrier sits in front of it. Verifier calls are again
//! independent, each against its own oracle context and bounded by the
//! per-clause budget. Audit appends are strictly sequential (the one hard
//! ordering constraint) and happen only once the complete verdict set
//! exists, so an aborted run never leaves partial records behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use clauseguard_audit::{AuditChain, AuditRecord, JsonlSink, SinkError};
use clauseguard_core::{
    AnalysisConfig, EffectLexicon, PatternId, Proposition, SegmentError, Severity,
    VerificationResult, Verdict, VerifyStatus, segment,
};
use clauseguard_lawyer::decompose;
use clauseguard_logic::{
    Axiom, RewriteEngine, SatOracle, Translation, UnitOracle, Verifier, applicable_axioms,
    built_in_axioms, translate,
};
use clauseguard_patterns::{Catalog, PatternEngine, ScanOutcome};

use crate::aggregate::aggregate;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Segmentation(#[from] SegmentError),
    #[error("analysis cancelled; partial verdicts discarded")]
    Cancelled,
    #[error("clause stage failed: {0}")]
    Stage(String),
    #[error(transparent)]
    Audit(#[from] SinkError),
}

/// Everything one analysis run produces: the full verdict set and the audit
/// records appended for it.
#[derive(Debug)]
pub struct DocumentReport {
    pub verdicts: Vec<Verdict>,
    pub records: Vec<AuditRecord>,
}

struct Inner {
    config: AnalysisConfig,
    engine: PatternEngine,
    risk_index: HashMap<PatternId, Proposition>,
    axioms: Vec<Axiom>,
    verifier: Verifier,
    rewriter: RewriteEngine,
    oracle: Arc<dyn SatOracle>,
    lexicon: EffectLexicon,
    chain: Mutex<ChainState>,
}

struct ChainState {
    chain: AuditChain,
    sink: Option<JsonlSink>,
}

pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    /// Pipeline with the built-in catalog, axioms, templates, lexicon, and
    /// oracle.
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_parts(
            config,
            Catalog::built_in(),
            built_in_axioms(),
            RewriteEngine::built_in(),
            Arc::new(UnitOracle),
            None,
        )
    }

    /// Built-in parts plus a durable audit sink.
    pub fn with_audit_sink(config: AnalysisConfig, sink: JsonlSink) -> Self {
        Self::with_parts(
            config,
            Catalog::built_in(),
            built_in_axioms(),
            RewriteEngine::built_in(),
            Arc::new(UnitOracle),
            Some(sink),
        )
    }

    /// Fully parameterized construction; `sink` persists audit records as
    /// they are appended.
    pub fn with_parts(
        config: AnalysisConfig,
        catalog: Catalog,
        axioms: Vec<Axiom>,
        rewriter: RewriteEngine,
        oracle: Arc<dyn SatOracle>,
        sink: Option<JsonlSink>,
    ) -> Self {
        let risk_index = catalog.risk_propositions();
        let verifier = Verifier::new(config.coverage_threshold);
        let chain = Mutex::new(ChainState {
            chain: AuditChain::new(config.engine_version.clone()),
            sink,
        });
        Self {
            inner: Arc::new(Inner {
                engine: PatternEngine::new(catalog),
                risk_index,
                axioms,
                verifier,
                rewriter,
                oracle,
                lexicon: EffectLexicon::built_in(),
                chain,
                config,
            }),
        }
    }

    /// Analyze one document to completion.
    pub async fn analyze(&self, text: &str) -> Result<DocumentReport, PipelineError> {
        self.analyze_with_cancel(text, None).await
    }

    /// Analyze one document, aborting between stages when `cancel` flips to
    /// true. In-flight oracle calls run to their own deadline; a cancelled
    /// run discards partial verdicts and appends no audit records.
    pub async fn analyze_with_cancel(
        &self,
        text: &str,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<DocumentReport, PipelineError> {
        let cancelled = || cancel.as_ref().is_some_and(|rx| *rx.borrow());
        let inner = &self.inner;

        let clauses = Arc::new(segment(
            text,
            &inner.lexicon,
            inner.config.max_unstructured_len,
        )?);
        info!(
            clauses = clauses.len(),
            domain = inner.config.domain.as_str(),
            "document segmented"
        );
        if cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Per-clause stages: pattern scan + translation, in parallel.
        let mut handles = Vec::with_capacity(clauses.len());
        for idx in 0..clauses.len() {
            let inner = Arc::clone(&self.inner);
            let clauses = Arc::clone(&clauses);
            handles.push(tokio::task::spawn_blocking(move || {
                let clause = &clauses[idx];
                let scan = inner.engine.scan(
                    clause,
                    inner.config.domain,
                    inner.config.golden_similarity_threshold,
                );
                let translation = translate(clause, &scan.findings, &inner.risk_index);
                (idx, scan, translation)
            }));
        }

        // Barrier: the coherence checker needs every clause materialized.
        let mut stage: Vec<Option<(ScanOutcome, Translation)>> =
            (0..clauses.len()).map(|_| None).collect();
        for joined in join_all(handles).await {
            let (idx, scan, translation) =
                joined.map_err(|e| PipelineError::Stage(e.to_string()))?;
            stage[idx] = Some((scan, translation));
        }
        if cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut per_clause: Vec<(ScanOutcome, Translation)> = stage
            .into_iter()
            .map(|s| s.expect("every clause stage completes"))
            .collect();

        // Lawyer-thinking decomposition over the full set.
        let lawyer_findings = decompose(&clauses, inner.config.duplication_similarity_threshold);
        for finding in lawyer_findings {
            per_clause[finding.clause_id.0 as usize].0.findings.push(finding);
        }
        if cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Verification: confirmation layer for clauses flagged >= Medium.
        let domain_axioms: Arc<Vec<Axiom>> = Arc::new(
            applicable_axioms(&inner.axioms, inner.config.domain)
                .into_iter()
                .cloned()
                .collect(),
        );
        let mut verify_handles = Vec::new();
        for (idx, (scan, translation)) in per_clause.iter().enumerate() {
            let worst = scan.findings.iter().map(|f| f.severity).max();
            if worst < Some(Severity::Medium) {
                continue;
            }
            let inner = Arc::clone(&self.inner);
            let clauses = Arc::clone(&clauses);
            let axioms = Arc::clone(&domain_axioms);
            let translation = translation.clone();
            verify_handles.push(tokio::task::spawn_blocking(move || {
                let refs: Vec<&Axiom> = axioms.iter().collect();
                (
                    idx,
                    inner.verifier.verify(
                        inner.oracle.as_ref(),
                        clauses[idx].id,
                        &translation,
                        &refs,
                        inner.config.solver_budget,
                    ),
                )
            }));
        }
        let mut verifications: Vec<Option<VerificationResult>> =
            (0..clauses.len()).map(|_| None).collect();
        for joined in join_all(verify_handles).await {
            let (idx, result) = joined.map_err(|e| PipelineError::Stage(e.to_string()))?;
            verifications[idx] = Some(result);
        }
        if cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Proof-carrying rewrites for formally contradicted clauses, then
        // aggregation into one verdict per clause.
        let mut verdicts = Vec::with_capacity(clauses.len());
        for (idx, (scan, _)) in per_clause.into_iter().enumerate() {
            let verification = verifications[idx].take();
            let rewrite = verification
                .as_ref()
                .filter(|v| v.status == VerifyStatus::Unsat)
                .and_then(|v| inner.rewriter.propose(&clauses[idx], &v.unsat_core));
            verdicts.push(aggregate(
                &clauses[idx],
                scan.findings,
                verification,
                rewrite,
            ));
        }
        if cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Audit phase: serialized appends, one record per verdict, only now
        // that the verdict set is complete.
        let records = {
            let mut state = inner.chain.lock().expect("audit chain mutex poisoned");
            let mut appended = Vec::with_capacity(verdicts.len());
            for verdict in &verdicts {
                let record = state.chain.append(verdict, Utc::now()).clone();
                if let Some(sink) = state.sink.as_mut() {
                    sink.append(&record)?;
                }
                appended.push(record);
            }
            appended
        };

        info!(
            verdicts = verdicts.len(),
            flagged = verdicts
                .iter()
                .filter(|v| v.final_severity > Severity::Safe)
                .count(),
            "analysis complete"
        );
        Ok(DocumentReport { verdicts, records })
    }

    /// Findings-stream view of the audit chain so far.
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.inner
            .chain
            .lock()
            .expect("audit chain mutex poisoned")
            .chain
            .records()
            .to_vec()
    }
}
