//! Proof-carrying rewrite engine.
//!
//! Given an unsat core, propose the minimal clause edit that would restore
//! satisfiability, with the core attached as justification. Templates are
//! declarative data keyed by predicate and polarity; a core no template
//! covers yields None; the engine never fabricates unjustified text.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use clauseguard_core::{Clause, Predicate, Proposition, Rewrite};

const BUILTIN_TEMPLATES: &str = include_str!("rewrite_templates.json");

/// One rewrite template; `{args}` is replaced with the proposition's
/// arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteTemplate {
    pub predicate: Predicate,
    pub polarity: bool,
    pub template: String,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read rewrite templates {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse rewrite templates {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

pub struct RewriteEngine {
    templates: Vec<RewriteTemplate>,
}

impl RewriteEngine {
    /// The embedded template set.
    pub fn built_in() -> Self {
        Self {
            templates: serde_json::from_str(BUILTIN_TEMPLATES)
                .expect("built-in rewrite templates must parse"),
        }
    }

    /// Load templates from disk, replacing the built-ins.
    pub fn from_path(path: &Path) -> Result<Self, TemplateError> {
        let raw = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let templates = serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { templates })
    }

    fn lookup(&self, predicate: Predicate, polarity: bool) -> Option<&RewriteTemplate> {
        self.templates
            .iter()
            .find(|t| t.predicate == predicate && t.polarity == polarity)
    }

    /// Propose an edit that negates or bounds the first core member (in
    /// textual order) covered by a template.
    ///
    /// Negating any member of a minimal core breaks the contradiction, so
    /// addressing the earliest covered one is the minimal edit. Returns None
    /// when no template covers any member.
    pub fn propose(&self, clause: &Clause, unsat_core: &[Proposition]) -> Option<Rewrite> {
        if unsat_core.is_empty() {
            return None;
        }
        for prop in unsat_core {
            if let Some(template) = self.lookup(prop.predicate, prop.polarity) {
                let proposed_text = template.template.replace("{args}", &prop.args.join(" "));
                debug!(
                    clause_id = %clause.id,
                    predicate = ?prop.predicate,
                    "rewrite proposed from unsat core"
                );
                return Rewrite::proof_carrying(
                    (clause.start_offset, clause.end_offset),
                    proposed_text,
                    unsat_core.to_vec(),
                );
            }
        }
        debug!(clause_id = %clause.id, "no template covers the unsat core");
        None
    }
}
