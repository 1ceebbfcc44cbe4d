//! Statutory axiom packs.
//!
//! An axiom is a proposition set asserted true in every check, derived from
//! a statute or guideline and keyed by citation. The core never parses the
//! legal text itself; the citation is an opaque reference into the external
//! legal database.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use clauseguard_core::{CitationId, Domain, Proposition};

const BUILTIN_AXIOMS: &str = include_str!("axioms/statutory.json");

/// A statutory-derived proposition set, always asserted true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axiom {
    pub citation: CitationId,
    /// Domains the axiom applies to; empty means every domain.
    #[serde(default)]
    pub domains: Vec<Domain>,
    pub propositions: Vec<Proposition>,
    pub note: String,
}

impl Axiom {
    pub fn applies_to(&self, domain: Domain) -> bool {
        self.domains.is_empty()
            || self.domains.contains(&domain)
            || self.domains.contains(&Domain::Generic)
    }
}

#[derive(Debug, Error)]
pub enum AxiomError {
    #[error("failed to read axiom pack {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse axiom pack {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// The embedded statutory axioms.
pub fn built_in_axioms() -> Vec<Axiom> {
    serde_json::from_str(BUILTIN_AXIOMS).expect("built-in axiom pack must parse")
}

/// Load an additional axiom pack from disk.
pub fn load_axiom_pack(path: &Path) -> Result<Vec<Axiom>, AxiomError> {
    let raw = fs::read_to_string(path).map_err(|source| AxiomError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| AxiomError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Select the axioms applicable under the active domain.
pub fn applicable_axioms(axioms: &[Axiom], domain: Domain) -> Vec<&Axiom> {
    axioms.iter().filter(|a| a.applies_to(domain)).collect()
}
