//! Effect-tag extraction.
//!
//! An effect tag is a normalized label for a clause's legal effect
//! ("termination-right", "liability-cap"). Tags drive the cross-clause
//! coherence and time-limit analyses, so they are extracted once at
//! segmentation time and frozen on the [`Clause`](crate::types::Clause).
//!
//! The lexicon is declarative data: the built-in English rules live in a
//! const table, and [`EffectLexicon::from_spec`] accepts custom packs, so a
//! new contract language is additive data rather than new code.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized legal-effect labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EffectTag {
    TerminationRight,
    Liability,
    LiabilityCap,
    Damages,
    Indemnity,
    Warranty,
    Confidentiality,
    NonCompete,
    Payment,
    Notice,
    Inspection,
    ContractTerm,
}

impl EffectTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TerminationRight => "termination-right",
            Self::Liability => "liability",
            Self::LiabilityCap => "liability-cap",
            Self::Damages => "damages",
            Self::Indemnity => "indemnity",
            Self::Warranty => "warranty",
            Self::Confidentiality => "confidentiality",
            Self::NonCompete => "non-compete",
            Self::Payment => "payment",
            Self::Notice => "notice",
            Self::Inspection => "inspection",
            Self::ContractTerm => "contract-term",
        }
    }

    /// Tags whose clauses must carry an explicit temporal bound.
    pub fn is_time_sensitive(&self) -> bool {
        matches!(
            self,
            Self::TerminationRight
                | Self::Liability
                | Self::Warranty
                | Self::Indemnity
                | Self::Confidentiality
                | Self::NonCompete
                | Self::ContractTerm
        )
    }
}

/// How the effect is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCondition {
    /// No trigger condition stated, or an explicit any-time grant.
    Unconditional,
    /// Triggered by a normalized condition label, e.g. `notice-90-days`.
    Conditioned(String),
}

/// One extracted effect on a clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectAssignment {
    pub tag: EffectTag,
    pub condition: EffectCondition,
}

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("invalid effect pattern for {tag:?}: {source}")]
    BadPattern {
        tag: EffectTag,
        source: regex::Error,
    },
    #[error("invalid condition cue `{pattern}`: {source}")]
    BadCue {
        pattern: String,
        source: regex::Error,
    },
}

/// Declarative form of a lexicon, suitable for loading from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectLexiconSpec {
    pub rules: Vec<EffectRuleSpec>,
    /// Cues that make an effect explicitly unconditional ("at any time").
    pub unconditional_cues: Vec<String>,
    /// Cues mapping to a normalized condition label. `$1` in the label is
    /// replaced by the first capture group.
    pub condition_cues: Vec<ConditionCueSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectRuleSpec {
    pub tag: EffectTag,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionCueSpec {
    pub pattern: String,
    pub label: String,
}

struct EffectRule {
    tag: EffectTag,
    pattern: Regex,
}

struct ConditionCue {
    pattern: Regex,
    label: String,
}

/// Compiled effect lexicon.
pub struct EffectLexicon {
    rules: Vec<EffectRule>,
    unconditional_cues: Vec<Regex>,
    condition_cues: Vec<ConditionCue>,
}

// Built-in English rules. Case-insensitive; matching is per whole clause.
const BUILTIN_RULES: &[(EffectTag, &str)] = &[
    (
        EffectTag::TerminationRight,
        r"(?i)\b(?:terminat(?:e|es|ion)|cancel(?:s|lation)?)\b",
    ),
    (
        EffectTag::LiabilityCap,
        r"(?i)\b(?:aggregate liability|liability (?:is|shall be) (?:limited|capped)|cap on (?:liability|damages)|limitation of liability)\b",
    ),
    (
        EffectTag::Liability,
        r"(?i)\b(?:liable|liability|responsible for (?:any|all) (?:loss|damage))\b",
    ),
    (
        EffectTag::Damages,
        r"(?i)\b(?:damages|compensate|compensation for)\b",
    ),
    (
        EffectTag::Indemnity,
        r"(?i)\b(?:indemnif(?:y|ies|ication)|hold harmless)\b",
    ),
    (
        EffectTag::Warranty,
        r"(?i)\b(?:warrant(?:s|y|ies)|guarantee[sd]?)\b",
    ),
    (
        EffectTag::Confidentiality,
        r"(?i)\b(?:confidential(?:ity)?|non-?disclosure|trade secrets?)\b",
    ),
    (
        EffectTag::NonCompete,
        r"(?i)\b(?:non-?compete|not (?:engage|compete) in|competing business)\b",
    ),
    (
        EffectTag::Payment,
        r"(?i)\b(?:pay(?:ment|able)?|fees?|invoice[sd]?|remit)\b",
    ),
    (
        EffectTag::Notice,
        r"(?i)\b(?:notify|notice to|notification)\b",
    ),
    (
        EffectTag::Inspection,
        r"(?i)\b(?:inspect(?:ion)?|acceptance test(?:ing)?|audit rights?)\b",
    ),
    (
        EffectTag::ContractTerm,
        r"(?i)\b(?:term of this agreement|contract period|renewal|renew(?:s|ed)?)\b|契約期間",
    ),
];

const BUILTIN_UNCONDITIONAL: &[&str] = &[
    r"(?i)\bat any time\b",
    r"(?i)\bfor any reason\b",
    r"(?i)\bwithout (?:cause|notice|prior notice)\b",
    r"(?i)\bin its sole discretion\b",
    r"(?i)\bfor convenience\b",
];

const BUILTIN_CONDITIONS: &[(&str, &str)] = &[
    (
        r"(?i)(\d+)\s*(?:calendar\s+|business\s+)?days[’']?\s*(?:prior\s+)?(?:written\s+)?notice",
        "notice-$1-days",
    ),
    (r"(?i)\bmaterial(?:ly)?\s+breach", "material-breach"),
    (
        r"(?i)\b(?:insolven(?:t|cy)|bankruptcy|receivership|winding[- ]up)",
        "insolvency",
    ),
    (r"(?i)\bupon\s+mutual\s+(?:written\s+)?agreement", "mutual-agreement"),
    (r"(?i)\bsubject to\b", "subject-to"),
    (r"(?i)\bprovided that\b", "proviso"),
];

impl EffectLexicon {
    /// The built-in English lexicon.
    pub fn built_in() -> Self {
        let spec = EffectLexiconSpec {
            rules: BUILTIN_RULES
                .iter()
                .map(|(tag, pattern)| EffectRuleSpec {
                    tag: *tag,
                    pattern: pattern.to_string(),
                })
                .collect(),
            unconditional_cues: BUILTIN_UNCONDITIONAL
                .iter()
                .map(|s| s.to_string())
                .collect(),
            condition_cues: BUILTIN_CONDITIONS
                .iter()
                .map(|(pattern, label)| ConditionCueSpec {
                    pattern: pattern.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        };
        // The built-in table is compile-time data; a bad pattern is a bug.
        Self::from_spec(&spec).expect("built-in effect lexicon must compile")
    }

    /// Compile a declarative lexicon pack.
    pub fn from_spec(spec: &EffectLexiconSpec) -> Result<Self, LexiconError> {
        let rules = spec
            .rules
            .iter()
            .map(|r| {
                Regex::new(&r.pattern)
                    .map(|pattern| EffectRule { tag: r.tag, pattern })
                    .map_err(|source| LexiconError::BadPattern { tag: r.tag, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let unconditional_cues = spec
            .unconditional_cues
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| LexiconError::BadCue {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let condition_cues = spec
            .condition_cues
            .iter()
            .map(|c| {
                Regex::new(&c.pattern)
                    .map(|pattern| ConditionCue {
                        pattern,
                        label: c.label.clone(),
                    })
                    .map_err(|source| LexiconError::BadCue {
                        pattern: c.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            unconditional_cues,
            condition_cues,
        })
    }

    /// Extract all effect assignments from one clause text.
    ///
    /// Rule order in the lexicon fixes output order; each tag is reported
    /// at most once per clause.
    pub fn extract(&self, text: &str) -> Vec<EffectAssignment> {
        let condition = self.classify_condition(text);
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for rule in &self.rules {
            if seen.contains(&rule.tag) {
                continue;
            }
            if rule.pattern.is_match(text) {
                seen.push(rule.tag);
                out.push(EffectAssignment {
                    tag: rule.tag,
                    condition: condition.clone(),
                });
            }
        }
        out
    }

    /// Classify how the clause's effects trigger.
    ///
    /// An explicit any-time cue wins over condition cues: "may terminate at
    /// any time, provided that..." still reads as an unconditional grant
    /// with trailing caveats, which is exactly the asymmetry the coherence
    /// checker needs to see.
    fn classify_condition(&self, text: &str) -> EffectCondition {
        if self.unconditional_cues.iter().any(|c| c.is_match(text)) {
            return EffectCondition::Unconditional;
        }
        for cue in &self.condition_cues {
            if let Some(caps) = cue.pattern.captures(text) {
                let label = match caps.get(1) {
                    Some(g) => cue.label.replace("$1", g.as_str()),
                    None => cue.label.clone(),
                };
                return EffectCondition::Conditioned(label);
            }
        }
        EffectCondition::Unconditional
    }
}
