//! Append-only audit hash chain.
//!
//! One tamper-evident record per verdict decision. Each record commits to
//! the verdict's canonical serialization and to its predecessor's hash, so
//! any retroactive edit to past verdicts is detectable by recomputation
//! alone, without re-running the analysis. There is no update or delete operation,
//! by construction.

use std::fmt;

use chrono::{DateTime, Utc};
use ring::digest::{Context, SHA256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use clauseguard_core::Verdict;

// Domain separation, so a verdict hash can never collide with a record hash.
const VERDICT_DOMAIN: &[u8] = b"clauseguard.verdict.v1";
const RECORD_DOMAIN: &[u8] = b"clauseguard.audit.record.v1";
const GENESIS_DOMAIN: &[u8] = b"clauseguard.audit.genesis.v1";

/// SHA-256 digest, serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk).ok()?;
            out[i] = u8::from_str_radix(s, 16).ok()?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Digest::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom("digest must be 64 hex characters"))
    }
}

fn sha256(parts: &[&[u8]]) -> Digest {
    let mut ctx = Context::new(&SHA256);
    for part in parts {
        ctx.update(part);
    }
    let digest = ctx.finish();
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    Digest(out)
}

/// The fixed `prev_hash` of the genesis record.
pub fn genesis_hash() -> Digest {
    sha256(&[GENESIS_DOMAIN])
}

/// Hash of the canonical verdict serialization.
///
/// `verification.elapsed` is zeroed first: wall-clock noise must not break
/// the idempotence property (two runs over identical input hash alike).
pub fn verdict_hash(verdict: &Verdict) -> Digest {
    let mut canonical = verdict.clone();
    if let Some(verification) = canonical.verification.as_mut() {
        verification.elapsed = std::time::Duration::ZERO;
    }
    let bytes = serde_json::to_vec(&canonical).expect("verdict serialization is infallible");
    sha256(&[VERDICT_DOMAIN, &bytes])
}

/// One link of the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence_no: u64,
    pub verdict_hash: Digest,
    pub prev_hash: Digest,
    pub record_hash: Digest,
    pub timestamp: DateTime<Utc>,
    pub engine_version: String,
}

fn record_hash(
    sequence_no: u64,
    verdict_hash: &Digest,
    prev_hash: &Digest,
    timestamp: &DateTime<Utc>,
    engine_version: &str,
) -> Digest {
    sha256(&[
        RECORD_DOMAIN,
        &sequence_no.to_be_bytes(),
        verdict_hash.as_bytes(),
        prev_hash.as_bytes(),
        timestamp.to_rfc3339().as_bytes(),
        engine_version.as_bytes(),
    ])
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("record {index} has a non-contiguous sequence number")]
    BadSequence { index: usize },
    #[error("record {index} does not link to its predecessor's hash")]
    BrokenLink { index: usize },
    #[error("record {index} fails hash recomputation; tampered or corrupted")]
    Tampered { index: usize },
}

/// In-memory audit chain; the single hard ordering constraint of the
/// pipeline. Appends require `&mut self`, which serializes writers.
pub struct AuditChain {
    records: Vec<AuditRecord>,
    engine_version: String,
}

impl AuditChain {
    pub fn new(engine_version: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            engine_version: engine_version.into(),
        }
    }

    /// Append one record for a verdict. Append-only: nothing else mutates
    /// the chain.
    pub fn append(&mut self, verdict: &Verdict, now: DateTime<Utc>) -> &AuditRecord {
        let sequence_no = self.records.len() as u64;
        let prev_hash = self
            .records
            .last()
            .map(|r| r.record_hash)
            .unwrap_or_else(genesis_hash);
        let verdict_hash = verdict_hash(verdict);
        let record_hash = record_hash(
            sequence_no,
            &verdict_hash,
            &prev_hash,
            &now,
            &self.engine_version,
        );
        self.records.push(AuditRecord {
            sequence_no,
            verdict_hash,
            prev_hash,
            record_hash,
            timestamp: now,
            engine_version: self.engine_version.clone(),
        });
        debug!(sequence_no, "audit record appended");
        self.records.last().expect("just pushed")
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Recompute the chain and report the first bad index.
///
/// Verifiable externally: needs only the records themselves, never the
/// verdicts or a re-run of the analysis.
pub fn verify_chain(records: &[AuditRecord]) -> Result<(), ChainError> {
    let mut prev = genesis_hash();
    for (index, record) in records.iter().enumerate() {
        if record.sequence_no != index as u64 {
            return Err(ChainError::BadSequence { index });
        }
        if record.prev_hash != prev {
            return Err(ChainError::BrokenLink { index });
        }
        let recomputed = record_hash(
            record.sequence_no,
            &record.verdict_hash,
            &record.prev_hash,
            &record.timestamp,
            &record.engine_version,
        );
        if recomputed != record.record_hash {
            return Err(ChainError::Tampered { index });
        }
        prev = record.record_hash;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clauseguard_core::{ClauseId, Severity, Verdict};

    fn verdict(id: u32, severity: Severity) -> Verdict {
        Verdict {
            clause_id: ClauseId(id),
            final_severity: severity,
            findings: vec![],
            verification: None,
            rewrite: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn build_chain(n: u32) -> AuditChain {
        let mut chain = AuditChain::new("clauseguard/0.1.0");
        for i in 0..n {
            chain.append(&verdict(i, Severity::Medium), t0());
        }
        chain
    }

    #[test]
    fn valid_chain_verifies() {
        let chain = build_chain(5);
        assert_eq!(verify_chain(chain.records()), Ok(()));
    }

    #[test]
    fn empty_chain_verifies() {
        assert_eq!(verify_chain(&[]), Ok(()));
    }

    #[test]
    fn genesis_record_links_to_fixed_constant() {
        let chain = build_chain(1);
        assert_eq!(chain.records()[0].prev_hash, genesis_hash());
    }

    #[test]
    fn flipping_a_stored_hash_is_detected_at_its_index() {
        let chain = build_chain(4);
        let mut records = chain.records().to_vec();
        let mut bytes = *records[2].verdict_hash.as_bytes();
        bytes[0] ^= 0xff;
        records[2].verdict_hash = Digest(bytes);
        assert_eq!(verify_chain(&records), Err(ChainError::Tampered { index: 2 }));
    }

    #[test]
    fn rewriting_a_record_breaks_the_next_link() {
        let chain = build_chain(4);
        let mut records = chain.records().to_vec();
        // Re-hash record 1 consistently after editing it; the chain must
        // still fail at record 2, whose prev_hash no longer matches.
        records[1].engine_version = "clauseguard/9.9.9".into();
        records[1].record_hash = record_hash(
            records[1].sequence_no,
            &records[1].verdict_hash,
            &records[1].prev_hash,
            &records[1].timestamp,
            &records[1].engine_version,
        );
        assert_eq!(
            verify_chain(&records),
            Err(ChainError::BrokenLink { index: 2 })
        );
    }

    #[test]
    fn missing_record_is_detected() {
        let chain = build_chain(4);
        let mut records = chain.records().to_vec();
        records.remove(1);
        assert_eq!(
            verify_chain(&records),
            Err(ChainError::BadSequence { index: 1 })
        );
    }

    #[test]
    fn verdict_hash_is_deterministic() {
        let v = verdict(7, Severity::High);
        assert_eq!(verdict_hash(&v), verdict_hash(&v.clone()));
    }

    #[test]
    fn verdict_hash_ignores_elapsed() {
        use clauseguard_core::{VerificationResult, VerifyStatus};
        use std::time::Duration;
        let mut a = verdict(1, Severity::High);
        a.verification = Some(VerificationResult {
            clause_id: ClauseId(1),
            status: VerifyStatus::Unsat,
            unsat_core: vec![],
            elapsed: Duration::from_millis(17),
        });
        let mut b = a.clone();
        b.verification.as_mut().unwrap().elapsed = Duration::from_millis(923);
        assert_eq!(verdict_hash(&a), verdict_hash(&b));
    }

    #[test]
    fn verdict_hash_distinguishes_content() {
        assert_ne!(
            verdict_hash(&verdict(1, Severity::High)),
            verdict_hash(&verdict(1, Severity::Low))
        );
    }

    #[test]
    fn digest_hex_round_trip() {
        let d = genesis_hash();
        let hex = d.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Digest::from_hex(&hex), Some(d));
        assert_eq!(Digest::from_hex("zz"), None);
    }

    #[test]
    fn record_json_round_trip() {
        let chain = build_chain(2);
        let json = serde_json::to_string(&chain.records()[1]).unwrap();
        let back: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chain.records()[1]);
    }
}
