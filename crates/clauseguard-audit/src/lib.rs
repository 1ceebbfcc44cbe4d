pub mod chain;
pub mod sink;

pub use chain::{AuditChain, AuditRecord, ChainError, Digest, verdict_hash, verify_chain};
pub use sink::{JsonlSink, SinkError, load_verified};
