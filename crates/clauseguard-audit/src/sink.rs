//! Durable JSONL persistence for audit records.
//!
//! One JSON record per line, appended in order; prior lines are never
//! rewritten. Any storage medium works for the chain as long as append
//! order is preserved; JSONL is the simplest one that satisfies that.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::chain::{AuditRecord, ChainError, verify_chain};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("audit sink I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("audit sink parse failure on {path} line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Integrity(#[from] ChainError),
}

/// Append-only JSONL writer for audit records.
pub struct JsonlSink {
    path: PathBuf,
    file: File,
}

impl JsonlSink {
    /// Open (or create) the sink at `path`; existing records are preserved.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one record and flush it to the medium.
    pub fn append(&mut self, record: &AuditRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record).expect("record serialization is infallible");
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.write_all(b"\n"))
            .and_then(|_| self.file.flush())
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Load records from a JSONL file without verifying them.
pub fn load(path: &Path) -> Result<Vec<AuditRecord>, SinkError> {
    let file = File::open(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| SinkError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load records and verify chain integrity in one step.
pub fn load_verified(path: &Path) -> Result<Vec<AuditRecord>, SinkError> {
    let records = load(path)?;
    verify_chain(&records)?;
    info!(path = %path.display(), records = records.len(), "audit chain replayed and verified");
    Ok(records)
}
