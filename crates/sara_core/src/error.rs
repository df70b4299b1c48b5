use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the retrieval core. Every variant is fatal to the operation
/// in progress; there are no partial results and no retries at this layer.
#[derive(Error, Debug)]
pub enum SaraError {
    #[error("dataset is empty: no indexable records")]
    EmptyDataset,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index not found at {}", .path.display())]
    IndexNotFound { path: PathBuf },

    #[error("corrupt index at {}: {reason}", .path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("embedding provider error: {0:#}")]
    Provider(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SaraError>;
