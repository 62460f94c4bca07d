//! Error types for world-line persistence.

use thiserror::Error;
use wls_dag::DagError;

/// Errors that can occur while saving, loading, or listing world-lines.
#[derive(Debug, Error)]
pub enum LineError {
    /// No world-line is stored under this id.
    #[error("world-line not found: {id}")]
    NotFound { id: String },

    /// The world-line id cannot be used as a storage key.
    #[error("invalid world-line id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted history violates the DAG invariants.
    #[error("invalid history: {0}")]
    Dag(#[from] DagError),
}

impl From<serde_json::Error> for LineError {
    fn from(e: serde_json::Error) -> Self {
        LineError::Serialization(e.to_string())
    }
}

/// Convenience type alias for world-line persistence.
pub type LineResult<T> = std::result::Result<T, LineError>;
