use wls_types::TypeError;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A key read back from storage could not be decoded.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] TypeError),

    /// A stored entry is malformed, or its location is claimed by another key.
    #[error("corrupt entry {entry}: {reason}")]
    CorruptEntry { entry: String, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
