use thiserror::Error;
use wls_types::ContentKey;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("world-line not found: {0}")]
    WorldLineNotFound(String),

    #[error("world-line already exists: {0}")]
    AlreadyExists(String),

    #[error("payload missing from content store: {0}")]
    MissingPayload(ContentKey),

    #[error("codec error for type {object_type:?}: {reason}")]
    Codec { object_type: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid key: {0}")]
    Type(#[from] wls_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] wls_store::StoreError),

    #[error("history error: {0}")]
    Dag(#[from] wls_dag::DagError),

    #[error("world-line store error: {0}")]
    Line(#[from] wls_lines::LineError),
}

pub type SdkResult<T> = Result<T, SdkError>;
