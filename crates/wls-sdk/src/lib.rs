//! High-level SDK for the WorldLine Store.
//!
//! [`Wls`] is the entry point for applications: it hashes and stores object
//! values in the content-addressed store, records pointers to them in a
//! world-line's history DAG, moves the cursor through time, and persists
//! every change through the world-line store.
//!
//! Both stores are injected handles, so several independent stores can
//! coexist in one process.

pub mod codec;
pub mod config;
pub mod error;
pub mod repository;

pub use codec::{CanonicalJsonCodec, CodecRegistry, JsonCodec, PayloadCodec};
pub use config::StoreConfig;
pub use error::{SdkError, SdkResult};
pub use repository::Wls;

// Re-export key types
pub use wls_dag::{HistoryLayout, HistoryNode, NodeLayout, RecordMeta, StateChange, WorldLine, WorldState};
pub use wls_lines::WorldLineSummary;
pub use wls_types::{ContentKey, Digest, NodeId, ObjectKey, StateSnapshot, Timestamp};
