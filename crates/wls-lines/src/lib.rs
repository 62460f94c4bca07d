//! World-line persistence for the WorldLine Store.
//!
//! A world-line is persisted as one JSON document keyed by its id:
//! `{ id, name, history, cursor }` plus the optional `activeChildren` map used
//! by DAG-aware forward navigation. The materialized world state is never
//! written; it is rebuilt from `history` and `cursor` on every load.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world-line persistence
//! - [`document`] -- The persisted [`WorldLineDocument`] and its back-compat rules
//! - [`traits`] -- The [`WorldLineStore`] trait
//! - [`names`] -- World-line id validation
//! - [`memory`] -- In-memory [`InMemoryWorldLineStore`] for tests
//! - [`fs`] -- [`FsWorldLineStore`], one file per world-line plus an index

pub mod document;
pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use document::{PersistedCursor, WorldLineDocument};
pub use error::{LineError, LineResult};
pub use fs::FsWorldLineStore;
pub use memory::InMemoryWorldLineStore;
pub use names::validate_worldline_id;
pub use traits::{WorldLineStore, WorldLineSummary};
