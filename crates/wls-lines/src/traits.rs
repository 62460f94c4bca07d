//! The [`WorldLineStore`] trait defining the world-line storage interface.
//!
//! Any backend (in-memory, filesystem, database) implements this trait to
//! persist world-lines as documents keyed by id.

use serde::{Deserialize, Serialize};
use wls_dag::WorldLine;

use crate::error::{LineError, LineResult};

/// Index entry for browsing stored world-lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldLineSummary {
    pub id: String,
    pub name: String,
    /// Number of history nodes at the last save.
    #[serde(default)]
    pub node_count: usize,
}

impl WorldLineSummary {
    pub fn of(line: &WorldLine) -> Self {
        Self {
            id: line.id().to_string(),
            name: line.name().to_string(),
            node_count: line.len(),
        }
    }
}

/// Storage backend for world-line documents.
///
/// Implementations must be thread-safe (`Send + Sync`). Saves are upserts;
/// the last save for an id wins. There is no cross-writer locking.
pub trait WorldLineStore: Send + Sync {
    /// Write `line` under its id, replacing any previous document.
    fn save(&self, line: &WorldLine) -> LineResult<()>;

    /// Read a world-line by id, rebuilding its current state.
    ///
    /// Returns `Ok(None)` if nothing is stored under `id`.
    fn load(&self, id: &str) -> LineResult<Option<WorldLine>>;

    /// Summaries of every stored world-line, sorted by id.
    fn list(&self) -> LineResult<Vec<WorldLineSummary>>;

    /// Remove a world-line.
    ///
    /// Returns `Ok(true)` if it existed and was deleted, `Ok(false)` if it
    /// did not exist.
    fn delete(&self, id: &str) -> LineResult<bool>;

    /// Returns `true` if a world-line is stored under `id`.
    fn exists(&self, id: &str) -> LineResult<bool> {
        Ok(self.list()?.iter().any(|s| s.id == id))
    }

    /// Like [`load`](Self::load), but a missing id is an error.
    fn fetch(&self, id: &str) -> LineResult<WorldLine> {
        self.load(id)?.ok_or_else(|| LineError::NotFound { id: id.to_string() })
    }
}
