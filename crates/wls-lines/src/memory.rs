//! In-memory world-line store for testing and ephemeral use.
//!
//! [`InMemoryWorldLineStore`] keeps serialized documents in a `HashMap`
//! protected by a `RwLock`. Loads go through the same document decoding and
//! replay as the filesystem backend, so persisted-form behavior can be
//! exercised without touching disk.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use wls_dag::replay::DEFAULT_REPLAY_CACHE_CAPACITY;
use wls_dag::WorldLine;

use crate::document::WorldLineDocument;
use crate::error::{LineError, LineResult};
use crate::names::validate_worldline_id;
use crate::traits::{WorldLineStore, WorldLineSummary};

/// An in-memory implementation of [`WorldLineStore`].
///
/// Data is lost when the store is dropped.
pub struct InMemoryWorldLineStore {
    documents: RwLock<HashMap<String, String>>,
    replay_cache_capacity: usize,
}

impl InMemoryWorldLineStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            replay_cache_capacity: DEFAULT_REPLAY_CACHE_CAPACITY,
        }
    }

    /// Set the replay memo capacity given to loaded world-lines.
    pub fn with_replay_cache_capacity(mut self, capacity: usize) -> Self {
        self.replay_cache_capacity = capacity;
        self
    }

    /// The raw JSON document stored under `id`, if any.
    pub fn raw_document(&self, id: &str) -> Option<String> {
        self.documents.read().expect("lock poisoned").get(id).cloned()
    }

    /// Store a raw JSON document as-is, bypassing serialization.
    ///
    /// Useful for feeding documents written by older versions.
    pub fn insert_raw(&self, id: impl Into<String>, json: impl Into<String>) {
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(id.into(), json.into());
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryWorldLineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryWorldLineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWorldLineStore")
            .field("document_count", &self.len())
            .field("replay_cache_capacity", &self.replay_cache_capacity)
            .finish()
    }
}

impl WorldLineStore for InMemoryWorldLineStore {
    fn save(&self, line: &WorldLine) -> LineResult<()> {
        validate_worldline_id(line.id())?;
        let json = WorldLineDocument::from_worldline(line).to_json(false)?;
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(line.id().to_string(), json);
        debug!(worldline = %line.id(), nodes = line.len(), "saved world-line");
        Ok(())
    }

    fn load(&self, id: &str) -> LineResult<Option<WorldLine>> {
        let Some(json) = self.raw_document(id) else {
            return Ok(None);
        };
        let document = WorldLineDocument::from_json(&json)?;
        if document.id != id {
            return Err(LineError::Serialization(format!(
                "document stored under {id:?} has id {:?}",
                document.id
            )));
        }
        Ok(Some(document.into_worldline(self.replay_cache_capacity)?))
    }

    fn list(&self) -> LineResult<Vec<WorldLineSummary>> {
        let documents = self.documents.read().expect("lock poisoned");
        let mut summaries = Vec::with_capacity(documents.len());
        for json in documents.values() {
            let document = WorldLineDocument::from_json(json)?;
            summaries.push(WorldLineSummary {
                id: document.id,
                name: document.name,
                node_count: document.history.len(),
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> LineResult<bool> {
        let removed = self
            .documents
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some();
        Ok(removed)
    }

    fn exists(&self, id: &str) -> LineResult<bool> {
        Ok(self
            .documents
            .read()
            .expect("lock poisoned")
            .contains_key(id))
    }
}
