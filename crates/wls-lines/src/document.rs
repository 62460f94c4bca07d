//! The persisted form of a world-line.
//!
//! ```json
//! {
//!   "id": "w1",
//!   "name": "Campaign",
//!   "history": [{ "id": "…", "timestamp": 1700000000000,
//!                 "changedObjects": [{ "type": "c", "id": "1", "digest": "…" }],
//!                 "parentId": "…" }],
//!   "cursor": "…",
//!   "activeChildren": { "<parent>": "<child>" }
//! }
//! ```
//!
//! Loading is lenient toward older documents: a missing cursor, a numeric
//! cursor (`currentIndex`), or a cursor naming an unknown node all select the
//! latest node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use wls_dag::{HistoryNode, WorldLine};
use wls_types::NodeId;

use crate::error::LineResult;

/// Cursor as written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedCursor {
    /// The id of the node at the cursor.
    Node(NodeId),
    /// Position in `history`, as written by older documents.
    Index(i64),
}

/// One world-line, as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldLineDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub history: Vec<HistoryNode>,
    #[serde(default, alias = "currentIndex")]
    pub cursor: Option<PersistedCursor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub active_children: BTreeMap<NodeId, NodeId>,
}

impl WorldLineDocument {
    /// Capture a world-line. The materialized state is left out.
    pub fn from_worldline(line: &WorldLine) -> Self {
        Self {
            id: line.id().to_string(),
            name: line.name().to_string(),
            history: line.history().to_vec(),
            cursor: line.cursor().cloned().map(PersistedCursor::Node),
            active_children: line.active_children().clone(),
        }
    }

    /// Rebuild the world-line, replaying history up to the cursor.
    pub fn into_worldline(self, replay_cache_capacity: usize) -> LineResult<WorldLine> {
        let cursor = self.resolve_cursor();
        let line = WorldLine::from_parts(
            self.id,
            self.name,
            self.history,
            cursor,
            self.active_children,
        )?;
        Ok(line.with_replay_cache_capacity(replay_cache_capacity))
    }

    /// Map the stored cursor onto a node id. `None` means "latest".
    fn resolve_cursor(&self) -> Option<NodeId> {
        if self.history.is_empty() {
            return None;
        }
        match &self.cursor {
            None => {
                warn!(worldline = %self.id, "document has no cursor; using latest node");
                None
            }
            Some(PersistedCursor::Node(id)) => {
                if self.history.iter().any(|n| n.id == *id) {
                    Some(id.clone())
                } else {
                    warn!(worldline = %self.id, cursor = %id, "cursor names unknown node; using latest node");
                    None
                }
            }
            Some(PersistedCursor::Index(index)) => {
                let node = usize::try_from(*index)
                    .ok()
                    .and_then(|i| self.history.get(i));
                match node {
                    Some(node) => Some(node.id.clone()),
                    None => {
                        warn!(worldline = %self.id, index, "cursor index out of range; using latest node");
                        None
                    }
                }
            }
        }
    }

    pub fn to_json(&self, pretty: bool) -> LineResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn from_json(json: &str) -> LineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
