//! History node types.
//!
//! Each [`HistoryNode`] is one vertex of a world-line's history DAG. It
//! records only the snapshot pointers that changed relative to its parent,
//! so reconstructing a full world requires replaying from a root.

use serde::{Deserialize, Serialize};

use wls_types::{NodeId, StateSnapshot, Timestamp};

/// A node in the history DAG.
///
/// Nodes are immutable once appended. Several children may share a parent
/// (branching); children are derived from `parent_id` and never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNode {
    /// Generated, opaque identifier.
    pub id: NodeId,
    /// Wall-clock time of the append.
    pub timestamp: Timestamp,
    /// Pointers that changed relative to the parent.
    #[serde(alias = "changes")]
    pub changed_objects: Vec<StateSnapshot>,
    /// The parent node, or `None` for a root.
    #[serde(default, alias = "parent", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Who made the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form note about the change.
    #[serde(default, alias = "note", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HistoryNode {
    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns a human-readable one-line summary of this node.
    pub fn summary(&self) -> String {
        let objects: Vec<String> = self
            .changed_objects
            .iter()
            .map(|s| format!("{}:{}", s.object_type, s.id))
            .collect();
        match &self.description {
            Some(desc) => format!("{} [{}] {}", self.id.short_id(), objects.join(", "), desc),
            None => format!("{} [{}]", self.id.short_id(), objects.join(", ")),
        }
    }
}

/// Provenance attached to a recorded change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordMeta {
    pub author: Option<String>,
    pub description: Option<String>,
}

impl RecordMeta {
    /// No author, no description.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the author.
    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the description.
    pub fn note(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wls_types::{Digest, ObjectKey};

    fn node(parent: Option<&str>) -> HistoryNode {
        HistoryNode {
            id: NodeId::new("n-0001"),
            timestamp: Timestamp::from_millis(1000),
            changed_objects: vec![StateSnapshot::new(
                &ObjectKey::parse("counter:c1").unwrap(),
                Digest::from_u64(1),
            )],
            parent_id: parent.map(NodeId::from),
            author: None,
            description: None,
        }
    }

    #[test]
    fn root_detection() {
        assert!(node(None).is_root());
        assert!(!node(Some("n-0000")).is_root());
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(node(Some("n-0000"))).unwrap();
        assert_eq!(json["parentId"], "n-0000");
        assert_eq!(json["changedObjects"][0]["type"], "counter");
        assert!(json.get("author").is_none());
    }

    #[test]
    fn accepts_legacy_field_names() {
        let legacy = json!({
            "id": "old-1",
            "timestamp": 5,
            "changes": [{"type": "memo", "id": "m", "digest": "0000000000000002"}],
            "parent": "old-0",
            "note": "imported"
        });
        let parsed: HistoryNode = serde_json::from_value(legacy).unwrap();
        assert_eq!(parsed.parent_id, Some(NodeId::new("old-0")));
        assert_eq!(parsed.description.as_deref(), Some("imported"));
        assert_eq!(parsed.changed_objects.len(), 1);
    }

    #[test]
    fn summary_lists_objects() {
        let mut n = node(None);
        n.description = Some("bump".into());
        let summary = n.summary();
        assert!(summary.contains("counter:c1"));
        assert!(summary.contains("bump"));
    }

    #[test]
    fn meta_builder() {
        let meta = RecordMeta::empty().by("alice").note("first");
        assert_eq!(meta.author.as_deref(), Some("alice"));
        assert_eq!(meta.description.as_deref(), Some("first"));
    }
}
