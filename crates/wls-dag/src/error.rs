//! Error types for the history DAG.

use wls_types::NodeId;

/// Errors that can occur during world-line operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A referenced node was not found in the history.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A parent reference points to a node that is not earlier in the history.
    #[error("dangling parent reference: node {node} references missing parent {parent}")]
    DanglingParent {
        /// The node containing the bad reference.
        node: NodeId,
        /// The missing parent.
        parent: NodeId,
    },

    /// Attempted to add a node with an ID that already exists.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// A record call carried no changes.
    #[error("a history node must change at least one object")]
    EmptyChangeSet,

    /// The materialized state disagrees with a fresh replay.
    #[error("current state does not match replay of cursor {cursor:?}")]
    StateMismatch {
        /// Cursor whose path was replayed.
        cursor: Option<NodeId>,
    },
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
