//! World states and the branching history DAG of the WorldLine Store.
//!
//! A [`WorldLine`] records every change to a cluster of objects as a
//! [`HistoryNode`] holding only the snapshot pointers that changed relative
//! to its parent. Nodes form a DAG (a forest of trees, since each node has at
//! most one parent). A movable cursor selects "the present"; the
//! [`WorldState`] at the cursor is the fold of every node's changes along the
//! root-to-cursor path.
//!
//! Moving the cursor never touches history, so undo followed by redo loses
//! nothing, and recording while the cursor sits behind the newest node
//! starts a new branch.

pub mod error;
pub mod layout;
pub mod node;
pub mod replay;
pub mod state;
pub mod worldline;

pub use error::{DagError, DagResult};
pub use layout::{HistoryLayout, NodeLayout};
pub use node::{HistoryNode, RecordMeta};
pub use replay::ReplayCache;
pub use state::{StateChange, WorldState};
pub use worldline::WorldLine;
