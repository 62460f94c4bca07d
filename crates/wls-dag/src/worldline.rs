//! The world-line: an append-only, branching history with a movable cursor.
//!
//! [`WorldLine`] stores nodes in append order and keeps a node-id index plus
//! a forward-edge index (`children`) for branch queries. The world state at
//! the cursor is materialized so reads are O(1); any other position is
//! reconstructed by replaying parent pointers back to a root.
//!
//! # Invariants
//!
//! - `history` is append-only: nodes are never removed, reordered, or edited.
//! - Every `parent_id` names a node appended earlier (no dangling or forward
//!   references), so parent walks always terminate at a root.
//! - `cursor` is `None` exactly when history is empty; otherwise it names a
//!   node in history.
//! - `current_state` equals the replay of the root-to-cursor path.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use tracing::debug;

use wls_types::{NodeId, StateSnapshot, Timestamp};

use crate::error::{DagError, DagResult};
use crate::layout::HistoryLayout;
use crate::node::{HistoryNode, RecordMeta};
use crate::replay::{replay, ReplayCache};
use crate::state::WorldState;

/// One independently versioned history stream.
#[derive(Debug)]
pub struct WorldLine {
    id: String,
    name: String,
    /// All nodes, in append order.
    history: Vec<HistoryNode>,
    /// Node id -> position in `history`.
    index: HashMap<NodeId, usize>,
    /// Forward-edge index: parent -> children in append order.
    children: HashMap<NodeId, Vec<NodeId>>,
    cursor: Option<NodeId>,
    current_state: WorldState,
    /// Parent -> child last travelled through; drives `move_forward`.
    active_children: BTreeMap<NodeId, NodeId>,
    replay_cache: Mutex<ReplayCache>,
}

impl WorldLine {
    /// Create an empty world-line.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            history: Vec::new(),
            index: HashMap::new(),
            children: HashMap::new(),
            cursor: None,
            current_state: WorldState::new(),
            active_children: BTreeMap::new(),
            replay_cache: Mutex::new(ReplayCache::default()),
        }
    }

    /// Replace the replay memo with one of the given capacity.
    pub fn with_replay_cache_capacity(self, capacity: usize) -> Self {
        Self {
            replay_cache: Mutex::new(ReplayCache::new(capacity)),
            ..self
        }
    }

    /// Rebuild a world-line from persisted parts.
    ///
    /// Nodes are validated in order: each must have a fresh id and a parent
    /// that appeared earlier. A `None` cursor on a non-empty history selects
    /// the latest node. Active-child entries that are not real parent/child
    /// edges are dropped. `current_state` is recomputed by replay.
    pub fn from_parts(
        id: impl Into<String>,
        name: impl Into<String>,
        history: Vec<HistoryNode>,
        cursor: Option<NodeId>,
        active_children: BTreeMap<NodeId, NodeId>,
    ) -> DagResult<Self> {
        let mut line = Self::new(id, name);
        for node in history {
            line.push_node(node)?;
        }
        for (parent, child) in active_children {
            let is_edge = line
                .node(&child)
                .and_then(|n| n.parent_id.as_ref())
                .is_some_and(|p| *p == parent);
            if is_edge {
                line.active_children.insert(parent, child);
            }
        }
        match cursor {
            Some(target) => line.move_to(&target)?,
            None => {
                line.move_to_latest();
            }
        }
        Ok(line)
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes in append order.
    pub fn history(&self) -> &[HistoryNode] {
        &self.history
    }

    /// Number of history nodes.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The node currently considered "the present".
    pub fn cursor(&self) -> Option<&NodeId> {
        self.cursor.as_ref()
    }

    pub fn cursor_node(&self) -> Option<&HistoryNode> {
        self.cursor.as_ref().and_then(|id| self.node(id))
    }

    /// The materialized world at the cursor.
    pub fn current_state(&self) -> &WorldState {
        &self.current_state
    }

    /// Remembered parent -> child choices, for persistence.
    pub fn active_children(&self) -> &BTreeMap<NodeId, NodeId> {
        &self.active_children
    }

    pub fn node(&self, id: &NodeId) -> Option<&HistoryNode> {
        self.index.get(id).map(|&i| &self.history[i])
    }

    /// The most recently appended node.
    pub fn latest(&self) -> Option<&HistoryNode> {
        self.history.last()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Rename the world-line. Nothing else changes.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Consume and return the world-line under a new name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename(name);
        self
    }

    /// Record one changed pointer as a new child of the cursor.
    ///
    /// A new node is appended even when `snapshot` equals the current pointer
    /// for that object: recording is provenance, dedup happens in the content
    /// store. The cursor advances to the new node.
    pub fn record(&mut self, snapshot: StateSnapshot, meta: RecordMeta) -> NodeId {
        self.append(vec![snapshot], meta)
    }

    /// Record several changed pointers as one node. Later entries win over
    /// earlier ones for the same object.
    pub fn record_many(
        &mut self,
        snapshots: Vec<StateSnapshot>,
        meta: RecordMeta,
    ) -> DagResult<NodeId> {
        if snapshots.is_empty() {
            return Err(DagError::EmptyChangeSet);
        }
        Ok(self.append(snapshots, meta))
    }

    fn append(&mut self, changed_objects: Vec<StateSnapshot>, meta: RecordMeta) -> NodeId {
        let node = HistoryNode {
            id: NodeId::generate(),
            timestamp: Timestamp::now(),
            changed_objects,
            parent_id: self.cursor.clone(),
            author: meta.author,
            description: meta.description,
        };
        let id = node.id.clone();

        self.current_state = self
            .current_state
            .set_many(node.changed_objects.iter().cloned());
        if let Some(parent) = &node.parent_id {
            self.active_children.insert(parent.clone(), id.clone());
        }
        self.link(node);
        self.cursor = Some(id.clone());

        debug!(
            worldline = %self.id,
            node = %id.short_id(),
            depth = self.history.len(),
            "recorded history node"
        );
        id
    }

    /// Validate and append a node without touching the cursor.
    fn push_node(&mut self, node: HistoryNode) -> DagResult<()> {
        if self.index.contains_key(&node.id) {
            return Err(DagError::DuplicateNode(node.id));
        }
        if let Some(parent) = &node.parent_id {
            if !self.index.contains_key(parent) {
                return Err(DagError::DanglingParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        self.link(node);
        Ok(())
    }

    fn link(&mut self, node: HistoryNode) {
        if let Some(parent) = &node.parent_id {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(node.id.clone());
        }
        self.index.insert(node.id.clone(), self.history.len());
        self.history.push(node);
    }

    // ---------------------------------------------------------------
    // Cursor movement
    // ---------------------------------------------------------------

    /// Move the cursor to `target`, rebuilding the current state by replay.
    ///
    /// History is untouched. Every edge on the root-to-target path becomes the
    /// remembered choice for `move_forward`.
    pub fn move_to(&mut self, target: &NodeId) -> DagResult<()> {
        let state = self.state_at(target)?;
        self.remember_path(target);
        self.cursor = Some(target.clone());
        self.current_state = state;
        debug!(worldline = %self.id, node = %target.short_id(), "moved cursor");
        Ok(())
    }

    /// Move to the cursor's parent. Returns the new cursor, or `None` when the
    /// cursor is at a root or the world-line is empty.
    pub fn move_back(&mut self) -> Option<NodeId> {
        let parent = self.cursor_node()?.parent_id.clone()?;
        self.move_to(&parent).ok()?;
        Some(parent)
    }

    /// Move to the remembered child of the cursor, falling back to its most
    /// recently appended child. Returns `None` at a leaf.
    pub fn move_forward(&mut self) -> Option<NodeId> {
        let cursor = self.cursor.clone()?;
        let next = self
            .active_children
            .get(&cursor)
            .cloned()
            .or_else(|| self.children.get(&cursor).and_then(|c| c.last().cloned()))?;
        self.move_to(&next).ok()?;
        Some(next)
    }

    /// Move to the most recently appended node. Returns `None` when empty.
    pub fn move_to_latest(&mut self) -> Option<NodeId> {
        let latest = self.history.last()?.id.clone();
        self.move_to(&latest).ok()?;
        Some(latest)
    }

    fn remember_path(&mut self, target: &NodeId) {
        let mut child = target.clone();
        while let Some(parent) = self.node(&child).and_then(|n| n.parent_id.clone()) {
            self.active_children.insert(parent.clone(), child);
            child = parent;
        }
    }

    // ---------------------------------------------------------------
    // Replay
    // ---------------------------------------------------------------

    /// The full world state at `target`, without moving the cursor.
    ///
    /// Walks parent pointers until a root or a memoised ancestor, then folds
    /// the collected nodes forward.
    pub fn state_at(&self, target: &NodeId) -> DagResult<WorldState> {
        if !self.index.contains_key(target) {
            return Err(DagError::NodeNotFound(target.clone()));
        }
        let mut cache = self.replay_cache.lock().expect("replay cache lock poisoned");
        if let Some(state) = cache.get(target) {
            return Ok(state.clone());
        }

        let mut pending = Vec::new();
        let mut base = WorldState::new();
        let mut next = Some(target);
        while let Some(id) = next {
            if let Some(state) = cache.get(id) {
                base = state.clone();
                break;
            }
            let node = self
                .node(id)
                .ok_or_else(|| DagError::NodeNotFound(id.clone()))?;
            pending.push(node);
            next = node.parent_id.as_ref();
        }
        for node in pending.iter().rev() {
            base.fold_in(node.changed_objects.iter().cloned());
        }

        cache.insert(target.clone(), base.clone());
        Ok(base)
    }

    // ---------------------------------------------------------------
    // Branch queries
    // ---------------------------------------------------------------

    /// Root-to-target path, oldest first.
    pub fn path_to(&self, target: &NodeId) -> DagResult<Vec<&HistoryNode>> {
        let mut path = Vec::new();
        let mut next = Some(target);
        while let Some(id) = next {
            let node = self
                .node(id)
                .ok_or_else(|| DagError::NodeNotFound(id.clone()))?;
            path.push(node);
            next = node.parent_id.as_ref();
        }
        path.reverse();
        Ok(path)
    }

    /// Direct children of `id`, in append order.
    pub fn children_of(&self, id: &NodeId) -> Vec<&HistoryNode> {
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| self.node(c)).collect())
            .unwrap_or_default()
    }

    /// Nodes with no parent, in append order.
    pub fn roots(&self) -> Vec<&HistoryNode> {
        self.history.iter().filter(|n| n.is_root()).collect()
    }

    /// Nodes with no children, in append order.
    pub fn leaves(&self) -> Vec<&HistoryNode> {
        self.history
            .iter()
            .filter(|n| !self.children.contains_key(&n.id))
            .collect()
    }

    /// Ids of every node from the cursor up to its root.
    pub fn current_path(&self) -> HashSet<NodeId> {
        let mut ids = HashSet::new();
        let mut next = self.cursor.as_ref();
        while let Some(id) = next {
            ids.insert(id.clone());
            next = self.node(id).and_then(|n| n.parent_id.as_ref());
        }
        ids
    }

    /// Returns `true` if `ancestor` lies strictly above `descendant`.
    pub fn is_ancestor(&self, ancestor: &NodeId, descendant: &NodeId) -> bool {
        let mut next = self.node(descendant).and_then(|n| n.parent_id.as_ref());
        while let Some(id) = next {
            if id == ancestor {
                return true;
            }
            next = self.node(id).and_then(|n| n.parent_id.as_ref());
        }
        false
    }

    /// Depth and branch number of every node, for drawing the history graph.
    pub fn compute_layout(&self) -> HistoryLayout {
        HistoryLayout::compute(self)
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Re-check the structural invariants and the materialized state.
    pub fn validate(&self) -> DagResult<()> {
        let mut seen = HashSet::new();
        for node in &self.history {
            if let Some(parent) = &node.parent_id {
                if !seen.contains(parent) {
                    return Err(DagError::DanglingParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            if !seen.insert(node.id.clone()) {
                return Err(DagError::DuplicateNode(node.id.clone()));
            }
        }

        let expected = match &self.cursor {
            Some(cursor) => replay(self.path_to(cursor)?),
            None if self.history.is_empty() => WorldState::new(),
            None => return Err(DagError::StateMismatch { cursor: None }),
        };
        if expected != self.current_state {
            return Err(DagError::StateMismatch {
                cursor: self.cursor.clone(),
            });
        }
        Ok(())
    }
}

impl Clone for WorldLine {
    fn clone(&self) -> Self {
        let cache = self
            .replay_cache
            .lock()
            .expect("replay cache lock poisoned")
            .clone();
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            history: self.history.clone(),
            index: self.index.clone(),
            children: self.children.clone(),
            cursor: self.cursor.clone(),
            current_state: self.current_state.clone(),
            active_children: self.active_children.clone(),
            replay_cache: Mutex::new(cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wls_types::{Digest, ObjectKey};

    fn snap(key: &str, digest: u64) -> StateSnapshot {
        StateSnapshot::new(&ObjectKey::parse(key).unwrap(), Digest::from_u64(digest))
    }

    fn digest_of(line: &WorldLine, key: &str) -> Option<u64> {
        let key = ObjectKey::parse(key).unwrap();
        line.current_state()
            .get_key(&key)
            .map(|s| s.digest.as_u64())
    }

    /// Linear history: c:1 = 1, 2, 3.
    fn linear() -> (WorldLine, Vec<NodeId>) {
        let mut line = WorldLine::new("w1", "Demo");
        let ids = (1..=3)
            .map(|d| line.record(snap("c:1", d), RecordMeta::empty()))
            .collect();
        (line, ids)
    }

    // ----------------------------------------------------------
    // Recording
    // ----------------------------------------------------------

    #[test]
    fn new_world_line_is_empty() {
        let line = WorldLine::new("w1", "Demo");
        assert!(line.is_empty());
        assert!(line.cursor().is_none());
        assert!(line.current_state().is_empty());
        line.validate().unwrap();
    }

    #[test]
    fn record_appends_and_advances_cursor() {
        let (line, ids) = linear();
        assert_eq!(line.len(), 3);
        assert_eq!(line.cursor(), Some(&ids[2]));
        assert_eq!(digest_of(&line, "c:1"), Some(3));
        assert!(line.history()[0].is_root());
        assert_eq!(line.history()[1].parent_id.as_ref(), Some(&ids[0]));
        line.validate().unwrap();
    }

    #[test]
    fn identical_value_still_appends_node() {
        let mut line = WorldLine::new("w1", "Demo");
        line.record(snap("c:1", 7), RecordMeta::empty());
        line.record(snap("c:1", 7), RecordMeta::empty());
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn record_keeps_meta() {
        let mut line = WorldLine::new("w1", "Demo");
        let id = line.record(snap("c:1", 1), RecordMeta::empty().by("ana").note("init"));
        let node = line.node(&id).unwrap();
        assert_eq!(node.author.as_deref(), Some("ana"));
        assert_eq!(node.description.as_deref(), Some("init"));
    }

    #[test]
    fn record_many_folds_batch() {
        let mut line = WorldLine::new("w1", "Demo");
        line.record_many(
            vec![snap("c:1", 1), snap("m:1", 2), snap("c:1", 3)],
            RecordMeta::empty(),
        )
        .unwrap();
        assert_eq!(line.len(), 1);
        assert_eq!(line.current_state().len(), 2);
        assert_eq!(digest_of(&line, "c:1"), Some(3));
    }

    #[test]
    fn record_many_rejects_empty_batch() {
        let mut line = WorldLine::new("w1", "Demo");
        let err = line.record_many(vec![], RecordMeta::empty()).unwrap_err();
        assert!(matches!(err, DagError::EmptyChangeSet));
        assert!(line.is_empty());
    }

    #[test]
    fn deltas_accumulate_across_objects() {
        let mut line = WorldLine::new("w1", "Demo");
        line.record(snap("c:1", 1), RecordMeta::empty());
        line.record(snap("m:1", 5), RecordMeta::empty());
        assert_eq!(line.current_state().len(), 2);
        assert_eq!(line.history()[1].changed_objects.len(), 1);
    }

    // ----------------------------------------------------------
    // Cursor movement
    // ----------------------------------------------------------

    #[test]
    fn move_to_replays_state() {
        let (mut line, ids) = linear();
        line.move_to(&ids[0]).unwrap();
        assert_eq!(digest_of(&line, "c:1"), Some(1));
        assert_eq!(line.len(), 3);
        line.validate().unwrap();
    }

    #[test]
    fn move_to_unknown_node_fails() {
        let (mut line, ids) = linear();
        let err = line.move_to(&NodeId::new("missing")).unwrap_err();
        assert!(matches!(err, DagError::NodeNotFound(_)));
        assert_eq!(line.cursor(), Some(&ids[2]));
    }

    #[test]
    fn back_then_forward_round_trips() {
        let (mut line, ids) = linear();
        let before = line.current_state().clone();

        assert_eq!(line.move_back(), Some(ids[1].clone()));
        assert_eq!(digest_of(&line, "c:1"), Some(2));
        assert_eq!(line.move_forward(), Some(ids[2].clone()));
        assert_eq!(line.current_state(), &before);
    }

    #[test]
    fn back_at_root_and_forward_at_leaf_do_nothing() {
        let (mut line, ids) = linear();
        assert_eq!(line.move_forward(), None);
        line.move_to(&ids[0]).unwrap();
        assert_eq!(line.move_back(), None);
        assert_eq!(line.cursor(), Some(&ids[0]));
    }

    #[test]
    fn moves_on_empty_line_do_nothing() {
        let mut line = WorldLine::new("w1", "Demo");
        assert_eq!(line.move_back(), None);
        assert_eq!(line.move_forward(), None);
        assert_eq!(line.move_to_latest(), None);
    }

    #[test]
    fn move_to_latest_picks_newest_append() {
        let (mut line, ids) = linear();
        line.move_to(&ids[0]).unwrap();
        let branch = line.record(snap("c:1", 9), RecordMeta::empty());
        line.move_to(&ids[1]).unwrap();
        assert_eq!(line.move_to_latest(), Some(branch));
        assert_eq!(digest_of(&line, "c:1"), Some(9));
    }

    // ----------------------------------------------------------
    // Branching
    // ----------------------------------------------------------

    #[test]
    fn recording_behind_the_tip_branches() {
        let (mut line, ids) = linear();
        line.move_to(&ids[0]).unwrap();
        let b = line.record(snap("c:1", 20), RecordMeta::empty());

        let children: Vec<&NodeId> = line.children_of(&ids[0]).iter().map(|n| &n.id).collect();
        assert_eq!(children, vec![&ids[1], &b]);
        assert_eq!(line.len(), 4);

        line.move_to(&ids[2]).unwrap();
        assert_eq!(digest_of(&line, "c:1"), Some(3));
        line.move_to(&b).unwrap();
        assert_eq!(digest_of(&line, "c:1"), Some(20));
    }

    #[test]
    fn forward_follows_remembered_branch() {
        let (mut line, ids) = linear();
        line.move_to(&ids[0]).unwrap();
        let b = line.record(snap("c:1", 20), RecordMeta::empty());

        // Travel the original branch, then come back to the fork.
        line.move_to(&ids[2]).unwrap();
        line.move_back();
        line.move_back();
        assert_eq!(line.cursor(), Some(&ids[0]));
        assert_eq!(line.move_forward(), Some(ids[1].clone()));

        // Travel the new branch, then come back to the fork.
        line.move_to(&b).unwrap();
        line.move_back();
        assert_eq!(line.move_forward(), Some(b));
    }

    #[test]
    fn branch_queries() {
        let (mut line, ids) = linear();
        line.move_to(&ids[1]).unwrap();
        let b = line.record(snap("c:1", 20), RecordMeta::empty());

        assert_eq!(line.roots().len(), 1);
        let leaves: Vec<&NodeId> = line.leaves().iter().map(|n| &n.id).collect();
        assert_eq!(leaves, vec![&ids[2], &b]);

        let path: Vec<&NodeId> = line.path_to(&b).unwrap().iter().map(|n| &n.id).collect();
        assert_eq!(path, vec![&ids[0], &ids[1], &b]);

        let current = line.current_path();
        assert!(current.contains(&ids[0]));
        assert!(current.contains(&b));
        assert!(!current.contains(&ids[2]));

        assert!(line.is_ancestor(&ids[0], &b));
        assert!(!line.is_ancestor(&ids[2], &b));
        assert!(!line.is_ancestor(&b, &b));
    }

    #[test]
    fn path_to_unknown_node_fails() {
        let (line, _) = linear();
        assert!(matches!(
            line.path_to(&NodeId::new("nope")),
            Err(DagError::NodeNotFound(_))
        ));
    }

    #[test]
    fn state_at_does_not_move_cursor() {
        let (line, ids) = linear();
        let past = line.state_at(&ids[0]).unwrap();
        assert_eq!(past.get("c", "1").unwrap().digest, Digest::from_u64(1));
        assert_eq!(line.cursor(), Some(&ids[2]));
    }

    #[test]
    fn replay_memo_is_transparent() {
        let (cached, ids) = linear();
        let uncached = cached.clone().with_replay_cache_capacity(0);
        for id in &ids {
            // Query twice so the second read comes from the memo.
            assert_eq!(cached.state_at(id).unwrap(), uncached.state_at(id).unwrap());
            assert_eq!(cached.state_at(id).unwrap(), uncached.state_at(id).unwrap());
        }
    }

    // ----------------------------------------------------------
    // Rebuilding from parts
    // ----------------------------------------------------------

    #[test]
    fn from_parts_defaults_cursor_to_latest() {
        let (mut line, ids) = linear();
        line.move_to(&ids[0]).unwrap();
        let rebuilt = WorldLine::from_parts(
            "w1",
            "Demo",
            line.history().to_vec(),
            None,
            BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(rebuilt.cursor(), Some(&ids[2]));
        assert_eq!(rebuilt.current_state().get("c", "1").unwrap().digest.as_u64(), 3);
    }

    #[test]
    fn from_parts_restores_cursor_and_state() {
        let (mut line, ids) = linear();
        line.move_to(&ids[1]).unwrap();
        let rebuilt = WorldLine::from_parts(
            line.id(),
            line.name(),
            line.history().to_vec(),
            line.cursor().cloned(),
            line.active_children().clone(),
        )
        .unwrap();
        assert_eq!(rebuilt.history(), line.history());
        assert_eq!(rebuilt.current_state(), line.current_state());
        rebuilt.validate().unwrap();
    }

    #[test]
    fn from_parts_rejects_forward_reference() {
        let (line, _) = linear();
        let mut history = line.history().to_vec();
        history.swap(0, 1);
        let err = WorldLine::from_parts("w1", "Demo", history, None, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, DagError::DanglingParent { .. }));
    }

    #[test]
    fn from_parts_rejects_duplicates() {
        let (line, _) = linear();
        let mut history = line.history().to_vec();
        history.push(history[2].clone());
        let err = WorldLine::from_parts("w1", "Demo", history, None, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, DagError::DuplicateNode(_)));
    }

    #[test]
    fn from_parts_drops_bogus_active_children() {
        let (line, ids) = linear();
        let mut active = BTreeMap::new();
        active.insert(ids[2].clone(), ids[0].clone());
        let rebuilt =
            WorldLine::from_parts("w1", "Demo", line.history().to_vec(), None, active).unwrap();
        assert!(rebuilt.active_children().get(&ids[2]).is_none());
    }

    #[test]
    fn rename_changes_only_name() {
        let (line, ids) = linear();
        let renamed = line.clone().renamed("Other");
        assert_eq!(renamed.name(), "Other");
        assert_eq!(renamed.id(), "w1");
        assert_eq!(renamed.history(), line.history());
        assert_eq!(renamed.cursor(), Some(&ids[2]));
    }

    // ----------------------------------------------------------
    // Properties
    // ----------------------------------------------------------

    #[derive(Clone, Debug)]
    enum Op {
        Record(u8, u64),
        Back,
        Forward,
        Latest,
        MoveTo(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u8..4, 0u64..6).prop_map(|(k, d)| Op::Record(k, d)),
            1 => Just(Op::Back),
            1 => Just(Op::Forward),
            1 => Just(Op::Latest),
            1 => any::<usize>().prop_map(Op::MoveTo),
        ]
    }

    proptest! {
        #[test]
        fn prop_history_is_append_only_and_replay_matches(ops in prop::collection::vec(arb_op(), 1..40)) {
            let mut line = WorldLine::new("p", "prop");
            let mut seen: Vec<HistoryNode> = Vec::new();

            for op in ops {
                match op {
                    Op::Record(k, d) => {
                        line.record(snap(&format!("obj:{k}"), d), RecordMeta::empty());
                    }
                    Op::Back => { line.move_back(); }
                    Op::Forward => { line.move_forward(); }
                    Op::Latest => { line.move_to_latest(); }
                    Op::MoveTo(i) => {
                        if !line.is_empty() {
                            let target = line.history()[i % line.len()].id.clone();
                            line.move_to(&target).unwrap();
                        }
                    }
                }

                // Append-only: existing nodes never change.
                prop_assert!(line.len() >= seen.len());
                prop_assert_eq!(&line.history()[..seen.len()], &seen[..]);
                seen = line.history().to_vec();

                line.validate().unwrap();
            }

            // Every node's state equals an independent fold of its path.
            for node in line.history() {
                let expected = replay(line.path_to(&node.id).unwrap());
                prop_assert_eq!(line.state_at(&node.id).unwrap(), expected);
            }
        }

        #[test]
        fn prop_record_back_forward_round_trips(digests in prop::collection::vec(0u64..100, 1..20)) {
            let mut line = WorldLine::new("p", "prop");
            for d in digests {
                line.record(snap("c:1", d), RecordMeta::empty());
                let after = line.current_state().clone();
                if line.move_back().is_some() {
                    line.move_forward();
                }
                prop_assert_eq!(line.current_state(), &after);
            }
        }
    }
}
