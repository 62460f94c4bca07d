//! Replay helpers and the `(NodeId -> WorldState)` memo.

use std::collections::{HashMap, VecDeque};

use wls_types::NodeId;

use crate::node::HistoryNode;
use crate::state::WorldState;

/// Default number of memoised states per world-line.
pub const DEFAULT_REPLAY_CACHE_CAPACITY: usize = 64;

/// Fold each node's changes, oldest first, into an empty world.
pub fn replay<'a, I>(path: I) -> WorldState
where
    I: IntoIterator<Item = &'a HistoryNode>,
{
    let mut state = WorldState::new();
    for node in path {
        state.fold_in(node.changed_objects.iter().cloned());
    }
    state
}

/// Bounded memo of replayed states, evicted first-in first-out.
///
/// History nodes never change once appended, so a memoised state can never
/// go stale; the memo only trades memory for replay depth.
#[derive(Clone, Debug)]
pub struct ReplayCache {
    capacity: usize,
    entries: HashMap<NodeId, WorldState>,
    order: VecDeque<NodeId>,
}

impl ReplayCache {
    /// A memo holding at most `capacity` states. Zero disables it.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&WorldState> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: NodeId, state: WorldState) {
        if self.capacity == 0 || self.entries.contains_key(&id) {
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(id.clone());
        self.entries.insert(id, state);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for ReplayCache {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_types::{Digest, ObjectKey, StateSnapshot, Timestamp};

    fn node(id: &str, key: &str, digest: u64) -> HistoryNode {
        HistoryNode {
            id: NodeId::new(id),
            timestamp: Timestamp::from_millis(0),
            changed_objects: vec![StateSnapshot::new(
                &ObjectKey::parse(key).unwrap(),
                Digest::from_u64(digest),
            )],
            parent_id: None,
            author: None,
            description: None,
        }
    }

    #[test]
    fn replay_folds_oldest_first() {
        let path = [node("a", "c:1", 1), node("b", "c:1", 2), node("c", "c:2", 3)];
        let state = replay(&path);
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("c", "1").unwrap().digest, Digest::from_u64(2));
    }

    #[test]
    fn cache_evicts_oldest() {
        let mut cache = ReplayCache::new(2);
        cache.insert(NodeId::new("a"), WorldState::new());
        cache.insert(NodeId::new("b"), WorldState::new());
        cache.insert(NodeId::new("c"), WorldState::new());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&NodeId::new("a")).is_none());
        assert!(cache.get(&NodeId::new("c")).is_some());
    }

    #[test]
    fn zero_capacity_disables() {
        let mut cache = ReplayCache::new(0);
        cache.insert(NodeId::new("a"), WorldState::new());
        assert!(cache.is_empty());
    }
}
