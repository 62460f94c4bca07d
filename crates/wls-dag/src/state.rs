//! Immutable world states.
//!
//! A [`WorldState`] maps every object key to its current snapshot pointer.
//! All mutators return a new state; the receiver is never changed.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use wls_hash::Fnv1a64;
use wls_types::{Digest, ObjectKey, StateSnapshot};

type Slot = (String, String);

fn slot_of(snapshot: &StateSnapshot) -> Slot {
    (snapshot.object_type.clone(), snapshot.id.clone())
}

/// The set of current pointers, one per object, at one instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldState {
    snapshots: BTreeMap<Slot, StateSnapshot>,
}

impl WorldState {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects in the world.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no object has been recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The current pointer for `type:id`, if any.
    pub fn get(&self, object_type: &str, id: &str) -> Option<&StateSnapshot> {
        self.snapshots
            .get(&(object_type.to_string(), id.to_string()))
    }

    /// The current pointer for `key`, if any.
    pub fn get_key(&self, key: &ObjectKey) -> Option<&StateSnapshot> {
        self.get(key.object_type(), key.id())
    }

    /// A new state with `snapshot` replacing any pointer for the same object.
    pub fn set(&self, snapshot: StateSnapshot) -> Self {
        let mut next = self.clone();
        next.snapshots.insert(slot_of(&snapshot), snapshot);
        next
    }

    /// A new state with every snapshot folded in as one batch.
    ///
    /// Later entries win over earlier ones for the same object.
    pub fn set_many<I>(&self, snapshots: I) -> Self
    where
        I: IntoIterator<Item = StateSnapshot>,
    {
        let mut next = self.clone();
        next.fold_in(snapshots);
        next
    }

    /// A new state without the pointer for `type:id`.
    pub fn remove(&self, object_type: &str, id: &str) -> Self {
        let mut next = self.clone();
        next.snapshots
            .remove(&(object_type.to_string(), id.to_string()));
        next
    }

    /// All pointers, ordered by type then id.
    pub fn all(&self) -> Vec<StateSnapshot> {
        self.snapshots.values().cloned().collect()
    }

    /// Iterate pointers, ordered by type then id.
    pub fn iter(&self) -> impl Iterator<Item = &StateSnapshot> {
        self.snapshots.values()
    }

    /// Whole-world digest: equal for any two worlds holding the same
    /// versions of the same objects.
    pub fn digest(&self) -> Digest {
        let mut hasher = Fnv1a64::new();
        for snapshot in self.snapshots.values() {
            hasher.update(snapshot.object_type.as_bytes());
            hasher.update(b":");
            hasher.update(snapshot.id.as_bytes());
            hasher.update(b"=");
            hasher.update(snapshot.digest.to_hex().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finish()
    }

    /// Per-object differences going from `self` to `newer`.
    pub fn diff(&self, newer: &WorldState) -> Vec<StateChange> {
        let mut changes = Vec::new();
        for (slot, old) in &self.snapshots {
            match newer.snapshots.get(slot) {
                None => changes.push(StateChange::Removed(old.clone())),
                Some(new) if new.digest != old.digest => changes.push(StateChange::Changed {
                    from: old.clone(),
                    to: new.clone(),
                }),
                Some(_) => {}
            }
        }
        for (slot, new) in &newer.snapshots {
            if !self.snapshots.contains_key(slot) {
                changes.push(StateChange::Added(new.clone()));
            }
        }
        changes
    }

    /// Fold snapshots into this state in place. Replay owns its scratch
    /// state, so it skips the per-node clone that `set_many` pays.
    pub(crate) fn fold_in<I>(&mut self, snapshots: I)
    where
        I: IntoIterator<Item = StateSnapshot>,
    {
        for snapshot in snapshots {
            self.snapshots.insert(slot_of(&snapshot), snapshot);
        }
    }
}

impl FromIterator<StateSnapshot> for WorldState {
    fn from_iter<T: IntoIterator<Item = StateSnapshot>>(iter: T) -> Self {
        let mut state = Self::new();
        state.fold_in(iter);
        state
    }
}

impl Serialize for WorldState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.snapshots.len()))?;
        for snapshot in self.snapshots.values() {
            seq.serialize_element(snapshot)?;
        }
        seq.end()
    }
}

/// One object's difference between two world states.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum StateChange {
    Added(StateSnapshot),
    Changed {
        from: StateSnapshot,
        to: StateSnapshot,
    },
    Removed(StateSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(key: &str, digest: u64) -> StateSnapshot {
        StateSnapshot::new(&ObjectKey::parse(key).unwrap(), Digest::from_u64(digest))
    }

    #[test]
    fn set_is_copy_on_write() {
        let empty = WorldState::new();
        let one = empty.set(snap("counter:c1", 1));
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.get("counter", "c1").unwrap().digest, Digest::from_u64(1));
    }

    #[test]
    fn set_replaces_same_object() {
        let s = WorldState::new()
            .set(snap("counter:c1", 1))
            .set(snap("counter:c1", 2));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("counter", "c1").unwrap().digest, Digest::from_u64(2));
    }

    #[test]
    fn set_many_last_write_wins() {
        let s = WorldState::new().set_many(vec![
            snap("counter:c1", 1),
            snap("memo:m1", 5),
            snap("counter:c1", 3),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("counter", "c1").unwrap().digest, Digest::from_u64(3));
    }

    #[test]
    fn remove_returns_new_state() {
        let s = WorldState::new().set(snap("counter:c1", 1));
        let removed = s.remove("counter", "c1");
        assert!(removed.is_empty());
        assert_eq!(s.len(), 1);
        // Removing an absent key is a no-op.
        assert_eq!(s.remove("memo", "x"), s);
    }

    #[test]
    fn all_is_ordered() {
        let s = WorldState::new()
            .set(snap("memo:b", 1))
            .set(snap("counter:z", 1))
            .set(snap("memo:a", 1));
        let keys: Vec<String> = s
            .all()
            .iter()
            .map(|s| format!("{}:{}", s.object_type, s.id))
            .collect();
        assert_eq!(keys, vec!["counter:z", "memo:a", "memo:b"]);
    }

    #[test]
    fn get_key_matches_get() {
        let s = WorldState::new().set(snap("counter:c1", 1));
        let key = ObjectKey::parse("counter:c1").unwrap();
        assert_eq!(s.get_key(&key), s.get("counter", "c1"));
    }

    #[test]
    fn digest_is_order_independent() {
        let a = WorldState::new().set(snap("a:1", 1)).set(snap("b:1", 2));
        let b = WorldState::new().set(snap("b:1", 2)).set(snap("a:1", 1));
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), a.set(snap("a:1", 9)).digest());
    }

    #[test]
    fn diff_reports_each_kind() {
        let old = WorldState::new()
            .set(snap("a:1", 1))
            .set(snap("a:2", 1))
            .set(snap("a:3", 1));
        let new = old.set(snap("a:2", 2)).remove("a", "3").set(snap("a:4", 1));

        let changes = old.diff(&new);
        assert_eq!(changes.len(), 3);
        assert!(changes.contains(&StateChange::Changed {
            from: snap("a:2", 1),
            to: snap("a:2", 2)
        }));
        assert!(changes.contains(&StateChange::Removed(snap("a:3", 1))));
        assert!(changes.contains(&StateChange::Added(snap("a:4", 1))));
        assert!(old.diff(&old).is_empty());
    }

    #[test]
    fn serializes_as_snapshot_list() {
        let s = WorldState::new().set(snap("counter:c1", 1));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json[0]["type"], "counter");
        assert_eq!(json.as_array().unwrap().len(), 1);
    }
}
