use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use wls_types::ContentKey;

use crate::error::StoreResult;
use crate::traits::{ContentStore, Payload};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. All payloads are held in memory behind a
/// `RwLock` for safe concurrent access. Payloads are cloned on read.
pub struct InMemoryContentStore {
    entries: RwLock<HashMap<ContentKey, Payload>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(|p| p.len() as u64)
            .sum()
    }

    /// Remove all payloads from the store.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all keys in the store.
    pub fn all_keys(&self) -> Vec<ContentKey> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<ContentKey> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put_if_absent(&self, key: &ContentKey, payload: &[u8]) -> StoreResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        if map.contains_key(key) {
            debug!(%key, "content already present");
            return Ok(false);
        }
        map.insert(key.clone(), payload.to_vec());
        debug!(%key, bytes = payload.len(), "stored content");
        Ok(true)
    }

    fn get(&self, key: &ContentKey) -> StoreResult<Option<Payload>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn has(&self, key: &ContentKey) -> StoreResult<bool> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn delete(&self, key: &ContentKey) -> StoreResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryContentStore")
            .field("entry_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wls_types::{Digest, ObjectKey};

    fn key(object: &str, digest: u64) -> ContentKey {
        ObjectKey::parse(object)
            .unwrap()
            .with_digest(Digest::from_u64(digest))
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryContentStore::new();
        let k = key("counter:c1", 1);
        assert!(store.put_if_absent(&k, b"{\"value\":0}").unwrap());

        let read_back = store.get(&k).unwrap().expect("should exist");
        assert_eq!(read_back, b"{\"value\":0}");
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryContentStore::new();
        assert!(store.get(&key("counter:c1", 9)).unwrap().is_none());
    }

    #[test]
    fn has_reports_presence() {
        let store = InMemoryContentStore::new();
        let k = key("memo:m1", 2);
        assert!(!store.has(&k).unwrap());
        store.put_if_absent(&k, b"x").unwrap();
        assert!(store.has(&k).unwrap());
    }

    #[test]
    fn delete_present_and_missing() {
        let store = InMemoryContentStore::new();
        let k = key("memo:m1", 3);
        store.put_if_absent(&k, b"x").unwrap();
        assert!(store.delete(&k).unwrap());
        assert!(!store.has(&k).unwrap());
        assert!(!store.delete(&k).unwrap());
    }

    // -----------------------------------------------------------------------
    // Dedup
    // -----------------------------------------------------------------------

    #[test]
    fn second_put_is_a_dedup_hit() {
        let store = InMemoryContentStore::new();
        let k = key("counter:c1", 1);
        assert!(store.put_if_absent(&k, b"same").unwrap());
        assert!(!store.put_if_absent(&k, b"same").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn existing_entry_is_never_overwritten() {
        let store = InMemoryContentStore::new();
        let k = key("counter:c1", 1);
        store.put_if_absent(&k, b"first").unwrap();
        store.put_if_absent(&k, b"second").unwrap();
        assert_eq!(store.get(&k).unwrap().unwrap(), b"first");
    }

    #[test]
    fn same_digest_different_objects_are_separate() {
        let store = InMemoryContentStore::new();
        assert!(store.put_if_absent(&key("counter:c1", 1), b"v").unwrap());
        assert!(store.put_if_absent(&key("counter:c2", 1), b"v").unwrap());
        assert_eq!(store.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Batch & diagnostics
    // -----------------------------------------------------------------------

    #[test]
    fn put_batch_reports_each_entry() {
        let store = InMemoryContentStore::new();
        let entries = vec![
            (key("a:1", 1), b"one".to_vec()),
            (key("a:2", 2), b"two".to_vec()),
            (key("a:1", 1), b"one".to_vec()),
        ];
        let written = store.put_batch(&entries).unwrap();
        assert_eq!(written, vec![true, true, false]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn total_bytes_and_clear() {
        let store = InMemoryContentStore::new();
        store.put_if_absent(&key("a:1", 1), b"12345").unwrap();
        store.put_if_absent(&key("a:2", 2), b"123456789").unwrap();
        assert_eq!(store.total_bytes(), 14);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn all_keys_is_sorted() {
        let store = InMemoryContentStore::new();
        store.put_if_absent(&key("b:1", 1), b"x").unwrap();
        store.put_if_absent(&key("a:2", 1), b"x").unwrap();
        store.put_if_absent(&key("a:1", 1), b"x").unwrap();

        let keys = store.all_keys();
        assert_eq!(keys.len(), 3);
        for w in keys.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn concurrent_writers_dedup() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryContentStore::new());
        let k = key("counter:shared", 7);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let k = k.clone();
                thread::spawn(move || store.put_if_absent(&k, b"payload").unwrap())
            })
            .collect();

        let wrote: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic") as usize)
            .sum();
        assert_eq!(wrote, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryContentStore::new();
        store.put_if_absent(&key("a:1", 1), b"x").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryContentStore"));
        assert!(debug.contains("entry_count"));
    }
}
