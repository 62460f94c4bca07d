use wls_types::ContentKey;

use crate::error::StoreResult;

/// Opaque serialized payload. The store never looks inside.
pub type Payload = Vec<u8>;

/// Content-addressed payload store.
///
/// All implementations must satisfy these invariants:
/// - Write-once: an existing key is never overwritten. Because the key embeds
///   the content digest, a second write for the same key always carries the
///   same bytes, so skipping it loses nothing.
/// - A read of a missing key is `Ok(None)`.
/// - Concurrent use from many world-lines is safe. The check-then-write in
///   `put_if_absent` may race across processes; the loser of such a race
///   rewrites identical bytes, which is harmless.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// Store `payload` under `key` unless the key is already present.
    ///
    /// Returns `true` if this call wrote the payload, `false` if the key was
    /// already present (dedup hit).
    fn put_if_absent(&self, key: &ContentKey, payload: &[u8]) -> StoreResult<bool>;

    /// Read the payload stored under `key`.
    fn get(&self, key: &ContentKey) -> StoreResult<Option<Payload>>;

    /// Check whether `key` is present.
    fn has(&self, key: &ContentKey) -> StoreResult<bool>;

    /// Delete `key`. Returns `true` if it existed.
    ///
    /// Nothing in the history engine calls this: deleting a payload that a
    /// history node still points at makes that node unreadable.
    fn delete(&self, key: &ContentKey) -> StoreResult<bool>;

    /// Store several payloads, returning the per-entry `put_if_absent` result.
    ///
    /// Default implementation calls `put_if_absent()` for each entry.
    fn put_batch(&self, entries: &[(ContentKey, Payload)]) -> StoreResult<Vec<bool>> {
        entries
            .iter()
            .map(|(key, payload)| self.put_if_absent(key, payload))
            .collect()
    }
}
