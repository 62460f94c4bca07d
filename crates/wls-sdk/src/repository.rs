use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use wls_dag::{DagError, HistoryNode, RecordMeta, WorldLine, WorldState};
use wls_hash::ContentHasher;
use wls_lines::{
    validate_worldline_id, FsWorldLineStore, InMemoryWorldLineStore, WorldLineStore,
    WorldLineSummary,
};
use wls_store::{ContentStore, FsContentStore, InMemoryContentStore};
use wls_types::{NodeId, ObjectKey, StateSnapshot};

use crate::codec::{CodecRegistry, PayloadCodec};
use crate::config::StoreConfig;
use crate::error::{SdkError, SdkResult};

/// High-level WorldLine Store API.
///
/// Every mutating call completes its content write, history append, cursor
/// move, and world-line save before returning. Calls on one `Wls` are
/// serialized; two `Wls` handles over the same world-line store are
/// last-save-wins.
pub struct Wls {
    content: Arc<dyn ContentStore>,
    lines: Arc<dyn WorldLineStore>,
    codecs: CodecRegistry,
    default_author: Option<String>,
    /// World-lines already loaded, kept in sync with `lines`.
    open: Mutex<HashMap<String, WorldLine>>,
}

impl Wls {
    /// Build over caller-provided stores.
    pub fn new(content: Arc<dyn ContentStore>, lines: Arc<dyn WorldLineStore>) -> Self {
        Self {
            content,
            lines,
            codecs: CodecRegistry::new(),
            default_author: None,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh in-memory stores; nothing survives the handle.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryContentStore::new()),
            Arc::new(InMemoryWorldLineStore::new()),
        )
    }

    /// Filesystem stores under `config.root`.
    pub fn open(config: &StoreConfig) -> SdkResult<Self> {
        let content = FsContentStore::open(&config.root)?;
        let lines = FsWorldLineStore::open(&config.root)?
            .with_pretty_documents(config.pretty_documents)
            .with_replay_cache_capacity(config.replay_cache_capacity);
        info!(root = %config.root.display(), "opened world-line store");

        let mut wls = Self::new(Arc::new(content), Arc::new(lines));
        wls.default_author = config.default_author.clone();
        Ok(wls)
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }

    /// Use `codec` for payloads of `object_type`.
    pub fn with_codec(mut self, object_type: impl Into<String>, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codecs.register(object_type, codec);
        self
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// The shared content store handle.
    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    // ---- World-line lifecycle ----

    pub fn create(&self, id: &str, name: &str) -> SdkResult<WorldLine> {
        validate_worldline_id(id)?;
        let mut open = self.open.lock().expect("lock poisoned");
        if open.contains_key(id) || self.lines.exists(id)? {
            return Err(SdkError::AlreadyExists(id.to_string()));
        }
        let line = WorldLine::new(id, name);
        self.lines.save(&line)?;
        open.insert(id.to_string(), line.clone());
        info!(worldline = %id, name, "created world-line");
        Ok(line)
    }

    /// A snapshot of the world-line as it is now.
    pub fn load(&self, id: &str) -> SdkResult<WorldLine> {
        self.with_line(id, |line| Ok(line.clone()))
    }

    pub fn list(&self) -> SdkResult<Vec<WorldLineSummary>> {
        Ok(self.lines.list()?)
    }

    pub fn delete(&self, id: &str) -> SdkResult<()> {
        let mut open = self.open.lock().expect("lock poisoned");
        open.remove(id);
        if !self.lines.delete(id)? {
            return Err(SdkError::WorldLineNotFound(id.to_string()));
        }
        info!(worldline = %id, "deleted world-line");
        Ok(())
    }

    /// Drop the in-memory copy of a world-line. The next call reloads it from
    /// the world-line store. Returns `false` if it was not loaded.
    pub fn close(&self, id: &str) -> bool {
        let closed = self.open.lock().expect("lock poisoned").remove(id).is_some();
        if closed {
            debug!(worldline = %id, "closed world-line");
        }
        closed
    }

    /// Number of world-lines currently held in memory.
    pub fn open_count(&self) -> usize {
        self.open.lock().expect("lock poisoned").len()
    }

    pub fn rename(&self, id: &str, new_name: &str) -> SdkResult<()> {
        self.mutate(id, |line| {
            line.rename(new_name);
            Ok(())
        })?;
        info!(worldline = %id, name = new_name, "renamed world-line");
        Ok(())
    }

    // ---- Recording ----

    /// Store `value` and record a pointer to it as a new history node.
    ///
    /// Nothing is written to the content store unless the world-line exists.
    ///
    /// The node is appended even when `value` equals the current value; only
    /// the payload write is deduplicated.
    pub fn record(
        &self,
        worldline_id: &str,
        key: &ObjectKey,
        value: &Value,
        meta: RecordMeta,
    ) -> SdkResult<NodeId> {
        let meta = self.stamp(meta);
        self.mutate(worldline_id, |line| {
            let snapshot = self.store_value(key, value)?;
            Ok(line.record(snapshot, meta))
        })
    }

    /// Record several values as one history node.
    pub fn record_many(
        &self,
        worldline_id: &str,
        entries: &[(ObjectKey, Value)],
        meta: RecordMeta,
    ) -> SdkResult<NodeId> {
        if entries.is_empty() {
            return Err(DagError::EmptyChangeSet.into());
        }
        let meta = self.stamp(meta);
        self.mutate(worldline_id, |line| {
            let snapshots = entries
                .iter()
                .map(|(key, value)| self.store_value(key, value))
                .collect::<SdkResult<Vec<_>>>()?;
            Ok(line.record_many(snapshots, meta)?)
        })
    }

    /// Record any serializable value.
    pub fn record_typed<T: Serialize>(
        &self,
        worldline_id: &str,
        key: &ObjectKey,
        value: &T,
        meta: RecordMeta,
    ) -> SdkResult<NodeId> {
        let value = serde_json::to_value(value).map_err(|e| SdkError::Codec {
            object_type: key.object_type().to_string(),
            reason: e.to_string(),
        })?;
        self.record(worldline_id, key, &value, meta)
    }

    /// Hash, encode, and store a value; return its pointer.
    fn store_value(&self, key: &ObjectKey, value: &Value) -> SdkResult<StateSnapshot> {
        let digest = ContentHasher::digest(value);
        let content_key = key.with_digest(digest);
        let payload = self.codecs.encode(key.object_type(), value)?;
        let written = self.content.put_if_absent(&content_key, &payload)?;
        debug!(key = %content_key, written, "stored value");
        Ok(StateSnapshot::new(key, digest))
    }

    fn stamp(&self, mut meta: RecordMeta) -> RecordMeta {
        if meta.author.is_none() {
            meta.author = self.default_author.clone();
        }
        meta
    }

    // ---- Reading ----

    /// The current value of one object, or `None` if it is not in the world
    /// at the cursor.
    pub fn get_current_value(
        &self,
        worldline_id: &str,
        object_type: &str,
        id: &str,
    ) -> SdkResult<Option<Value>> {
        let snapshot = self.with_line(worldline_id, |line| {
            Ok(line.current_state().get(object_type, id).cloned())
        })?;
        snapshot.map(|s| self.read_value(&s)).transpose()
    }

    /// The current value of one object, deserialized into `T`.
    pub fn current_value_as<T: DeserializeOwned>(
        &self,
        worldline_id: &str,
        object_type: &str,
        id: &str,
    ) -> SdkResult<Option<T>> {
        let Some(value) = self.get_current_value(worldline_id, object_type, id)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SdkError::Codec {
                object_type: object_type.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fetch and decode the payload a pointer names.
    pub fn read_value(&self, snapshot: &StateSnapshot) -> SdkResult<Value> {
        let key = snapshot.content_key()?;
        let bytes = self
            .content
            .get(&key)?
            .ok_or_else(|| SdkError::MissingPayload(key.clone()))?;
        self.codecs.decode(&snapshot.object_type, &bytes)
    }

    /// The whole world at the cursor.
    pub fn current_state(&self, worldline_id: &str) -> SdkResult<WorldState> {
        self.with_line(worldline_id, |line| Ok(line.current_state().clone()))
    }

    /// Every history node, in append order.
    pub fn history_of(&self, worldline_id: &str) -> SdkResult<Vec<HistoryNode>> {
        self.with_line(worldline_id, |line| Ok(line.history().to_vec()))
    }

    /// The whole world at `node`, without moving the cursor.
    pub fn snapshots_at(&self, worldline_id: &str, node: &NodeId) -> SdkResult<WorldState> {
        self.with_line(worldline_id, |line| Ok(line.state_at(node)?))
    }

    // ---- Time travel ----

    pub fn move_to(&self, worldline_id: &str, node: &NodeId) -> SdkResult<()> {
        self.mutate(worldline_id, |line| Ok(line.move_to(node)?))
    }

    /// Step to the cursor's parent. `None` if already at a root.
    pub fn move_back(&self, worldline_id: &str) -> SdkResult<Option<NodeId>> {
        self.mutate_if(worldline_id, WorldLine::move_back)
    }

    /// Step to the remembered child. `None` if already at a leaf.
    pub fn move_forward(&self, worldline_id: &str) -> SdkResult<Option<NodeId>> {
        self.mutate_if(worldline_id, WorldLine::move_forward)
    }

    /// Jump to the most recently recorded node. `None` if nothing is recorded.
    pub fn move_to_latest(&self, worldline_id: &str) -> SdkResult<Option<NodeId>> {
        self.mutate_if(worldline_id, WorldLine::move_to_latest)
    }

    // ---- Plumbing ----

    /// The cached world-line for `id`, loading it on first use.
    fn cached<'a>(
        &self,
        open: &'a mut HashMap<String, WorldLine>,
        id: &str,
    ) -> SdkResult<&'a mut WorldLine> {
        if !open.contains_key(id) {
            let line = self
                .lines
                .load(id)?
                .ok_or_else(|| SdkError::WorldLineNotFound(id.to_string()))?;
            open.insert(id.to_string(), line);
        }
        open.get_mut(id)
            .ok_or_else(|| SdkError::WorldLineNotFound(id.to_string()))
    }

    /// Run `f` on the world-line without saving.
    fn with_line<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut WorldLine) -> SdkResult<R>,
    ) -> SdkResult<R> {
        let mut open = self.open.lock().expect("lock poisoned");
        f(self.cached(&mut open, id)?)
    }

    /// Run `f` and save the world-line afterwards.
    fn mutate<R>(&self, id: &str, f: impl FnOnce(&mut WorldLine) -> SdkResult<R>) -> SdkResult<R> {
        self.mutate_when(id, f, |_| true)
    }

    /// Run a cursor move and save only if the cursor moved.
    fn mutate_if(
        &self,
        id: &str,
        f: impl FnOnce(&mut WorldLine) -> Option<NodeId>,
    ) -> SdkResult<Option<NodeId>> {
        self.mutate_when(id, |line| Ok(f(line)), Option::is_some)
    }

    /// Run `f`, then save if `changed` says so.
    ///
    /// If saving fails the cached copy is dropped, so the next call reloads
    /// what was last persisted.
    fn mutate_when<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut WorldLine) -> SdkResult<R>,
        changed: impl FnOnce(&R) -> bool,
    ) -> SdkResult<R> {
        let mut open = self.open.lock().expect("lock poisoned");
        let line = self.cached(&mut open, id)?;
        let result = f(line)?;
        if changed(&result) {
            if let Err(e) = self.lines.save(line) {
                open.remove(id);
                return Err(e.into());
            }
        }
        Ok(result)
    }
}

impl std::fmt::Debug for Wls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self.open.lock().map(|o| o.len()).unwrap_or(0);
        f.debug_struct("Wls")
            .field("open_count", &open)
            .field("codecs", &self.codecs)
            .field("default_author", &self.default_author)
            .finish()
    }
}
