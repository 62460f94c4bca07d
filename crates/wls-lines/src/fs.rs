//! Filesystem-backed world-line store.
//!
//! Layout under the store root:
//! ```text
//! worldlines/
//!   <id>.json       - one document per world-line
//! index.json        - summaries of every world-line, for listing
//! ```
//!
//! The index is a cache of the documents. When it is missing or unreadable
//! it is rebuilt by scanning `worldlines/`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};
use wls_dag::replay::DEFAULT_REPLAY_CACHE_CAPACITY;
use wls_dag::WorldLine;

use crate::document::WorldLineDocument;
use crate::error::{LineError, LineResult};
use crate::names::validate_worldline_id;
use crate::traits::{WorldLineStore, WorldLineSummary};

const WORLDLINES_DIR: &str = "worldlines";
const INDEX_FILE: &str = "index.json";
const DOCUMENT_EXT: &str = "json";

/// World-line store keeping one JSON file per world-line.
///
/// Every file is replaced atomically (temporary file + rename). The index is
/// updated under a process-local lock after each save or delete.
#[derive(Debug)]
pub struct FsWorldLineStore {
    root: PathBuf,
    pretty: bool,
    replay_cache_capacity: usize,
    index_lock: Mutex<()>,
}

impl FsWorldLineStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> LineResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(WORLDLINES_DIR))?;
        Ok(Self {
            root,
            pretty: true,
            replay_cache_capacity: DEFAULT_REPLAY_CACHE_CAPACITY,
            index_lock: Mutex::new(()),
        })
    }

    /// Write documents pretty-printed (`true`, the default) or compact.
    pub fn with_pretty_documents(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the replay memo capacity given to loaded world-lines.
    pub fn with_replay_cache_capacity(mut self, capacity: usize) -> Self {
        self.replay_cache_capacity = capacity;
        self
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.root
            .join(WORLDLINES_DIR)
            .join(format!("{id}.{DOCUMENT_EXT}"))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn read_document(&self, id: &str) -> LineResult<Option<WorldLineDocument>> {
        match fs::read_to_string(self.document_path(id)) {
            Ok(json) => Ok(Some(WorldLineDocument::from_json(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the index, rebuilding it from the documents if needed.
    fn read_index(&self) -> LineResult<Vec<WorldLineSummary>> {
        match fs::read_to_string(self.index_path()) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(index) => return Ok(index),
                Err(e) => warn!(error = %e, "index unreadable; rebuilding"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("index missing; rebuilding");
            }
            Err(e) => return Err(e.into()),
        }
        let index = self.scan()?;
        self.write_index(&index)?;
        Ok(index)
    }

    fn write_index(&self, index: &[WorldLineSummary]) -> LineResult<()> {
        let json = serde_json::to_string_pretty(index)?;
        write_atomic(&self.index_path(), json.as_bytes())
    }

    /// Summaries built by reading every document on disk.
    ///
    /// Documents that cannot be read are skipped with a warning.
    pub fn scan(&self) -> LineResult<Vec<WorldLineSummary>> {
        let mut index = Vec::new();
        for entry in fs::read_dir(self.root.join(WORLDLINES_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXT) {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(LineError::from)
                .and_then(|json| WorldLineDocument::from_json(&json));
            match parsed {
                Ok(doc) => index.push(WorldLineSummary {
                    id: doc.id,
                    name: doc.name,
                    node_count: doc.history.len(),
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable world-line"),
            }
        }
        index.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(index)
    }

    /// Drop the index and rebuild it from the documents.
    pub fn reindex(&self) -> LineResult<usize> {
        let _guard = self.index_lock.lock().expect("lock poisoned");
        let index = self.scan()?;
        self.write_index(&index)?;
        info!(count = index.len(), "rebuilt world-line index");
        Ok(index.len())
    }
}

/// Write `bytes` to `path` via a temporary file in the same directory.
fn write_atomic(path: &Path, bytes: &[u8]) -> LineResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl WorldLineStore for FsWorldLineStore {
    fn save(&self, line: &WorldLine) -> LineResult<()> {
        validate_worldline_id(line.id())?;
        let json = WorldLineDocument::from_worldline(line).to_json(self.pretty)?;

        let _guard = self.index_lock.lock().expect("lock poisoned");
        write_atomic(&self.document_path(line.id()), json.as_bytes())?;

        let mut index = self.read_index()?;
        let summary = WorldLineSummary::of(line);
        match index.binary_search_by(|s| s.id.as_str().cmp(line.id())) {
            Ok(pos) => index[pos] = summary,
            Err(pos) => index.insert(pos, summary),
        }
        self.write_index(&index)?;

        debug!(worldline = %line.id(), nodes = line.len(), "saved world-line");
        Ok(())
    }

    fn load(&self, id: &str) -> LineResult<Option<WorldLine>> {
        validate_worldline_id(id)?;
        let Some(document) = self.read_document(id)? else {
            return Ok(None);
        };
        if document.id != id {
            return Err(LineError::Serialization(format!(
                "document {id}.{DOCUMENT_EXT} has id {:?}",
                document.id
            )));
        }
        Ok(Some(document.into_worldline(self.replay_cache_capacity)?))
    }

    fn list(&self) -> LineResult<Vec<WorldLineSummary>> {
        let _guard = self.index_lock.lock().expect("lock poisoned");
        self.read_index()
    }

    fn delete(&self, id: &str) -> LineResult<bool> {
        validate_worldline_id(id)?;
        let _guard = self.index_lock.lock().expect("lock poisoned");
        let removed = match fs::remove_file(self.document_path(id)) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let mut index = self.read_index()?;
        index.retain(|s| s.id != id);
        self.write_index(&index)?;
        if removed {
            debug!(worldline = %id, "deleted world-line");
        }
        Ok(removed)
    }

    fn exists(&self, id: &str) -> LineResult<bool> {
        validate_worldline_id(id)?;
        Ok(self.document_path(id).try_exists()?)
    }
}
