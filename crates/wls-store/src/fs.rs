//! Filesystem-backed content store.
//!
//! Layout under the store root:
//! ```text
//! objects/
//!   <hex(type)>/
//!     <hex(id)>/
//!       <digest>        - raw payload bytes
//! ```
//!
//! Type and id are hex-encoded so that arbitrary ids map to safe, reversible
//! path components. A component whose hex form would be longer than
//! [`MAX_HEX_COMPONENT`] is stored as `h-<digest>` instead, with the raw text
//! kept in a `.name` file inside that directory so `keys()` can recover it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use wls_hash::ContentHasher;
use wls_types::{ContentKey, Digest, ObjectKey};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ContentStore, Payload};

/// Directory under the root that holds all payloads.
const OBJECTS_DIR: &str = "objects";

/// Longest hex component written verbatim. Well under the common 255-byte
/// file name limit.
pub const MAX_HEX_COMPONENT: usize = 128;

/// Prefix of directories named by the digest of their component.
const HASHED_PREFIX: &str = "h-";

/// File inside a hashed directory holding the component's raw text.
const NAME_FILE: &str = ".name";

/// Where one payload lives.
struct EntryPath {
    type_dir: PathBuf,
    id_dir: PathBuf,
    file: PathBuf,
}

/// Content store keeping one file per payload.
///
/// Writes go to a temporary file in the destination directory and are then
/// linked into place only if the destination does not exist yet, so a reader
/// never observes a half-written payload and an existing payload is never
/// replaced.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(OBJECTS_DIR))?;
        Ok(Self { root })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` to its paths, rejecting hashed directories that already
    /// belong to a different component.
    fn locate(&self, key: &ContentKey) -> StoreResult<EntryPath> {
        let object = key.object();
        let type_dir = self
            .root
            .join(OBJECTS_DIR)
            .join(component_name(object.object_type()));
        let id_dir = type_dir.join(component_name(object.id()));
        check_owner(&type_dir, object.object_type(), key)?;
        check_owner(&id_dir, object.id(), key)?;
        let file = id_dir.join(key.digest().to_hex());
        Ok(EntryPath {
            type_dir,
            id_dir,
            file,
        })
    }

    /// All keys present on disk, sorted.
    ///
    /// Fails with [`StoreError::CorruptEntry`] on a directory that cannot be
    /// decoded back into a key. Temporary files and `.name` files are skipped.
    pub fn keys(&self) -> StoreResult<Vec<ContentKey>> {
        let mut keys = Vec::new();
        for entry in WalkDir::new(self.root.join(OBJECTS_DIR))
            .min_depth(3)
            .max_depth(3)
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            keys.push(decode_path(entry.path())?);
        }
        keys.sort();
        Ok(keys)
    }
}

/// Directory name for one key component.
fn component_name(raw: &str) -> String {
    let encoded = hex::encode(raw);
    if encoded.len() <= MAX_HEX_COMPONENT {
        encoded
    } else {
        let digest = ContentHasher::digest_bytes(raw.as_bytes());
        format!("{HASHED_PREFIX}{}", digest.to_hex())
    }
}

fn is_hashed(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(HASHED_PREFIX))
}

/// A hashed directory with no `.name` file is unclaimed.
fn check_owner(dir: &Path, raw: &str, key: &ContentKey) -> StoreResult<()> {
    if !is_hashed(dir) {
        return Ok(());
    }
    match fs::read_to_string(dir.join(NAME_FILE)) {
        Ok(owner) if owner == raw => Ok(()),
        Ok(owner) => Err(StoreError::CorruptEntry {
            entry: key.to_string(),
            reason: format!("{} already holds {owner:?}", dir.display()),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Record `raw` as the owner of a hashed directory, then confirm the claim
/// in case another writer got there first.
fn claim(dir: &Path, raw: &str, key: &ContentKey) -> StoreResult<()> {
    if !is_hashed(dir) {
        return Ok(());
    }
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(raw.as_bytes())?;
    match tmp.persist_noclobber(dir.join(NAME_FILE)) {
        Ok(_) => {}
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.error.into()),
    }
    check_owner(dir, raw, key)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::CorruptEntry {
        entry: path.display().to_string(),
        reason: reason.into(),
    }
}

fn decode_component(dir: &Path) -> StoreResult<String> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| corrupt(dir, "directory name is not UTF-8"))?;
    if name.starts_with(HASHED_PREFIX) {
        return match fs::read_to_string(dir.join(NAME_FILE)) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(corrupt(dir, "hashed directory has no name file"))
            }
            Err(e) => Err(e.into()),
        };
    }
    let bytes = hex::decode(name).map_err(|e| corrupt(dir, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| corrupt(dir, e.to_string()))
}

fn decode_path(path: &Path) -> StoreResult<ContentKey> {
    let (Some(id_dir), Some(digest)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
    else {
        return Err(corrupt(path, "not a payload path"));
    };
    let type_dir = id_dir
        .parent()
        .ok_or_else(|| corrupt(path, "not a payload path"))?;
    let object = ObjectKey::new(decode_component(type_dir)?, decode_component(id_dir)?)?;
    let digest = Digest::from_hex(digest)?;
    Ok(object.with_digest(digest))
}

impl ContentStore for FsContentStore {
    fn put_if_absent(&self, key: &ContentKey, payload: &[u8]) -> StoreResult<bool> {
        let entry = self.locate(key)?;
        if entry.file.try_exists()? {
            debug!(%key, "content already present");
            return Ok(false);
        }
        fs::create_dir_all(&entry.id_dir)?;
        claim(&entry.type_dir, key.object().object_type(), key)?;
        claim(&entry.id_dir, key.object().id(), key)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&entry.id_dir)?;
        tmp.write_all(payload)?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&entry.file) {
            Ok(_) => {
                debug!(%key, bytes = payload.len(), "stored content");
                Ok(true)
            }
            // Lost a race with another writer of the same key; same bytes.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error.into()),
        }
    }

    fn get(&self, key: &ContentKey) -> StoreResult<Option<Payload>> {
        match fs::read(self.locate(key)?.file) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn has(&self, key: &ContentKey) -> StoreResult<bool> {
        Ok(self.locate(key)?.file.try_exists()?)
    }

    fn delete(&self, key: &ContentKey) -> StoreResult<bool> {
        let entry = self.locate(key)?;
        match fs::remove_file(&entry.file) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!(%key, error = %e, "failed to delete content");
                Err(e.into())
            }
        }
    }
}
