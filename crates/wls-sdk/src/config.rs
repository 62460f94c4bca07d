use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wls_dag::replay::DEFAULT_REPLAY_CACHE_CAPACITY;

use crate::error::{SdkError, SdkResult};

/// File name of the config inside a store root.
pub const CONFIG_FILE: &str = "wls.toml";

/// Settings for a filesystem-backed store.
///
/// ```toml
/// root = ".wls"
/// default_author = "ana"
/// pretty_documents = true
/// replay_cache_capacity = 64
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `objects/`, `worldlines/`, and `index.json`.
    pub root: PathBuf,
    /// Author stamped on records that name none.
    pub default_author: Option<String>,
    /// Pretty-print persisted world-line documents.
    pub pretty_documents: bool,
    /// Memoised replays kept per world-line; `0` disables the memo.
    pub replay_cache_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".wls"),
            default_author: None,
            pretty_documents: true,
            replay_cache_capacity: DEFAULT_REPLAY_CACHE_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Defaults, rooted at `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Load `<root>/wls.toml` if it exists, otherwise defaults. Either way the
    /// returned config is rooted at `root`; a `root` key in the file is ignored.
    pub fn load_or_default(root: impl Into<PathBuf>) -> SdkResult<Self> {
        let root = root.into();
        let path = root.join(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.root = root;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }
}
