//! Configuration for gql-history.
//!
//! Read from a TOML file; every field is optional.
//!
//! ```toml
//! max_history_length = 50
//! namespace = "graphiql"
//! storage_dir = ".gql-history"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HistoryError, Result};
use crate::storage::DEFAULT_NAMESPACE;

/// Default number of history entries kept before eviction.
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 20;

/// Default storage directory, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = ".gql-history";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum history entries. Zero disables eviction.
    pub max_history_length: usize,
    /// Storage key namespace.
    pub namespace: String,
    /// Directory for the file-backed store.
    pub storage_dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

impl HistoryConfig {
    /// Parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text).map_err(|message| HistoryError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn from_toml(text: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        if config.namespace.is_empty() || config.namespace.contains(':') {
            return Err(format!(
                "namespace must be non-empty and contain no ':' (got '{}')",
                config.namespace
            ));
        }
        Ok(config)
    }
}
