//! File system storage backend.
//!
//! Keeps every key in one JSON object file, `storage.json`, inside the
//! storage root. The file is rewritten on every mutation using an atomic
//! write (write to .tmp, then rename).

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::Storage;
use crate::error::Result;

/// Name of the data file inside the storage root.
pub const STORAGE_FILE: &str = "storage.json";

/// File-backed [`Storage`].
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory (.gql-history/)
    root: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage directory, creating it if needed.
    ///
    /// A missing or unreadable data file starts as an empty store.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.exists() {
            fs::create_dir_all(root)?;
        }
        let entries = load_entries(&root.join(STORAGE_FILE));
        info!(root = %root.display(), keys = entries.len(), "opened file storage");
        Ok(Self {
            root: root.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    /// Get root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self) -> PathBuf {
        self.root.join(STORAGE_FILE)
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` to a copy of the map, persist it, then commit.
    fn mutate(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self.entries();
        let mut next = entries.clone();
        change(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let path = self.data_path();
        let bytes = serde_json::to_vec(entries)?;

        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;

        debug!(path = %path.display(), bytes = bytes.len(), "storage saved");
        Ok(())
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return BTreeMap::new(),
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed storage file, starting empty");
            BTreeMap::new()
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.mutate(|entries| {
            entries.remove(key);
        }) {
            warn!(key, error = %e, "failed to remove storage key");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.mutate(|entries| entries.clear()) {
            warn!(error = %e, "failed to clear storage");
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}
