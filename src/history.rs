//! History store: recent query executions plus pinned favorites.
//!
//! Two [`RecordStore`]s share one storage backend:
//!
//! - `"queries"`: recent history, bounded, oldest evicted first
//! - `"favorites"`: pinned entries, never evicted
//!
//! A record lives in exactly one of them. [`HistoryStore::queries`] is the
//! combined view, history first, recomputed after every mutation.
//!
//! Methods take `&mut self` and run to completion, so the read of the last
//! entry and the push that follows cannot interleave with another caller.
//! Hosts sharing a store across threads wrap it in a `Mutex`.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::HistoryConfig;
use crate::query::{policy, QueryRecord};
use crate::storage::{RecordStore, Storage, StorageApi};

/// Storage key of the bounded history list.
pub const HISTORY_KEY: &str = "queries";

/// Storage key of the favorites list.
pub const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Clone)]
pub struct HistoryStore {
    history: RecordStore<QueryRecord>,
    favorites: RecordStore<QueryRecord>,
    queries: Vec<QueryRecord>,
}

impl HistoryStore {
    /// Open the store in the default namespace.
    pub fn new(storage: Arc<dyn Storage>, max_history_length: usize) -> Self {
        Self::with_api(StorageApi::new(storage), max_history_length)
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &HistoryConfig) -> Self {
        let api = StorageApi::with_namespace(storage, config.namespace.clone());
        Self::with_api(api, config.max_history_length)
    }

    pub fn with_api(api: StorageApi, max_history_length: usize) -> Self {
        let history = RecordStore::new(HISTORY_KEY, api.clone(), Some(max_history_length));
        let favorites = RecordStore::new(FAVORITES_KEY, api, None);
        let mut store = Self {
            history,
            favorites,
            queries: Vec::new(),
        };
        store.refresh();
        info!(
            history = store.history.len(),
            favorites = store.favorites.len(),
            "opened history store"
        );
        store
    }

    /// History entries followed by favorites.
    pub fn queries(&self) -> &[QueryRecord] {
        &self.queries
    }

    pub fn history(&self) -> &RecordStore<QueryRecord> {
        &self.history
    }

    pub fn favorites(&self) -> &RecordStore<QueryRecord> {
        &self.favorites
    }

    /// Record an execution if the save policy accepts it.
    ///
    /// Only the identity fields are stored; any label or favorite flag on
    /// `candidate` is dropped. Returns whether a new entry was added.
    pub fn update_history(&mut self, candidate: &QueryRecord) -> bool {
        if !policy::should_save(candidate, self.history.fetch_recent()) {
            return false;
        }
        self.history.push(candidate.identity());
        self.refresh();
        debug!(history = self.history.len(), "query saved to history");
        true
    }

    /// Move `record` between history and favorites.
    ///
    /// A favorite is demoted to the end of history with `favorite = false`;
    /// anything else is promoted to favorites with `favorite = true`.
    pub fn toggle_favorite(&mut self, record: &QueryRecord) {
        let mut item = record.identity();
        item.label = record.label.clone();

        if record.is_favorite() {
            item.favorite = Some(false);
            self.favorites.delete(&item);
            self.history.push(item);
        } else {
            item.favorite = Some(true);
            self.favorites.push(item.clone());
            self.history.delete(&item);
        }
        self.refresh();
    }

    /// Replace the label of the stored entry matching `record`.
    ///
    /// `index` is a position within the owning collection, used when it
    /// points at a matching entry.
    pub fn edit_label(&mut self, record: &QueryRecord, index: Option<usize>) {
        let mut item = record.identity();
        item.label = record.label.clone();
        item.favorite = record.favorite;

        if record.is_favorite() {
            self.favorites.edit(item, index);
        } else {
            self.history.edit(item, index);
        }
        self.refresh();
    }

    /// Delete the entry matching `record` from its collection.
    ///
    /// With `clear_favorites`, a matching entry is removed from both
    /// collections.
    pub fn delete_history(&mut self, record: &QueryRecord, clear_favorites: bool) {
        let favorite = record.is_favorite();
        if favorite || clear_favorites {
            self.favorites.delete(record);
        }
        if !favorite || clear_favorites {
            self.history.delete(record);
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.queries = self
            .history
            .items()
            .iter()
            .chain(self.favorites.items())
            .cloned()
            .collect();
    }
}
