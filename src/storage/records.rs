//! Record store: an ordered, optionally bounded list of records persisted as
//! one JSON array under a single storage key.
//!
//! Order is recency order, oldest first. Every mutation rewrites the whole
//! array before returning.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::api::StorageApi;
use crate::error::HistoryError;

/// How many times `push` retries after a quota error.
const MAX_PUSH_ATTEMPTS: usize = 5;

/// Identity-equality for stored records.
///
/// Two records with the same identity are "the same entry" even when their
/// annotations differ.
pub trait Keyed {
    fn same_identity(&self, other: &Self) -> bool;
}

/// Persisted layouts accepted on read.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecords<T> {
    List(Vec<T>),
    /// Legacy layout: `{"<key>": [...]}`.
    Wrapped(HashMap<String, Vec<T>>),
}

#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    key: String,
    storage: StorageApi,
    max_size: Option<usize>,
    items: Vec<T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Keyed,
{
    /// Open the store persisted under `key`. A `max_size` of `None` or zero
    /// means the store never evicts.
    pub fn new(key: impl Into<String>, storage: StorageApi, max_size: Option<usize>) -> Self {
        let mut store = Self {
            key: key.into(),
            storage,
            max_size: max_size.filter(|&n| n > 0),
            items: Vec::new(),
        };
        store.items = store.fetch_all();
        store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// In-memory mirror of the persisted list.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, record: &T) -> bool {
        self.items.iter().any(|x| x.same_identity(record))
    }

    /// Read every persisted record. Missing or malformed data reads as empty.
    pub fn fetch_all(&self) -> Vec<T> {
        let Some(raw) = self.storage.get(&self.key) else {
            return Vec::new();
        };
        match serde_json::from_str::<StoredRecords<T>>(&raw) {
            Ok(StoredRecords::List(items)) => items,
            Ok(StoredRecords::Wrapped(mut map)) => match map.remove(&self.key) {
                Some(items) => items,
                None => {
                    warn!(key = %self.key, "stored records missing their key, treating as empty");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(key = %self.key, error = %e, "malformed stored records, treating as empty");
                Vec::new()
            }
        }
    }

    /// Most recently pushed record.
    pub fn fetch_recent(&self) -> Option<&T> {
        self.items.last()
    }

    /// Append `record`, evicting the oldest records past the maximum.
    ///
    /// When the backend runs out of room, a bounded store evicts one more
    /// record and tries again. If the write never lands the in-memory items
    /// are left as they were.
    pub fn push(&mut self, record: T) {
        let mut items = self.items.clone();
        items.push(record);
        if let Some(max) = self.max_size {
            if items.len() > max {
                items.drain(..items.len() - max);
            }
        }

        for attempt in 1..=MAX_PUSH_ATTEMPTS {
            let serialized = match serde_json::to_string(&items) {
                Ok(s) => s,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "failed to serialize records");
                    return;
                }
            };
            match self.storage.set(&self.key, &serialized) {
                Ok(()) => {
                    debug!(key = %self.key, count = items.len(), "records saved");
                    self.items = items;
                    return;
                }
                Err(e) if e.is_quota_error() && self.max_size.is_some() && !items.is_empty() => {
                    debug!(key = %self.key, attempt, "storage quota exceeded, evicting oldest record");
                    items.remove(0);
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "failed to save records");
                    return;
                }
            }
        }
        warn!(key = %self.key, "gave up saving records after repeated quota errors");
    }

    /// Replace a stored record with `record`.
    ///
    /// `index` is a hint: it is used when the record there has the same
    /// identity, otherwise the first identity match is replaced. No-op when
    /// nothing matches.
    pub fn edit(&mut self, record: T, index: Option<usize>) {
        let position = index
            .filter(|&i| self.items.get(i).is_some_and(|x| x.same_identity(&record)))
            .or_else(|| self.items.iter().position(|x| x.same_identity(&record)));

        if let Some(position) = position {
            self.items[position] = record;
            self.save();
        }
    }

    /// Remove the first record with the same identity. No-op when absent.
    pub fn delete(&mut self, record: &T) {
        if let Some(position) = self.items.iter().position(|x| x.same_identity(record)) {
            self.items.remove(position);
            self.save();
        }
    }

    fn save(&self) {
        let result = serde_json::to_string(&self.items)
            .map_err(HistoryError::from)
            .and_then(|serialized| self.storage.set(&self.key, &serialized));
        match result {
            Ok(()) => debug!(key = %self.key, count = self.items.len(), "records saved"),
            Err(e) => warn!(key = %self.key, error = %e, "failed to save records"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        #[serde(default)]
        text: String,
    }

    impl Keyed for Note {
        fn same_identity(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    fn note(id: u32) -> Note {
        Note { id, text: String::new() }
    }

    fn ids(store: &RecordStore<Note>) -> Vec<u32> {
        store.items().iter().map(|n| n.id).collect()
    }

    fn api() -> (Arc<MemoryStorage>, StorageApi) {
        let backend = Arc::new(MemoryStorage::new());
        (backend.clone(), StorageApi::new(backend))
    }

    #[test]
    fn test_push_persists_and_reloads() {
        let (_backend, api) = api();
        let mut store = RecordStore::new("notes", api.clone(), None);
        store.push(note(1));
        store.push(note(2));
        assert_eq!(store.fetch_recent().map(|n| n.id), Some(2));

        let reopened: RecordStore<Note> = RecordStore::new("notes", api, None);
        assert_eq!(ids(&reopened), vec![1, 2]);
        assert_eq!(reopened.fetch_all(), store.items().to_vec());
    }

    #[test]
    fn test_bounded_store_evicts_oldest() {
        let (_backend, api) = api();
        let mut store = RecordStore::new("notes", api, Some(3));
        for id in 1..=5 {
            store.push(note(id));
            assert!(store.len() <= 3);
        }
        assert_eq!(ids(&store), vec![3, 4, 5]);
        assert_eq!(ids(&RecordStore::new("notes", store.storage.clone(), Some(3))), vec![3, 4, 5]);
    }

    #[test]
    fn test_zero_max_size_is_unbounded() {
        let (_backend, api) = api();
        let mut store = RecordStore::new("notes", api, Some(0));
        for id in 1..=10 {
            store.push(note(id));
        }
        assert_eq!(store.len(), 10);
        assert!(store.max_size().is_none());
    }

    #[test]
    fn test_malformed_data_reads_as_empty() {
        let (backend, api) = api();
        backend.set("graphiql:notes", "{not json").unwrap();
        let store: RecordStore<Note> = RecordStore::new("notes", api.clone(), None);
        assert!(store.is_empty());

        // Valid JSON, wrong shape
        backend.set("graphiql:notes", r#"[{"text":"no id"}]"#).unwrap();
        let store: RecordStore<Note> = RecordStore::new("notes", api, None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_reads_wrapped_layout_and_writes_array() {
        let (backend, api) = api();
        backend
            .set("graphiql:notes", r#"{"notes":[{"id":7},{"id":8}]}"#)
            .unwrap();
        let mut store: RecordStore<Note> = RecordStore::new("notes", api, None);
        assert_eq!(ids(&store), vec![7, 8]);

        store.push(note(9));
        let raw = backend.get("graphiql:notes").unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn test_edit_by_identity_and_index() {
        let (_backend, api) = api();
        let mut store = RecordStore::new("notes", api, None);
        store.push(note(1));
        store.push(note(2));
        store.push(note(1));

        store.edit(Note { id: 1, text: "first".into() }, None);
        assert_eq!(store.items()[0].text, "first");
        assert_eq!(store.items()[2].text, "");

        store.edit(Note { id: 1, text: "last".into() }, Some(2));
        assert_eq!(store.items()[2].text, "last");

        // Index pointing at a different identity falls back to first match
        store.edit(Note { id: 2, text: "two".into() }, Some(0));
        assert_eq!(store.items()[0].text, "first");
        assert_eq!(store.items()[1].text, "two");
    }

    #[test]
    fn test_edit_and_delete_missing_are_noops() {
        let (_backend, api) = api();
        let mut store = RecordStore::new("notes", api, None);
        store.push(note(1));

        store.edit(Note { id: 5, text: "x".into() }, Some(0));
        store.delete(&note(5));
        assert_eq!(store.items(), &[note(1)]);
    }

    #[test]
    fn test_delete_removes_first_match_only() {
        let (_backend, api) = api();
        let mut store = RecordStore::new("notes", api.clone(), None);
        store.push(note(1));
        store.push(note(2));
        store.push(note(1));

        store.delete(&note(1));
        assert_eq!(ids(&store), vec![2, 1]);
        assert!(store.contains(&note(1)));
        assert_eq!(ids(&RecordStore::new("notes", api, None)), vec![2, 1]);
    }

    #[test]
    fn test_quota_error_evicts_from_bounded_store() {
        // Each note serializes to `{"id":N,"text":""}`, 18 bytes
        let backend = Arc::new(MemoryStorage::with_quota(60));
        let api = StorageApi::new(backend.clone());
        let mut store = RecordStore::new("n", api, Some(10));
        for id in 1..=5 {
            store.push(note(id));
        }
        let raw = backend.get("graphiql:n").unwrap();
        assert!(raw.len() + "graphiql:n".len() <= 60);
        assert_eq!(store.fetch_recent().map(|n| n.id), Some(5));
        assert!(store.len() < 5);
    }

    #[test]
    fn test_quota_error_on_unbounded_store_loses_write() {
        let backend = Arc::new(MemoryStorage::with_quota(40));
        let api = StorageApi::new(backend.clone());
        let mut store = RecordStore::new("n", api, None);
        store.push(note(1));
        store.push(note(2));
        store.push(note(3));

        assert_eq!(ids(&store), vec![1]);
        assert_eq!(RecordStore::<Note>::new("n", store.storage.clone(), None).len(), 1);
    }
}
