//! Storage layer for gql-history.
//!
//! A [`Storage`] is a synchronous string key-value capability, the shape of a
//! browser's local storage. Two backends ship with the crate:
//!
//! - [`MemoryStorage`]: in-process map, optional byte quota (test double)
//! - [`FileStorage`]: one JSON file in a directory, rewritten atomically
//!
//! On top sit [`StorageApi`] (key namespacing) and [`RecordStore`]
//! (an ordered, bounded list of records persisted under one key).

pub mod api;
pub mod fs;
pub mod memory;
pub mod records;

pub use api::{StorageApi, DEFAULT_NAMESPACE};
pub use fs::FileStorage;
pub use memory::MemoryStorage;
pub use records::{Keyed, RecordStore};

use crate::error::Result;

/// Synchronous string key-value store.
///
/// Methods take `&self`; implementations synchronize internally so one
/// backend can be shared by several record stores.
pub trait Storage: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. A failed write must leave the previous
    /// value in place.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str);

    fn clear(&self);

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Vec<String>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
