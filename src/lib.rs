//! # gql-history
//!
//! Persistent GraphQL query history for IDEs and API clients.
//!
//! Records every executed operation once, skips noise, keeps the recent list
//! bounded, and lets users pin favorites and label entries.
//!
//! ## Key Features
//!
//! - **Deduplicating**: identical re-runs and first-time metadata don't add entries
//! - **Bounded**: recent history evicts oldest first; favorites never evict
//! - **Persistent**: any synchronous key-value [`Storage`] backend
//! - **Syntax-checked**: only parseable GraphQL documents are saved
//!
//! ## Quick Start
//!
//! ```rust
//! use gql_history::{HistoryStore, MemoryStorage, QueryRecord};
//! use std::sync::Arc;
//!
//! let mut store = HistoryStore::new(Arc::new(MemoryStorage::new()), 20);
//!
//! store.update_history(&QueryRecord::new("query Q1 { name }").with_operation_name("Q1"));
//! store.update_history(&QueryRecord::new("query Q1 { name }").with_operation_name("Q1"));
//! assert_eq!(store.queries().len(), 1);
//!
//! let saved = store.queries()[0].clone();
//! store.toggle_favorite(&saved);
//! assert!(store.queries()[0].is_favorite());
//! ```

pub mod config;
pub mod error;
pub mod graphql;
pub mod history;
pub mod query;
pub mod storage;

// Re-exports for convenience
pub use error::{HistoryError, Result};

pub use config::HistoryConfig;
pub use history::{HistoryStore, FAVORITES_KEY, HISTORY_KEY};
pub use query::{Decline, QueryRecord, MAX_QUERY_SIZE};
pub use storage::{FileStorage, Keyed, MemoryStorage, RecordStore, Storage, StorageApi};
