//! Namespaced access to a [`Storage`] backend.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::Storage;
use crate::error::Result;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "graphiql";

/// Prefixes every key with `"<namespace>:"` so several tools can share one
/// backend.
///
/// A disabled API (no backend) reads nothing and writes nowhere.
#[derive(Clone)]
pub struct StorageApi {
    storage: Option<Arc<dyn Storage>>,
    namespace: String,
}

impl StorageApi {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_namespace(storage, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(storage: Arc<dyn Storage>, namespace: impl Into<String>) -> Self {
        Self {
            storage: Some(storage),
            namespace: namespace.into(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            storage: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    /// Read `name`. Empty values are absent; stray `"null"`/`"undefined"`
    /// strings are absent and get cleaned up.
    pub fn get(&self, name: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        let key = self.key(name);
        let value = storage.get(&key)?;
        if value == "null" || value == "undefined" {
            debug!(key = %key, "removing placeholder value");
            storage.remove(&key);
            return None;
        }
        (!value.is_empty()).then_some(value)
    }

    /// Write `name`. An empty value removes the key instead.
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let Some(storage) = self.storage.as_ref() else {
            return Ok(());
        };
        let key = self.key(name);
        if value.is_empty() {
            storage.remove(&key);
            return Ok(());
        }
        storage.set(&key, value)
    }

    pub fn remove(&self, name: &str) {
        if let Some(storage) = self.storage.as_ref() {
            storage.remove(&self.key(name));
        }
    }

    /// Remove every key in this namespace, leaving other namespaces alone.
    pub fn clear(&self) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };
        let prefix = self.key("");
        for key in storage.keys() {
            if key.starts_with(&prefix) {
                storage.remove(&key);
            }
        }
    }

    /// Number of keys in this namespace.
    pub fn len(&self) -> usize {
        let Some(storage) = self.storage.as_ref() else {
            return 0;
        };
        let prefix = self.key("");
        storage
            .keys()
            .iter()
            .filter(|key| key.starts_with(&prefix))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for StorageApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageApi")
            .field("namespace", &self.namespace)
            .field("enabled", &self.storage.is_some())
            .finish()
    }
}
