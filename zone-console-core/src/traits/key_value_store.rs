//! Persisted key/value storage abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CoreResult;

/// Key/value store for JSON blobs
///
/// Process-wide and survives reloads. The engine keeps each collection under
/// one fixed key and always reads and writes the whole blob.
///
/// Platform implementations:
/// - `InMemoryKeyValueStore` (this crate, tests and ephemeral sessions)
/// - `JsonFileStore` (zone-console-app, one JSON file on disk)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    ///
    /// # Returns
    /// * `Ok(Some(json))` - value exists
    /// * `Ok(None)` - nothing stored
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Replace the value stored under `key`
    ///
    /// Fails with `StorageError` when the backend refuses the write (quota, I/O).
    async fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> CoreResult<()>;
}

/// In-memory key/value store
///
/// Default implementation, available on all platforms.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
