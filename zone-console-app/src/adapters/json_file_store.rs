//! JSON file backed key/value store.
//!
//! Every key lives in one JSON object on disk:
//! `{ "zone_console.credentials": "<blob>", "zone_console.templates": "<blob>" }`.
//! The file is read once and cached; every write replaces the whole file via
//! a temporary sibling and a rename. A file that is not a JSON object of
//! strings is moved aside to `<name>.json.corrupt` and the store starts empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use zone_console_core::error::{CoreError, CoreResult};
use zone_console_core::traits::KeyValueStore;

const MAX_STORE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

type Entries = BTreeMap<String, String>;

/// Key/value store persisted to a single JSON file
pub struct JsonFileStore {
    path: PathBuf,
    /// `None` until the file has been read
    cache: Arc<RwLock<Option<Entries>>>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> CoreResult<Entries> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Store file does not exist yet: {}", self.path.display());
                return Ok(Entries::new());
            }
            Err(e) => {
                return Err(CoreError::StorageError(format!(
                    "Failed to read store file metadata: {e}"
                )))
            }
        };

        if metadata.len() > MAX_STORE_FILE_SIZE {
            return Err(CoreError::StorageError(format!(
                "Store file too large: {} bytes (max: {MAX_STORE_FILE_SIZE} bytes)",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to read store file: {e}")))?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let corrupt_path = self.corrupt_path();
                log::warn!(
                    "Invalid store format in {}: {e}; moving it to {} and starting empty",
                    self.path.display(),
                    corrupt_path.display()
                );
                tokio::fs::rename(&self.path, &corrupt_path)
                    .await
                    .map_err(|e| {
                        CoreError::StorageError(format!("Failed to move corrupt store file: {e}"))
                    })?;
                Ok(Entries::new())
            }
        }
    }

    /// Where an unreadable store file is moved before starting over
    #[must_use]
    pub fn corrupt_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    async fn write_file(&self, entries: &Entries) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    CoreError::StorageError(format!("Failed to create store directory: {e}"))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to write store file: {e}")))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to replace store file: {e}")))
    }

    /// Run `f` on the cached entries (loading them first) and write the result back
    async fn update<F>(&self, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut Entries) -> bool + Send,
    {
        let mut cache = self.cache.write().await;
        let mut entries = match cache.take() {
            Some(entries) => entries,
            None => self.read_file().await?,
        };
        let changed = f(&mut entries);
        let result = if changed {
            self.write_file(&entries).await
        } else {
            Ok(())
        };
        if result.is_ok() {
            *cache = Some(entries);
        }
        result
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        {
            let cache = self.cache.read().await;
            if let Some(ref entries) = *cache {
                return Ok(entries.get(key).cloned());
            }
        }

        let mut cache = self.cache.write().await;
        if cache.is_none() {
            *cache = Some(self.read_file().await?);
        }
        Ok(cache.as_ref().and_then(|entries| entries.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.update(move |entries| {
            entries.insert(key, value);
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        self.update(|entries| entries.remove(key).is_some()).await
    }
}
