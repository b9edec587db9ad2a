//! Persistence
//!
//! Texts and saved locators live in an asynchronous key-value store with
//! whole-value reads and writes. Two backends ship with the crate: an
//! in-memory map and a single JSON file.

mod model;
mod service;

pub use model::{HostBucket, LocatorRecord, SiteSelectors, TextSnippet};
pub use service::{AddSelectorOutcome, SITE_SELECTORS_KEY, StorageService, TEXTS_KEY};

use crate::utils::{Result, StorageError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

/// Asynchronous whole-value key-value store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` when never written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value under `key`
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by one JSON object on disk
///
/// A missing file reads as an empty store. Every write goes to a sibling
/// temporary file that then replaces the store, so a failed write leaves the
/// previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write of the file
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StorageError::Backend(e.to_string()).into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::Corrupt {
                key: self.path.display().to_string(),
                reason: format!("expected a JSON object, found {other}"),
            }
            .into()),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(all))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        log::debug!("wrote key {key} to {}", self.path.display());
        Ok(())
    }
}
