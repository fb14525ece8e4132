//! Key-value persistence behind the session.
//!
//! # Design
//! `KeyValueStore` mirrors the small async string store mobile platforms
//! expose: get/set/remove plus multi-key variants. `multi_set` and
//! `multi_remove` default to per-key loops; stores that can apply several
//! keys at once override them so a login never leaves a token without its
//! user (or the reverse).
//!
//! `FileStore` keeps the whole map in one JSON document and replaces it via
//! a uniquely named temp file + rename, so every write (single or multi-key)
//! is atomic. Writes from separate instances on one path are last-write-wins.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::ApiError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;

    async fn remove(&self, key: &str) -> Result<(), ApiError>;

    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<(), ApiError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), ApiError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<(), ApiError> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), ApiError> {
        let mut map = self.entries.write().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> ApiError {
    ApiError::Storage(format!("{}: {}", path.display(), err))
}

/// Write `bytes` to a uniquely named sibling temp file, then rename it over
/// `path`. Concurrent writers never share a temp file.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ApiError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| storage_error(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| storage_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| storage_error(path, e.error))?;
    Ok(())
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

    async fn load(&self) -> Result<HashMap<String, String>, ApiError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| storage_error(&self.path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    async fn save(&self, map: &HashMap<String, String>) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error(parent, e))?;
            }
        }
        let raw = serde_json::to_string_pretty(map).map_err(|e| storage_error(&self.path, e))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, raw.as_bytes()))
            .await
            .map_err(|e| storage_error(&self.path, e))??;
        debug!(path = %self.path.display(), keys = map.len(), "store persisted");
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut HashMap<String, String>) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        apply(&mut map);
        self.save(&map).await
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.update(|map| {
            map.remove(key);
        })
        .await
    }

    async fn multi_set(&self, entries: &[(&str, &str)]) -> Result<(), ApiError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        })
        .await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), ApiError> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_multi_ops() {
        let store = MemoryStore::new();
        store.multi_set(&[("a", "1"), ("b", "2")]).await.unwrap();
        assert_eq!(store.len().await, 2);
        store.multi_remove(&["a", "b", "missing"]).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::new(&path);
        store.multi_set(&[("authToken", "t-1"), ("user", "{}")]).await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("authToken").await.unwrap().as_deref(), Some("t-1"));
        assert_eq!(reopened.get("user").await.unwrap().as_deref(), Some("{}"));
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn separate_instances_can_write_the_same_file_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let first = Arc::new(FileStore::new(&path));
        let second = Arc::new(FileStore::new(&path));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = if i % 2 == 0 { first.clone() } else { second.clone() };
            tasks.push(tokio::spawn(async move {
                store.set("authToken", &format!("t-{i}")).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let token = FileStore::new(&path).get("authToken").await.unwrap().unwrap();
        assert!(token.starts_with("t-"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("authToken").await.unwrap(), None);
        store.multi_remove(&["authToken"]).await.unwrap();
    }

    #[tokio::test]
    async fn file_store_rejects_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileStore::new(&path).get("authToken").await.unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
