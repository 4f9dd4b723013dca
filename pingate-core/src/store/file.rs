//! TOML file store
//!
//! Keeps all entries in a single TOML document next to the configuration
//! file. Each write rewrites the document through a temporary file that is
//! renamed into place, so a single `set` either fully lands or not at all.

use super::KeyValueStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Default store file name inside the configuration directory
pub const STORE_FILE_NAME: &str = "store.toml";

/// File-backed [`KeyValueStore`]
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        toml::from_str(&contents).map_err(|e| StoreError::Corrupt {
            key: self.path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = toml::to_string(entries).map_err(|e| StoreError::WriteFailed {
            key: self.path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Wrote {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.load().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.multi_remove(&[key]).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.persist(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(STORE_FILE_NAME);

        let store = FileStore::new(&path);
        store.set("@pin_config", r#"{"enabled":true,"pin":"1234"}"#).await.unwrap();
        store.set("other", "x").await.unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("@pin_config").await.unwrap().as_deref(),
            Some(r#"{"enabled":true,"pin":"1234"}"#)
        );

        reopened.multi_remove(&["@pin_config", "missing"]).await.unwrap();
        assert_eq!(reopened.get("@pin_config").await.unwrap(), None);
        assert_eq!(reopened.get("other").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join(STORE_FILE_NAME));
        assert_eq!(store.get("anything").await.unwrap(), None);
        store.remove("anything").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_garbage_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        std::fs::write(&path, "not = [valid").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("key").await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
