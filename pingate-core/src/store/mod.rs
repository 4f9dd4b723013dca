//! Local key-value storage
//!
//! The gate persists its configuration through [`KeyValueStore`], an async
//! string-keyed store with last-write-wins semantics and no transactions.

use crate::config::{StorageBackend, StorageSettings};
use crate::error::StoreError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub mod file;
pub mod keyring;
pub mod memory;

pub use file::FileStore;
pub use keyring::KeyringStore;
pub use memory::MemoryStore;

/// Async persistent string-keyed store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key; removing an absent key succeeds
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove several keys
    ///
    /// Backends that can do better than one call per key should override this.
    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Open the store selected in the configuration
///
/// `config_dir` is where the file backend keeps its data.
pub fn open_store(settings: &StorageSettings, config_dir: &Path) -> Arc<dyn KeyValueStore> {
    match settings.backend {
        StorageBackend::File => Arc::new(FileStore::new(config_dir.join(file::STORE_FILE_NAME))),
        StorageBackend::Keyring => Arc::new(KeyringStore::new(settings.service.clone())),
    }
}
