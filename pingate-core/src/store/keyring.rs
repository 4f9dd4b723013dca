//! Keyring store
//!
//! Uses the system keyring (GNOME Keyring / Secret Service on Linux) to hold
//! each key as a separate credential under one service name.

use super::KeyValueStore;
use crate::error::StoreError;
use async_trait::async_trait;
use keyring::Entry;

/// Default keyring service name
pub const DEFAULT_SERVICE: &str = "pingate";

/// Keyring-backed [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Run a blocking keyring call off the async executor
    async fn with_entry<T, F>(&self, access: Access, key: &str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(Entry, String) -> Result<T, StoreError> + Send + 'static,
    {
        let service = self.service.clone();
        let owned_key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &owned_key)
                .map_err(|e| access.failed(owned_key.clone(), e.to_string()))?;
            op(entry, owned_key)
        })
        .await
        .map_err(|e| access.failed(key.to_string(), format!("keyring task failed: {}", e)))?
    }
}

/// Which operation a keyring failure belongs to
#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
    Remove,
}

impl Access {
    fn failed(self, key: String, reason: String) -> StoreError {
        match self {
            Access::Read => StoreError::ReadFailed { key, reason },
            Access::Write => StoreError::WriteFailed { key, reason },
            Access::Remove => StoreError::RemoveFailed { key, reason },
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entry(Access::Read, key, |entry, key| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Access::Read.failed(key, e.to_string())),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.to_string();
        self.with_entry(Access::Write, key, move |entry, key| {
            entry
                .set_password(&value)
                .map_err(|e| Access::Write.failed(key, e.to_string()))
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with_entry(Access::Remove, key, |entry, key| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Access::Remove.failed(key, e.to_string())),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_keep_key_and_reason() {
        let reason = keyring::Error::Invalid("user".to_string(), "empty".to_string()).to_string();

        match Access::Read.failed("@pin_config".to_string(), reason.clone()) {
            StoreError::ReadFailed { key, reason: r } => {
                assert_eq!(key, "@pin_config");
                assert_eq!(r, reason);
            }
            other => panic!("expected ReadFailed, got {:?}", other),
        }
        assert!(matches!(
            Access::Write.failed("k".to_string(), reason.clone()),
            StoreError::WriteFailed { .. }
        ));
        assert!(matches!(
            Access::Remove.failed("k".to_string(), reason.clone()),
            StoreError::RemoveFailed { .. }
        ));
    }

    #[test]
    fn test_failure_is_not_reported_as_unavailable() {
        let error = Access::Read.failed(
            "@pin_config".to_string(),
            "No matching entry found in secure storage".to_string(),
        );
        assert_eq!(
            error.to_string(),
            "Failed to read '@pin_config': No matching entry found in secure storage"
        );
    }
}
