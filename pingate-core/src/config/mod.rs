//! Configuration module
//!
//! Handles lockout policy and storage backend settings loaded from TOML.
//! The PIN itself is never part of the configuration file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gate::lockout::LockoutPolicy;
use crate::store::keyring::DEFAULT_SERVICE;

pub mod toml_config;

/// Lockout settings for the launch lock screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutSettings {
    /// Consecutive failed attempts before input is locked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How long input stays locked, in seconds
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_lockout_secs() -> u64 {
    30
}

impl LockoutSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts < 1 || self.max_attempts > 20 {
            return Err(format!(
                "max_attempts must be between 1 and 20, got {}",
                self.max_attempts
            ));
        }

        if self.lockout_secs < 1 || self.lockout_secs > 3600 {
            return Err(format!(
                "lockout_secs must be between 1 and 3600, got {}",
                self.lockout_secs
            ));
        }

        Ok(())
    }

    /// Build the runtime policy
    pub fn policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(self.max_attempts, Duration::from_secs(self.lockout_secs))
    }
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lockout_secs: default_lockout_secs(),
        }
    }
}

/// Where the PIN configuration is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// TOML file in the configuration directory
    #[default]
    File,
    /// System keyring
    Keyring,
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Keyring service name, only used by the keyring backend
    #[serde(default = "default_service")]
    pub service: String,
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

impl StorageSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == StorageBackend::Keyring && self.service.trim().is_empty() {
            return Err("Keyring service name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            service: default_service(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub lockout: LockoutSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl GateConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.lockout.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}
