//! TOML configuration file I/O
//!
//! Handles loading and saving the gate configuration to/from TOML files
//! in the user's configuration directory.

use crate::config::GateConfig;
use crate::error::{ConfigError, PinGateError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "PINGATE_CONFIG_DIR";

/// Get the default configuration directory
///
/// Returns ~/.config/pingate, or PINGATE_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf, PinGateError> {
    // Allow tests to override config directory via environment variable
    if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        PinGateError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("pingate"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, PinGateError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the default TOML file, falling back to defaults
pub fn load_config() -> Result<GateConfig, PinGateError> {
    let config_path = get_config_path()?;
    if !config_path.exists() {
        debug!("No configuration at {:?}, using defaults", config_path);
        return Ok(GateConfig::default());
    }
    load_config_from_path(&config_path)
}

/// Load configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<GateConfig, PinGateError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PinGateError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => PinGateError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: GateConfig = toml::from_str(&contents).map_err(|e| {
        PinGateError::Config(ConfigError::ValidationError {
            message: format!("Failed to parse config file: {}", e),
        })
    })?;

    config
        .validate()
        .map_err(|e| PinGateError::Config(ConfigError::ValidationError { message: e }))?;

    debug!(
        "Loaded configuration: max_attempts={}, lockout_secs={}, backend={:?}",
        config.lockout.max_attempts, config.lockout.lockout_secs, config.storage.backend
    );

    Ok(config)
}

/// Save configuration to the default TOML file
pub fn save_config(config: &GateConfig) -> Result<(), PinGateError> {
    let config_path = get_config_path()?;
    save_config_to_path(config, &config_path)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(config: &GateConfig, path: P) -> Result<(), PinGateError> {
    // Validate configuration before saving
    config
        .validate()
        .map_err(|e| PinGateError::Config(ConfigError::ValidationError { message: e }))?;

    // Ensure config directory exists
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PinGateError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(config)?;

    std::fs::write(&path, contents).map_err(|_e| {
        PinGateError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    info!("Saved configuration to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LockoutSettings, StorageBackend, StorageSettings};
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let original_config = GateConfig {
            lockout: LockoutSettings {
                max_attempts: 3,
                lockout_secs: 60,
            },
            storage: StorageSettings {
                backend: StorageBackend::Keyring,
                service: "pingate-test".to_string(),
            },
        };

        save_config_to_path(&original_config, &config_path).unwrap();
        let loaded_config = load_config_from_path(&config_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[lockout]\nmax_attempts = 3\n").unwrap();

        let loaded = load_config_from_path(&config_path).unwrap();
        assert_eq!(loaded.lockout.max_attempts, 3);
        assert_eq!(loaded.lockout.lockout_secs, 30);
        assert_eq!(loaded.storage, StorageSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected_on_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[lockout]\nmax_attempts = 0\n").unwrap();

        let err = load_config_from_path(&config_path).unwrap_err();
        assert!(matches!(
            err,
            PinGateError::Config(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_validation_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[lockout\nmax_attempts = \"five\"\n").unwrap();

        let err = load_config_from_path(&config_path).unwrap_err();
        match err {
            PinGateError::Config(ConfigError::ValidationError { message }) => {
                assert!(message.starts_with("Failed to parse config file"));
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_value_type_is_validation_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[storage]\nbackend = \"floppy\"\n").unwrap();

        let err = load_config_from_path(&config_path).unwrap_err();
        assert!(matches!(
            err,
            PinGateError::Config(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_load_failed() {
        let temp_dir = tempdir().unwrap();
        let err = load_config_from_path(temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, PinGateError::Config(ConfigError::LoadFailed { .. })));
    }
}
