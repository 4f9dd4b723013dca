//! Error types for the pingate PIN lock
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the pingate application
#[derive(Error, Debug)]
pub enum PinGateError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised by PIN gate operations
    #[error("PIN error: {0}")]
    Gate(#[from] GateError),

    /// An entered PIN did not match the stored one
    #[error("Incorrect PIN")]
    Denied,

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// PIN gate operation errors
///
/// Every failure of a gate operation falls into one of these four kinds.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Invalid PIN format: must be exactly 4 numeric digits")]
    InvalidFormat,

    #[error("No PIN is configured")]
    NotConfigured,

    #[error("Too many attempts. Try again in {retry_after_secs} seconds")]
    LockedOut { retry_after_secs: u64 },

    #[error("Storage failure: {0}")]
    StoreFailure(#[from] StoreError),
}

/// Key-value store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend unavailable")]
    Unavailable,

    #[error("Failed to read '{key}': {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Failed to write '{key}': {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Failed to remove '{key}': {reason}")]
    RemoveFailed { key: String, reason: String },

    #[error("Stored value for '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PinGateError>;
