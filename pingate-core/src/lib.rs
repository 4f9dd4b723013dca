//! Core library for the pingate app lock
//!
//! This crate provides the local PIN gate of a personal finance app: PIN
//! configuration, verification, timed lockout after repeated failures, and
//! the key-value stores the configuration is persisted in.

pub mod error;
pub mod types;

pub mod config;
pub mod gate;
pub mod store;

pub use gate::{AttemptOutcome, LockScreen, LockState, LockoutPolicy, PinGate};

/// Initialize logging infrastructure
///
/// Sets up tracing with systemd journal logging when running under systemd.
/// Otherwise logs to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Try to use systemd journal logging if available
    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(tracing_subscriber::filter::LevelFilter::INFO)
                .try_init()?;
            return Ok(());
        }
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;

    Ok(())
}
