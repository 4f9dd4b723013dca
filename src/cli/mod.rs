//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands and the
//! plumbing they share: runtime, configuration, store and prompts.

use colored::Colorize;
use pingate_core::config::{toml_config, GateConfig};
use pingate_core::error::PinGateError;
use pingate_core::store::open_store;
use pingate_core::PinGate;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

pub mod settings;
pub mod unlock;

/// Run a command on a single-threaded runtime
pub fn block_on<F>(future: F) -> Result<(), PinGateError>
where
    F: Future<Output = Result<(), PinGateError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

/// Load configuration, open the configured store and initialize the gate
pub async fn open_gate() -> Result<(Arc<PinGate>, GateConfig), PinGateError> {
    let config = toml_config::load_config()?;
    let config_dir = toml_config::get_config_dir()?;
    debug!("Using {:?} storage in {:?}", config.storage.backend, config_dir);

    let gate = Arc::new(PinGate::new(open_store(&config.storage, &config_dir)));
    gate.initialize().await?;
    Ok((gate, config))
}

/// Print an error to stderr
pub fn print_error(error: &PinGateError) {
    eprintln!("{} {}", "error:".red().bold(), error);
}

/// Prompt for a PIN on stdin
///
/// Only the line terminator is stripped; the PIN is compared exactly as typed.
pub fn prompt_pin(prompt: &str) -> Result<String, PinGateError> {
    print!("{}: ", prompt);
    io::stdout().flush().map_err(PinGateError::Io)?;

    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).map_err(PinGateError::Io)?;
    if read == 0 {
        return Err(PinGateError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no input",
        )));
    }

    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Prompt for yes/no with default
pub fn prompt_yes_no(prompt: &str, default_yes: bool) -> Result<bool, PinGateError> {
    let default_indicator = if default_yes { "[Y/n]" } else { "[y/N]" };

    loop {
        print!("{} {}: ", prompt, default_indicator);
        io::stdout().flush().map_err(PinGateError::Io)?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(PinGateError::Io)?;

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => return Ok(default_yes),
            _ => {
                println!("Please enter 'y' for yes or 'n' for no.");
                continue;
            }
        }
    }
}
