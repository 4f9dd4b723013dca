//! pingate - local PIN lock for a personal finance app
//!
//! A command-line front end for the PIN gate: the settings actions
//! (set, change, enable, disable, reset, clear) and the launch lock screen.

use clap::{Parser, Subcommand};
use pingate_core::error::{GateError, PinGateError};
use pingate_core::init_logging;

mod cli;

#[derive(Parser)]
#[command(name = "pingate")]
#[command(about = "Local PIN lock with attempt limiting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a PIN is set and the lock is enabled
    Status,
    /// Set a new PIN and enable the lock
    Set,
    /// Change the PIN after confirming the current one
    Change,
    /// Re-enable the lock for a stored PIN
    Enable,
    /// Disable the lock and delete the stored PIN
    Disable,
    /// Reset the PIN to 1234 and enable the lock
    Reset,
    /// Remove all PIN data
    Clear,
    /// Present the lock screen until the correct PIN is entered
    Unlock,
}

fn main() {
    // Initialize logging
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Status => cli::block_on(cli::settings::run_status()),
        Commands::Set => cli::block_on(cli::settings::run_set()),
        Commands::Change => cli::block_on(cli::settings::run_change()),
        Commands::Enable => cli::block_on(cli::settings::run_enable()),
        Commands::Disable => cli::block_on(cli::settings::run_disable()),
        Commands::Reset => cli::block_on(cli::settings::run_reset()),
        Commands::Clear => cli::block_on(cli::settings::run_clear()),
        Commands::Unlock => cli::block_on(cli::unlock::run_unlock()),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                PinGateError::Config(_) | PinGateError::TomlSerialize(_) => 2,
                PinGateError::Gate(ref gate_error) => match gate_error {
                    GateError::InvalidFormat | GateError::NotConfigured => 2,
                    // Storage errors (exit code 2, the store needs attention)
                    GateError::StoreFailure(_) => 2,
                    GateError::LockedOut { .. } => 1,
                },
                // Wrong PIN (exit code 1 - runtime)
                PinGateError::Denied => 1,
                // IO errors (exit code 1 - runtime)
                PinGateError::Io(_) => 1,
            };

            cli::print_error(&e);
            std::process::exit(exit_code);
        }
    }
}
