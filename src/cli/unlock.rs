//! Unlock command implementation
//!
//! Presents the launch lock screen: prompts until the correct PIN is
//! entered, and counts down while input is locked out.

use super::{open_gate, prompt_pin};
use colored::Colorize;
use pingate_core::error::{GateError, PinGateError};
use pingate_core::{AttemptOutcome, LockScreen, LockState};
use std::io::{self, Write};
use std::time::Duration;

/// Run the unlock command
pub async fn run_unlock() -> Result<(), PinGateError> {
    let (gate, config) = open_gate().await?;

    if !gate.status().await.enabled {
        println!("PIN lock is disabled, nothing to unlock.");
        return Ok(());
    }

    let screen = LockScreen::new(gate, config.lockout.policy());
    println!("🔒 Enter your PIN to unlock");

    loop {
        if screen.retry_after().is_some() {
            wait_out_lockout(&screen).await?;
            continue;
        }

        // Read stdin off the runtime so the lockout timer keeps running
        let input = tokio::task::spawn_blocking(|| prompt_pin("PIN"))
            .await
            .map_err(|e| PinGateError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

        match screen.submit(&input).await {
            Ok(AttemptOutcome::Unlocked) => {
                println!("{} Unlocked", "✓".green());
                return Ok(());
            }
            Ok(AttemptOutcome::Denied { attempts_remaining }) => {
                println!(
                    "{} Incorrect PIN. {} attempts remaining.",
                    "✗".red(),
                    attempts_remaining
                );
            }
            Ok(AttemptOutcome::LockedOut { retry_after }) => {
                println!(
                    "{} Too many attempts. Try again in {} seconds.",
                    "✗".red(),
                    retry_after.as_secs()
                );
            }
            Err(GateError::LockedOut { .. }) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Show a countdown until the lock screen accepts input again
async fn wait_out_lockout(screen: &LockScreen) -> Result<(), PinGateError> {
    let mut state = screen.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = state.wait_for(|s| matches!(s, LockState::Ready { .. })) => break,
            _ = ticker.tick() => {
                let Some(remaining) = screen.retry_after() else { break };
                print!(
                    "\r{} Locked. Try again in {:>2}s",
                    "⏳".yellow(),
                    remaining.as_millis().div_ceil(1000)
                );
                io::stdout().flush()?;
            }
        }
    }

    println!();
    Ok(())
}
