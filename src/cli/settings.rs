//! PIN settings commands
//!
//! The actions offered by the app's security settings screen.

use super::{open_gate, prompt_pin, prompt_yes_no};
use colored::Colorize;
use pingate_core::error::{GateError, PinGateError};
use pingate_core::types::{Pin, DEFAULT_PIN};

/// Run the status command
pub async fn run_status() -> Result<(), PinGateError> {
    let (gate, config) = open_gate().await?;
    let status = gate.status().await;

    let yes_no = |flag: bool| if flag { "yes".green() } else { "no".yellow() };
    println!("PIN set:      {}", yes_no(status.is_set));
    println!("Lock enabled: {}", yes_no(status.enabled));
    println!(
        "Lockout:      {} attempts, {}s",
        config.lockout.max_attempts, config.lockout.lockout_secs
    );
    Ok(())
}

/// Run the set command
pub async fn run_set() -> Result<(), PinGateError> {
    let (gate, _) = open_gate().await?;

    if gate.status().await.is_set {
        println!("A PIN is already set. Use `pingate change` to replace it.");
        return Ok(());
    }

    let pin = prompt_new_pin()?;
    gate.set_pin(&pin).await?;
    println!("{} PIN set, lock enabled", "✓".green());
    Ok(())
}

/// Run the change command
pub async fn run_change() -> Result<(), PinGateError> {
    let (gate, _) = open_gate().await?;

    if !gate.status().await.is_set {
        return Err(GateError::NotConfigured.into());
    }

    let current = prompt_pin("Current PIN")?;
    let new = prompt_new_pin()?;

    if gate.change_pin(&current, &new).await? {
        println!("{} PIN changed", "✓".green());
        Ok(())
    } else {
        Err(PinGateError::Denied)
    }
}

/// Run the enable command
pub async fn run_enable() -> Result<(), PinGateError> {
    let (gate, _) = open_gate().await?;

    match gate.enable().await {
        Ok(()) => {
            println!("{} PIN lock enabled", "✓".green());
            Ok(())
        }
        Err(GateError::NotConfigured) => {
            println!("No PIN is stored. Set one with `pingate set`.");
            Err(GateError::NotConfigured.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the disable command
pub async fn run_disable() -> Result<(), PinGateError> {
    let (gate, _) = open_gate().await?;

    if !prompt_yes_no("Disabling deletes the stored PIN. Continue?", false)? {
        println!("Cancelled.");
        return Ok(());
    }

    gate.disable().await?;
    println!("{} PIN lock disabled", "✓".green());
    Ok(())
}

/// Run the reset command
pub async fn run_reset() -> Result<(), PinGateError> {
    let (gate, _) = open_gate().await?;

    if !prompt_yes_no(&format!("Reset the PIN to {}?", DEFAULT_PIN), false)? {
        println!("Cancelled.");
        return Ok(());
    }

    gate.reset_to_default().await?;
    println!("{} PIN reset to {}", "✓".green(), DEFAULT_PIN);
    Ok(())
}

/// Run the clear command
pub async fn run_clear() -> Result<(), PinGateError> {
    let (gate, _) = open_gate().await?;

    if !prompt_yes_no("Remove all PIN data?", false)? {
        println!("Cancelled.");
        return Ok(());
    }

    gate.clear_all().await?;
    println!("{} PIN data cleared", "✓".green());
    Ok(())
}

/// Ask for a new PIN twice until both entries are valid and match
fn prompt_new_pin() -> Result<String, PinGateError> {
    loop {
        let pin = prompt_pin("New PIN (4 digits)")?;
        if let Err(e) = Pin::new(pin.clone()) {
            println!("{} {}", "✗".red(), e);
            continue;
        }

        let confirm = prompt_pin("Confirm PIN")?;
        if confirm != pin {
            println!("{} PINs do not match, try again", "✗".red());
            continue;
        }

        return Ok(pin);
    }
}
