//! PIN gate
//!
//! Owns the PIN configuration, verifies entered PINs against it, and
//! exposes the enable/disable/change/reset operations used by the settings
//! screen and the launch lock screen.
//!
//! The configuration lives in the store as one serialized record, so each
//! change is a single `set`. Every operation holds a single-slot async lock
//! for its whole duration: at most one verify or mutation is in flight.

use crate::error::{GateError, StoreError};
use crate::store::KeyValueStore;
use crate::types::{
    Pin, PinConfiguration, PinStatus, StoredPinConfig, LEGACY_ENABLED_KEY, LEGACY_PIN_KEY,
    PIN_CONFIG_KEY,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

pub mod lockout;

pub use lockout::{AttemptOutcome, LockScreen, LockState, LockoutPolicy};

/// Local PIN lock backed by a [`KeyValueStore`]
pub struct PinGate {
    store: Arc<dyn KeyValueStore>,
    op_lock: Mutex<()>,
    // Bumped whenever the configuration is wiped
    epoch: watch::Sender<u64>,
}

impl PinGate {
    /// Create a gate over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            store,
            op_lock: Mutex::new(()),
            epoch,
        }
    }

    /// Bring stored state into the single-record layout
    ///
    /// Migrates the older two-key layout, writes an explicit disabled record
    /// on a fresh install, and repairs a record that claims to be enabled
    /// without a PIN. Call once at app start.
    pub async fn initialize(&self) -> Result<PinStatus, GateError> {
        let _guard = self.op_lock.lock().await;

        if let Some(config) = self.load().await? {
            if config.is_inconsistent() {
                warn!("PIN enabled without a stored PIN, disabling");
                self.save(&PinConfiguration::default()).await?;
                return Ok(PinStatus::default());
            }
            debug!("PIN configuration present, keeping current state");
            return Ok(config.status());
        }

        let legacy_pin = self.store.get(LEGACY_PIN_KEY).await?;
        let legacy_enabled = self.store.get(LEGACY_ENABLED_KEY).await?;

        let config = match (legacy_pin, legacy_enabled.as_deref()) {
            (None, None) => {
                info!("Fresh installation, PIN lock disabled");
                PinConfiguration::default()
            }
            (Some(pin), Some("true")) => {
                info!("Migrating existing PIN to the current storage layout");
                PinConfiguration::enabled_with(Pin::from_stored(pin))
            }
            _ => {
                warn!("Inconsistent legacy PIN state, clearing");
                PinConfiguration::default()
            }
        };

        self.save(&config).await?;
        self.store
            .multi_remove(&[LEGACY_PIN_KEY, LEGACY_ENABLED_KEY])
            .await?;

        Ok(config.status())
    }

    /// Current status; never fails
    ///
    /// Any store error reads as "no PIN" so a broken store cannot lock the
    /// user out permanently.
    pub async fn status(&self) -> PinStatus {
        let _guard = self.op_lock.lock().await;
        match self.load().await {
            Ok(config) => {
                let status = config.map(|c| c.status()).unwrap_or_default();
                debug!(
                    "PIN status: enabled={}, is_set={}",
                    status.enabled, status.is_set
                );
                status
            }
            Err(e) => {
                warn!("Failed to read PIN status: {}", e);
                PinStatus::default()
            }
        }
    }

    /// Set a new PIN and enable the lock
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if `pin` is not exactly 4 digits; storage is untouched.
    pub async fn set_pin(&self, pin: &str) -> Result<(), GateError> {
        let pin = Pin::new(pin.to_string()).inspect_err(|_| {
            debug!("Rejected PIN with invalid format");
        })?;

        let _guard = self.op_lock.lock().await;
        self.write_pin(pin).await
    }

    /// Compare `input` with the stored PIN
    ///
    /// Returns `Ok(false)` when no PIN is configured.
    pub async fn verify(&self, input: &str) -> Result<bool, GateError> {
        let _guard = self.op_lock.lock().await;
        self.check(input).await
    }

    /// Replace the PIN after checking the current one
    ///
    /// Returns `Ok(false)` without touching storage when `current` is wrong.
    pub async fn change_pin(&self, current: &str, new: &str) -> Result<bool, GateError> {
        let _guard = self.op_lock.lock().await;

        if !self.check(current).await? {
            info!("PIN change refused, current PIN did not match");
            return Ok(false);
        }

        let pin = Pin::new(new.to_string())?;
        self.write_pin(pin).await?;
        Ok(true)
    }

    /// Turn the lock back on for an already stored PIN
    ///
    /// # Errors
    ///
    /// `NotConfigured` when no PIN is stored; use [`PinGate::set_pin`] instead.
    pub async fn enable(&self) -> Result<(), GateError> {
        let _guard = self.op_lock.lock().await;

        let mut config = self.load().await?.unwrap_or_default();
        if config.pin.is_none() {
            return Err(GateError::NotConfigured);
        }

        config.enabled = true;
        self.save(&config).await?;
        info!("PIN lock enabled");
        Ok(())
    }

    /// Turn the lock off and forget the PIN
    pub async fn disable(&self) -> Result<(), GateError> {
        let _guard = self.op_lock.lock().await;
        self.save(&PinConfiguration::default()).await?;
        info!("PIN lock disabled, stored PIN removed");
        Ok(())
    }

    /// Force the PIN back to `1234` and enable the lock
    pub async fn reset_to_default(&self) -> Result<(), GateError> {
        let _guard = self.op_lock.lock().await;
        self.save(&PinConfiguration::enabled_with(Pin::reset_default()))
            .await?;
        info!("PIN reset to default");
        Ok(())
    }

    /// Remove every key the gate owns, returning to the unconfigured state
    pub async fn clear_all(&self) -> Result<(), GateError> {
        let _guard = self.op_lock.lock().await;
        self.store
            .multi_remove(&[PIN_CONFIG_KEY, LEGACY_PIN_KEY, LEGACY_ENABLED_KEY])
            .await
            .inspect_err(|e| warn!("Failed to clear PIN data: {}", e))?;

        self.epoch.send_modify(|epoch| *epoch += 1);
        info!("PIN data cleared");
        Ok(())
    }

    /// Configuration epoch, incremented by every [`PinGate::clear_all`]
    pub fn epoch(&self) -> u64 {
        *self.epoch.borrow()
    }

    /// Watch the configuration epoch
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.epoch.subscribe()
    }

    async fn check(&self, input: &str) -> Result<bool, GateError> {
        let Some(pin) = self.load().await?.and_then(|c| c.pin) else {
            debug!("verify: no stored PIN");
            return Ok(false);
        };

        let verified = pin.matches(input);
        debug!("verify result: {}", verified);
        Ok(verified)
    }

    async fn write_pin(&self, pin: Pin) -> Result<(), GateError> {
        self.save(&PinConfiguration::enabled_with(pin)).await?;
        info!("PIN set, lock enabled");
        Ok(())
    }

    async fn load(&self) -> Result<Option<PinConfiguration>, StoreError> {
        let Some(raw) = self.store.get(PIN_CONFIG_KEY).await? else {
            return Ok(None);
        };

        let record: StoredPinConfig =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                key: PIN_CONFIG_KEY.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(PinConfiguration::from_record(record)))
    }

    async fn save(&self, config: &PinConfiguration) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&config.to_record()).map_err(|e| {
            StoreError::WriteFailed {
                key: PIN_CONFIG_KEY.to_string(),
                reason: e.to_string(),
            }
        })?;

        self.store
            .set(PIN_CONFIG_KEY, &raw)
            .await
            .inspect_err(|e| warn!("Failed to save PIN configuration: {}", e))
    }
}

impl std::fmt::Debug for PinGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinGate")
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn gate() -> (Arc<MemoryStore>, PinGate) {
        let store = Arc::new(MemoryStore::new());
        let gate = PinGate::new(store.clone());
        (store, gate)
    }

    #[tokio::test]
    async fn test_record_is_single_key() {
        let (store, gate) = gate();
        gate.set_pin("4321").await.unwrap();

        assert_eq!(store.len().await, 1);
        let raw = store.get(PIN_CONFIG_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"enabled":true,"pin":"4321"}"#);
    }

    #[tokio::test]
    async fn test_corrupt_record_fails_open() {
        let (store, gate) = gate();
        store.set(PIN_CONFIG_KEY, "{not json").await.unwrap();

        assert_eq!(gate.status().await, PinStatus::default());
        assert!(matches!(
            gate.verify("1234").await,
            Err(GateError::StoreFailure(StoreError::Corrupt { .. }))
        ));
    }

    #[tokio::test]
    async fn test_clear_all_bumps_epoch() {
        let (_store, gate) = gate();
        let rx = gate.subscribe_epoch();
        assert_eq!(gate.epoch(), 0);

        gate.clear_all().await.unwrap();
        assert_eq!(gate.epoch(), 1);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_epoch() {
        let (store, gate) = gate();
        store.set_failing(true);

        assert!(gate.clear_all().await.is_err());
        assert_eq!(gate.epoch(), 0);
    }
}
