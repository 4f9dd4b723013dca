//! Type definitions and wrappers for PIN handling
//!
//! The PIN is wrapped with the secrecy crate so it never shows up in logs
//! or debug output, even though it is persisted as plain text.

use crate::error::GateError;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Number of digits in a PIN
pub const PIN_LENGTH: usize = 4;

/// PIN written by [`Pin::reset_default`]
pub const DEFAULT_PIN: &str = "1234";

/// Store key holding the serialized [`PinConfiguration`]
pub const PIN_CONFIG_KEY: &str = "@pin_config";

/// Store key of the PIN value in the older two-key layout
pub const LEGACY_PIN_KEY: &str = "@app_pin";

/// Store key of the enabled flag (`"true"`/`"false"`) in the older two-key layout
pub const LEGACY_ENABLED_KEY: &str = "@pin_enabled";

/// Wrapper for the 4-digit app lock PIN
#[derive(Clone, Debug)]
pub struct Pin(Secret<String>);

impl Pin {
    /// Create a new PIN from a string, validating the format
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidFormat` if the PIN is not exactly 4 ASCII digits
    pub fn new(pin: String) -> Result<Self, GateError> {
        if pin.len() != PIN_LENGTH {
            return Err(GateError::InvalidFormat);
        }

        if !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(GateError::InvalidFormat);
        }

        Ok(Self(Secret::new(pin)))
    }

    /// The recovery PIN `"1234"`, built without validation
    pub fn reset_default() -> Self {
        Self(Secret::new(DEFAULT_PIN.to_string()))
    }

    /// Wrap a value read back from storage as-is
    pub(crate) fn from_stored(pin: String) -> Self {
        Self(Secret::new(pin))
    }

    /// Exact, case-sensitive comparison against user input
    pub fn matches(&self, input: &str) -> bool {
        self.expose() == input
    }

    /// Expose the PIN value (use with caution!)
    ///
    /// Only needed when writing the PIN to storage.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Persisted PIN configuration, one per installation
#[derive(Clone, Debug, Default)]
pub struct PinConfiguration {
    /// Whether the gate is active at app launch
    pub enabled: bool,
    /// The configured PIN; `None` means never configured
    pub pin: Option<Pin>,
}

impl PinConfiguration {
    /// Configuration written by a successful `set_pin`
    pub fn enabled_with(pin: Pin) -> Self {
        Self {
            enabled: true,
            pin: Some(pin),
        }
    }

    /// True when `enabled` is set without a PIN to back it
    pub fn is_inconsistent(&self) -> bool {
        self.enabled && self.pin.is_none()
    }

    /// Status as reported to the UI; a missing PIN wins over a stale flag
    pub fn status(&self) -> PinStatus {
        PinStatus {
            enabled: self.enabled && self.pin.is_some(),
            is_set: self.pin.is_some(),
        }
    }

    pub(crate) fn to_record(&self) -> StoredPinConfig {
        StoredPinConfig {
            enabled: self.enabled,
            pin: self.pin.as_ref().map(|p| p.expose().to_string()),
        }
    }

    pub(crate) fn from_record(record: StoredPinConfig) -> Self {
        Self {
            enabled: record.enabled,
            pin: record.pin.map(Pin::from_stored),
        }
    }
}

/// On-disk shape of [`PinConfiguration`], written in a single store call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredPinConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

/// PIN status reported to the settings screen and launch gate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinStatus {
    /// Whether the lock screen should be shown at launch
    pub enabled: bool,
    /// Whether a PIN has been configured
    pub is_set: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_format() {
        assert!(Pin::new("0000".to_string()).is_ok());
        assert!(Pin::new("9876".to_string()).is_ok());

        for bad in ["", "123", "12345", "12a4", " 123", "１２３４"] {
            assert!(
                matches!(Pin::new(bad.to_string()), Err(GateError::InvalidFormat)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin = Pin::new("4321".to_string()).unwrap();
        assert!(!format!("{:?}", pin).contains("4321"));
    }

    #[test]
    fn test_pin_matches_exactly() {
        let pin = Pin::new("0420".to_string()).unwrap();
        assert!(pin.matches("0420"));
        assert!(!pin.matches("420"));
        assert!(!pin.matches("0420 "));
    }

    #[test]
    fn test_status_prefers_missing_pin() {
        let stale = PinConfiguration {
            enabled: true,
            pin: None,
        };
        assert!(stale.is_inconsistent());
        assert_eq!(
            stale.status(),
            PinStatus {
                enabled: false,
                is_set: false
            }
        );
    }

    #[test]
    fn test_record_roundtrip_keeps_pin() {
        let config = PinConfiguration::enabled_with(Pin::reset_default());
        let restored = PinConfiguration::from_record(config.to_record());
        assert!(restored.enabled);
        assert_eq!(restored.pin.unwrap().expose(), DEFAULT_PIN);
    }
}
