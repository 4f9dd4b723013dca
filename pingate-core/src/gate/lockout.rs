//! Launch lock screen with attempt limiting
//!
//! A [`LockScreen`] is one presentation of the PIN prompt. It counts
//! consecutive failures and, once the policy limit is reached, refuses
//! input for a fixed window without touching the store. The counter lives
//! in memory only and starts at zero for every new screen.

use super::PinGate;
use crate::error::GateError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Attempt limit and lockout window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lockout_duration: Duration,
}

impl LockoutPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(30);

    /// Create a policy; a zero attempt limit is raised to one
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            lockout_duration,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn lockout_duration(&self) -> Duration {
        self.lockout_duration
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_LOCKOUT)
    }
}

/// Input state of the lock screen, published on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Accepting input
    Ready { failed_attempts: u32 },
    /// Input refused until the given instant
    LockedOut { until: Instant },
}

/// Result of one submitted PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// PIN matched; the counter is back to zero
    Unlocked,
    /// PIN did not match
    Denied { attempts_remaining: u32 },
    /// PIN did not match and this attempt used up the limit
    LockedOut { retry_after: Duration },
}

#[derive(Debug, Default)]
struct Attempts {
    failed: u32,
    locked_until: Option<Instant>,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl Attempts {
    fn clear(&mut self) {
        self.failed = 0;
        self.locked_until = None;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Reset from inside the expiry task, which must not abort itself
    fn expire(&mut self) {
        self.timer.take();
        self.failed = 0;
        self.locked_until = None;
    }
}

#[derive(Debug)]
struct Shared {
    attempts: Mutex<Attempts>,
    state: watch::Sender<LockState>,
}

impl Shared {
    fn attempts(&self) -> MutexGuard<'_, Attempts> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: LockState) {
        self.state.send_replace(state);
    }
}

/// One presentation of the launch PIN prompt
#[derive(Debug)]
pub struct LockScreen {
    gate: Arc<PinGate>,
    policy: LockoutPolicy,
    shared: Arc<Shared>,
}

impl LockScreen {
    /// Present a fresh lock screen with a zeroed counter
    pub fn new(gate: Arc<PinGate>, policy: LockoutPolicy) -> Self {
        let (state, _) = watch::channel(LockState::Ready { failed_attempts: 0 });
        let attempts = Attempts {
            epoch: gate.epoch(),
            ..Attempts::default()
        };

        Self {
            gate,
            policy,
            shared: Arc::new(Shared {
                attempts: Mutex::new(attempts),
                state,
            }),
        }
    }

    /// Submit an entered PIN
    ///
    /// While locked out this fails with `GateError::LockedOut` and the
    /// store is not consulted. Store errors are returned as-is and do not
    /// count as failed attempts.
    pub async fn submit(&self, input: &str) -> Result<AttemptOutcome, GateError> {
        self.admit(Instant::now())?;
        let verified = self.gate.verify(input).await?;
        Ok(self.record(verified, Instant::now()))
    }

    /// Current input state
    pub fn state(&self) -> LockState {
        self.sync_epoch(&mut self.shared.attempts());
        *self.shared.state.borrow()
    }

    /// Watch input state changes, e.g. to drive a countdown
    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.shared.state.subscribe()
    }

    /// Consecutive failures since the last success or lockout expiry
    pub fn failed_attempts(&self) -> u32 {
        let mut attempts = self.shared.attempts();
        self.sync_epoch(&mut attempts);
        attempts.failed
    }

    /// Time left in the current lockout, if any
    pub fn retry_after(&self) -> Option<Duration> {
        let now = Instant::now();
        let mut attempts = self.shared.attempts();
        self.sync_epoch(&mut attempts);
        attempts
            .locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Drop counter and lockout if the configuration was cleared since the
    /// last look
    fn sync_epoch(&self, attempts: &mut Attempts) {
        let epoch = self.gate.epoch();
        if attempts.epoch != epoch {
            debug!("PIN configuration was cleared, resetting attempt counter");
            attempts.clear();
            attempts.epoch = epoch;
            self.shared.publish(LockState::Ready { failed_attempts: 0 });
        }
    }

    fn admit(&self, now: Instant) -> Result<(), GateError> {
        let mut attempts = self.shared.attempts();
        self.sync_epoch(&mut attempts);

        if let Some(until) = attempts.locked_until {
            if now < until {
                return Err(GateError::LockedOut {
                    retry_after_secs: ceil_secs(until - now),
                });
            }
            debug!("Lockout window elapsed");
            attempts.clear();
            self.shared.publish(LockState::Ready { failed_attempts: 0 });
        }

        Ok(())
    }

    fn record(&self, verified: bool, now: Instant) -> AttemptOutcome {
        let mut attempts = self.shared.attempts();

        if verified {
            attempts.clear();
            self.shared.publish(LockState::Ready { failed_attempts: 0 });
            return AttemptOutcome::Unlocked;
        }

        // Another submission may have locked the screen while this one was verifying
        if let Some(until) = attempts.locked_until.filter(|until| *until > now) {
            return AttemptOutcome::LockedOut {
                retry_after: until - now,
            };
        }

        attempts.failed += 1;
        if attempts.failed < self.policy.max_attempts {
            self.shared.publish(LockState::Ready {
                failed_attempts: attempts.failed,
            });
            return AttemptOutcome::Denied {
                attempts_remaining: self.policy.max_attempts - attempts.failed,
            };
        }

        let until = now + self.policy.lockout_duration;
        warn!(
            "{} failed PIN attempts, locking input for {}s",
            attempts.failed,
            self.policy.lockout_duration.as_secs()
        );
        attempts.locked_until = Some(until);
        if let Some(previous) = attempts.timer.replace(self.spawn_expiry(until)) {
            previous.abort();
        }
        self.shared.publish(LockState::LockedOut { until });

        AttemptOutcome::LockedOut {
            retry_after: self.policy.lockout_duration,
        }
    }

    /// Re-open input when the window ends or the configuration is cleared,
    /// whichever comes first
    fn spawn_expiry(&self, until: Instant) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let mut epoch = self.gate.subscribe_epoch();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                changed = epoch.changed() => {
                    let mut attempts = shared.attempts();
                    if changed.is_ok() && attempts.locked_until == Some(until) {
                        attempts.expire();
                        attempts.epoch = *epoch.borrow_and_update();
                        shared.publish(LockState::Ready { failed_attempts: 0 });
                    }
                    debug!("PIN configuration cleared, dropping lockout timer");
                }
                _ = tokio::time::sleep_until(until) => {
                    let mut attempts = shared.attempts();
                    if attempts.locked_until == Some(until) {
                        attempts.expire();
                        shared.publish(LockState::Ready { failed_attempts: 0 });
                        debug!("Lockout expired, accepting input");
                    }
                }
            }
        })
    }
}

impl Drop for LockScreen {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.attempts().timer.take() {
            timer.abort();
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_millis().div_ceil(1000) as u64
}
