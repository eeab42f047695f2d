//! Cooldown controller: state machine for one "join waitlist" interaction.
//!
//! `Idle -> Submitting -> {Success | Failed | RateLimited}`; `RateLimited`
//! returns to `Idle` when its one-second countdown reaches zero. Submits are
//! refused locally on a bad email or while the countdown runs. `reset()` and
//! drop cancel the in-flight request and stop the countdown; a result that
//! arrives after that is discarded (generation check).

mod error;
mod state;
mod ticker;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::control::CancelToken;
use crate::retry::{classify, ApiError};
use crate::transport::Transport;
use crate::waitlist::{validate_email, JoinResponse, WaitlistClient};

pub use error::JoinError;
pub use state::{CooldownState, Phase};

use ticker::Countdown;

/// Cooldown applied after a 429 without a usable `retry-after`.
pub const DEFAULT_RATE_LIMIT_FALLBACK_SECS: u64 = 5;

#[derive(Default)]
struct Slots {
    /// Bumped on every submit and reset; a finishing request must still match it.
    generation: u64,
    inflight: Option<CancelToken>,
    countdown: Option<Countdown>,
}

impl Slots {
    fn cancel_inflight(&mut self) {
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.stop();
        }
    }
}

/// Owns the state of one interaction. Independent controllers may share a client.
pub struct CooldownController<T> {
    client: Arc<WaitlistClient<T>>,
    state: Arc<watch::Sender<CooldownState>>,
    slots: Mutex<Slots>,
    fallback_cooldown_secs: u64,
}

impl<T> CooldownController<T> {
    fn slots(&self) -> MutexGuard<'_, Slots> {
        // A panic while holding the lock leaves Slots consistent; keep going.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state snapshot.
    pub fn state(&self) -> CooldownState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change (re-render hook).
    pub fn subscribe(&self) -> watch::Receiver<CooldownState> {
        self.state.subscribe()
    }

    pub fn client(&self) -> &Arc<WaitlistClient<T>> {
        &self.client
    }

    /// Clear every field, stop the countdown and cancel any in-flight request.
    pub fn reset(&self) {
        let mut slots = self.slots();
        slots.generation += 1;
        slots.cancel_inflight();
        slots.stop_countdown();
        self.state.send_replace(CooldownState::default());
        tracing::debug!("cooldown controller reset");
    }

    fn refuse(&self, message: String) {
        self.state.send_modify(|s| {
            s.error = Some(message);
            s.is_success = false;
            s.phase = s.settled_phase();
        });
    }
}

impl<T: Transport> CooldownController<T> {
    pub fn new(client: Arc<WaitlistClient<T>>) -> Self {
        Self {
            client,
            state: Arc::new(watch::Sender::new(CooldownState::default())),
            slots: Mutex::new(Slots::default()),
            fallback_cooldown_secs: DEFAULT_RATE_LIMIT_FALLBACK_SECS,
        }
    }

    /// Cooldown used when a 429 carries no usable `retry-after`; 0 disables it.
    pub fn with_fallback_cooldown(mut self, secs: u64) -> Self {
        self.fallback_cooldown_secs = secs;
        self
    }

    /// Validate, check the cooldown, then join. Failures are recorded in state
    /// and returned; this layer never retries.
    pub async fn submit(&self, email: &str) -> Result<JoinResponse, JoinError> {
        let validation = validate_email(email);
        if let Some(msg) = validation.error {
            self.refuse(msg.to_string());
            return Err(JoinError::Validation(msg));
        }

        let remaining_secs = self.state.borrow().countdown;
        if remaining_secs > 0 {
            let err = JoinError::CoolingDown { remaining_secs };
            self.refuse(err.to_string());
            return Err(err);
        }

        let (generation, cancel) = self.begin();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Canceled),
            res = self.client.join_with_cancel(email, &cancel) => res,
        };
        self.finish(generation, outcome)
    }

    fn begin(&self) -> (u64, CancelToken) {
        let mut slots = self.slots();
        // A newer submit supersedes whatever is still in flight.
        slots.cancel_inflight();
        slots.generation += 1;
        let cancel = CancelToken::new();
        slots.inflight = Some(cancel.clone());
        self.state.send_modify(|s| {
            s.phase = Phase::Submitting;
            s.is_loading = true;
            s.error = None;
            s.is_success = false;
            s.retry_after_seconds = None;
        });
        (slots.generation, cancel)
    }

    fn finish(
        &self,
        generation: u64,
        outcome: Result<JoinResponse, ApiError>,
    ) -> Result<JoinResponse, JoinError> {
        let mut slots = self.slots();
        if slots.generation != generation {
            tracing::debug!(generation, "discarding result of canceled request");
            return Err(JoinError::Canceled);
        }
        slots.inflight = None;

        let err = match outcome {
            Ok(response) => {
                self.state.send_modify(|s| {
                    s.phase = Phase::Success;
                    s.is_loading = false;
                    s.error = None;
                    s.is_success = true;
                });
                return Ok(response);
            }
            Err(ApiError::Canceled) => {
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.phase = s.settled_phase();
                });
                return Err(JoinError::Canceled);
            }
            Err(e) => e,
        };

        let info = classify(&err);
        // An explicit `retry-after` is authoritative, even 0; the fallback only
        // covers a 429 without a usable hint.
        let cooldown = if info.is_rate_limit_error {
            info.retry_after_seconds
                .unwrap_or(self.fallback_cooldown_secs)
        } else {
            0
        };
        let cooldown = Some(cooldown).filter(|secs| *secs > 0);

        slots.stop_countdown();
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_success = false;
            s.error = Some(info.message.clone());
            match cooldown {
                Some(secs) => {
                    s.phase = Phase::RateLimited;
                    s.retry_after_seconds = Some(secs);
                    s.countdown = secs;
                }
                None => s.phase = Phase::Failed,
            }
        });
        if let Some(secs) = cooldown {
            tracing::info!(secs, "rate limited; starting cooldown");
            slots.countdown = Some(Countdown::start(Arc::clone(&self.state)));
        }

        Err(JoinError::Api { info, source: err })
    }
}

impl<T> Drop for CooldownController<T> {
    fn drop(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(|e| e.into_inner());
        slots.generation += 1;
        slots.cancel_inflight();
        slots.stop_countdown();
    }
}

#[cfg(test)]
mod tests;
