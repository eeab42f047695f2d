//! One-second countdown task driving `RateLimited -> Idle`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use super::state::{CooldownState, Phase};

pub(super) const TICK: Duration = Duration::from_secs(1);

/// Owned handle to a running countdown. Stopping is synchronous: once
/// [`stop`](Countdown::stop) returns, no further tick mutates state.
pub(super) struct Countdown {
    handle: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
}

impl Countdown {
    /// Spawn the ticker. `state.countdown` must already hold the starting value.
    pub(super) fn start(state: Arc<watch::Sender<CooldownState>>) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                if !tick(&state, &flag) {
                    break;
                }
            }
        });
        Self { handle, stopped }
    }

    pub(super) fn stop(self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

/// Decrement once. Returns false when the countdown is over (or was stopped).
fn tick(state: &watch::Sender<CooldownState>, stopped: &AtomicBool) -> bool {
    let mut running = false;
    state.send_if_modified(|s| {
        // Checked under the channel lock so a concurrent reset always wins.
        if stopped.load(Ordering::SeqCst) {
            return false;
        }
        if s.countdown <= 1 {
            s.countdown = 0;
            s.retry_after_seconds = None;
            if s.phase == Phase::RateLimited {
                s.phase = Phase::Idle;
            }
            tracing::debug!("cooldown finished");
        } else {
            s.countdown -= 1;
            running = true;
        }
        true
    });
    running
}
