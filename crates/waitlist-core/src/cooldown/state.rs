//! Observable state of one join interaction.

/// Where the interaction is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Success,
    Failed,
    /// Counting down a server-imposed cooldown; back to `Idle` at zero.
    RateLimited,
}

/// Snapshot published to subscribers after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownState {
    pub phase: Phase,
    pub is_loading: bool,
    /// User-facing message of the last failure (validation, cooldown or API).
    pub error: Option<String>,
    pub is_success: bool,
    /// Cooldown length that started the current countdown.
    pub retry_after_seconds: Option<u64>,
    /// Seconds left before a new submit is accepted.
    pub countdown: u64,
}

impl CooldownState {
    /// True when a submit would reach the network (given a valid email).
    pub fn can_submit(&self) -> bool {
        !self.is_loading && self.countdown == 0
    }

    /// Phase to show when a submit was refused locally.
    pub(super) fn settled_phase(&self) -> Phase {
        if self.is_loading {
            Phase::Submitting
        } else if self.countdown > 0 {
            Phase::RateLimited
        } else {
            Phase::Idle
        }
    }
}
