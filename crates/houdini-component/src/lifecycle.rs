//! Cook lifecycle states and the poll timer that drives them
//!
//! A component has at most one outstanding request. The poll timer runs
//! while a request is outstanding or edits are pending and fires every
//! `poll_interval`; each firing is one `AssetComponent::tick`.

use houdini_core::MeshData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where a component is in its instantiate/cook/delete cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CookState {
    /// Nothing in flight
    #[default]
    Idle,
    InstantiationPending,
    CookingPending,
    /// Torn down; terminal
    Deleting,
}

impl CookState {
    pub fn is_pending(&self) -> bool {
        matches!(self, CookState::InstantiationPending | CookState::CookingPending)
    }
}

impl fmt::Display for CookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CookState::Idle => "idle",
            CookState::InstantiationPending => "instantiation-pending",
            CookState::CookingPending => "cooking-pending",
            CookState::Deleting => "deleting",
        };
        write!(f, "{}", name)
    }
}

/// Persisted summary of a component's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentState {
    /// No asset; nothing else is persisted
    Invalid,
    /// Asset referenced, never instantiated
    None,
    /// Asset instantiated and idle
    Instantiated,
    /// Asset instantiated with a request in flight
    BeingCooked,
}

/// Recurring timer advanced by the host's frame clock
#[derive(Debug, Clone, PartialEq)]
pub struct PollTimer {
    interval: Duration,
    elapsed: Duration,
    active: bool,
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            active: false,
        }
    }

    /// Arm the timer; a running timer keeps its phase
    pub fn start(&mut self) {
        if !self.active {
            self.active = true;
            self.elapsed = Duration::ZERO;
        }
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance by `delta`; true if the timer fired
    ///
    /// Fires at most once per call, however large `delta` is.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += delta;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = self.elapsed.saturating_sub(self.interval).min(self.interval);
        true
    }
}

/// Whether the poll timer keeps running after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Result of one poll tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Mesh that replaced the asset's logo preview during this tick
    pub preview: Option<MeshData>,
}

impl TickReport {
    pub fn stopped() -> Self {
        Self {
            outcome: TickOutcome::Stop,
            preview: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_on_interval() {
        let mut timer = PollTimer::new(Duration::from_millis(250));
        assert!(!timer.advance(Duration::from_secs(1)));

        timer.start();
        assert!(!timer.advance(Duration::from_millis(100)));
        assert!(!timer.advance(Duration::from_millis(100)));
        assert!(timer.advance(Duration::from_millis(100)));
        assert!(!timer.advance(Duration::from_millis(100)));
        assert!(timer.advance(Duration::from_millis(100)));
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut timer = PollTimer::new(Duration::from_millis(250));
        timer.start();
        timer.advance(Duration::from_millis(200));
        timer.start();
        assert!(timer.advance(Duration::from_millis(50)));

        timer.stop();
        assert!(!timer.is_active());
        assert!(!timer.advance(Duration::from_millis(500)));
    }

    #[test]
    fn test_large_delta_fires_once() {
        let mut timer = PollTimer::new(Duration::from_millis(250));
        timer.start();
        assert!(timer.advance(Duration::from_secs(10)));
        assert!(timer.advance(Duration::ZERO));
        assert!(!timer.advance(Duration::ZERO));
    }

    #[test]
    fn test_pending_states() {
        assert!(CookState::InstantiationPending.is_pending());
        assert!(CookState::CookingPending.is_pending());
        assert!(!CookState::Idle.is_pending());
        assert!(!CookState::Deleting.is_pending());
        assert_eq!(CookState::CookingPending.to_string(), "cooking-pending");
    }
}
