//! One-shot auto-off countdown.
//!
//! The timer is polled rather than event driven: the control loop calls
//! [`AutoOffTimer::poll`] on every tick and performs the switch-off itself when
//! the poll reports expiry.

use core::time::Duration;

use crate::time::MonotonicInstant;

/// Countdown state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState<I> {
    Disarmed,
    Armed { duration: Duration, armed_at: I },
}

/// Polled auto-off timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoOffTimer<I> {
    state: TimerState<I>,
}

impl<I> AutoOffTimer<I>
where
    I: MonotonicInstant,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TimerState::Disarmed,
        }
    }

    /// Starts a countdown, replacing any countdown already running.
    ///
    /// Returns `true` when an earlier countdown was discarded.
    pub fn arm(&mut self, duration: Duration, now: I) -> bool {
        let replaced = self.is_armed();
        self.state = TimerState::Armed {
            duration,
            armed_at: now,
        };
        replaced
    }

    /// Cancels the countdown. Returns `true` if one was running.
    pub fn disarm(&mut self) -> bool {
        let was_armed = self.is_armed();
        self.state = TimerState::Disarmed;
        was_armed
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    #[must_use]
    pub fn state(&self) -> TimerState<I> {
        self.state
    }

    /// Time left before expiry, or `None` while disarmed.
    #[must_use]
    pub fn remaining(&self, now: I) -> Option<Duration> {
        match self.state {
            TimerState::Disarmed => None,
            TimerState::Armed { duration, armed_at } => {
                Some(duration.saturating_sub(now.saturating_duration_since(armed_at)))
            }
        }
    }

    /// Checks for expiry. Fires at most once per arming and disarms on firing.
    pub fn poll(&mut self, now: I) -> bool {
        match self.state {
            TimerState::Armed { duration, armed_at }
                if now.saturating_duration_since(armed_at) >= duration =>
            {
                self.state = TimerState::Disarmed;
                true
            }
            _ => false,
        }
    }
}

impl<I> Default for AutoOffTimer<I>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new()
    }
}
