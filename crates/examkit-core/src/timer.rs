//! Exam countdown.
//!
//! The countdown is driven by an external one-second tick (the lifecycle's
//! interval, or a test loop). Time-up is terminal: it is reported once and
//! every later tick is a no-op.

use std::fmt;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Seconds left after this tick.
    Running(u32),
    /// The countdown reached zero on this tick.
    TimeUp,
    /// Already expired; nothing happened.
    Halted,
}

type TimeUpHook = Box<dyn FnOnce() + Send>;

pub struct Countdown {
    remaining: u32,
    expired: bool,
    on_time_up: Option<TimeUpHook>,
}

impl Countdown {
    pub fn from_secs(secs: u32) -> Self {
        Self {
            remaining: secs,
            expired: false,
            on_time_up: None,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self::from_secs(minutes.saturating_mul(60))
    }

    /// Callback run when the countdown reaches zero. It runs at most once.
    pub fn on_time_up(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_time_up = Some(Box::new(hook));
        self
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.expired {
            return TickOutcome::Halted;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickOutcome::Running(self.remaining);
        }
        self.expired = true;
        if let Some(hook) = self.on_time_up.take() {
            hook();
        }
        TickOutcome::TimeUp
    }

    /// `MM:SS` for display.
    pub fn clock(&self) -> Clock {
        Clock(self.remaining)
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("remaining", &self.remaining)
            .field("expired", &self.expired)
            .field("on_time_up", &self.on_time_up.is_some())
            .finish()
    }
}

/// Seconds formatted as `MM:SS`; minutes are not wrapped into hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock(pub u32);

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}
