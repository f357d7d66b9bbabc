//! Scheduler module - tick sources on a virtual clock
//!
//! The attempt runs two independent periodic triggers (item emission and the
//! countdown) plus one one-shot timer per item in flight. Rather than owning
//! OS timers, each trigger is a [`Ticker`] that reports how long until it is
//! due; [`crate::GameState::advance`] steps the clock from one due point to the
//! next so interleaving is exact no matter how coarse the caller's frames are.
//!
//! Anything deferred across a yield point (a ticket handed to the player, a
//! command queued in the runtime) carries a [`Generation`]. A value stamped with
//! an older generation belongs to a finished attempt and must not mutate the
//! current one.

use serde::Serialize;

/// Monotonic attempt tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Generation(pub u32);

impl Generation {
    pub fn next(self) -> Generation {
        Generation(self.0.wrapping_add(1))
    }
}

/// Periodic trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    interval_ms: u32,
    until_next_ms: u32,
    stopped: bool,
}

impl Ticker {
    /// A ticker whose first fire is one full interval away.
    pub fn new(interval_ms: u32) -> Self {
        let interval_ms = interval_ms.max(1);
        Self {
            interval_ms,
            until_next_ms: interval_ms,
            stopped: false,
        }
    }

    /// A ticker that never fires until restarted.
    pub fn stopped(interval_ms: u32) -> Self {
        Self {
            stopped: true,
            ..Self::new(interval_ms)
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Milliseconds until the next fire, or `None` when stopped.
    pub fn until_next(&self) -> Option<u32> {
        if self.stopped {
            None
        } else {
            Some(self.until_next_ms)
        }
    }

    /// Advance by `elapsed_ms`; returns how many times the ticker fired.
    ///
    /// Callers stepping event-to-event pass at most `until_next()` and so see
    /// 0 or 1. Larger steps are still accounted for.
    pub fn advance(&mut self, elapsed_ms: u32) -> u32 {
        if self.stopped {
            return 0;
        }
        if elapsed_ms < self.until_next_ms {
            self.until_next_ms -= elapsed_ms;
            return 0;
        }
        let past_first = elapsed_ms - self.until_next_ms;
        let fires = 1 + past_first / self.interval_ms;
        self.until_next_ms = self.interval_ms - past_first % self.interval_ms;
        fires
    }

    /// Restart from a full interval.
    pub fn restart(&mut self) {
        self.stopped = false;
        self.until_next_ms = self.interval_ms;
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
