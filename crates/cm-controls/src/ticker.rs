//! Fixed-interval tick schedule.
//!
//! The ticker does not own a thread. A driver asks it whether a tick is due
//! and runs the tick body to completion before asking again, so at most one
//! tick is ever in flight.

use std::time::{Duration, Instant};

/// Schedule for a periodic tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    /// Tick period.
    interval: Duration,
    /// Start of the current period; the next tick is due one interval later.
    /// `None` while stopped.
    anchor: Option<Instant>,
}

impl Ticker {
    /// Create a stopped ticker.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            anchor: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    /// Start ticking; the first tick is due one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.anchor = Some(now);
    }

    pub fn stop(&mut self) {
        self.anchor = None;
    }

    /// Returns `true` if a tick should run now, and schedules the next one.
    ///
    /// A late poll fires once; missed ticks are not replayed and the next tick
    /// is deferred to a full interval after the late one.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        let since = now.saturating_duration_since(anchor);
        if since < self.interval {
            return false;
        }

        // `anchor + interval` is at most `now` here, so it cannot overflow.
        let on_schedule = since - self.interval < self.interval;
        self.anchor = Some(if on_schedule { anchor + self.interval } else { now });
        true
    }

    /// Time until the next tick, `None` while stopped.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.anchor
            .map(|anchor| self.interval.saturating_sub(now.saturating_duration_since(anchor)))
    }
}
