//! Exponential backoff gate.
//!
//! Not used by the regulation path, which retries implicitly once per tick.

use std::time::{Duration, Instant};

use cm_core::Deadline;

/// Decides whether a retryable action should fire now.
///
/// The first fault waits `start_delay`; every further fault before a reset
/// multiplies the delay by `increase_factor`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryTracker {
    start_delay: Duration,
    increase_factor: u32,
    max_delay: Duration,
    cur_delay: Duration,
    awaiter: Option<Deadline>,
}

impl Default for RetryTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 2, Duration::from_secs(16))
    }
}

impl RetryTracker {
    pub fn new(start_delay: Duration, increase_factor: u32, max_delay: Duration) -> Self {
        Self {
            start_delay,
            increase_factor,
            max_delay,
            cur_delay: Duration::ZERO,
            awaiter: None,
        }
    }

    pub fn is_fault(&self) -> bool {
        self.awaiter.is_some()
    }

    /// Delay armed by the last fault, zero when healthy.
    pub fn cur_delay(&self) -> Duration {
        self.cur_delay
    }

    /// Record a failed attempt at `now`.
    pub fn set_fault(&mut self, now: Instant) {
        self.cur_delay = if self.awaiter.is_some() {
            (self.cur_delay * self.increase_factor).min(self.max_delay)
        } else {
            self.start_delay
        };
        self.awaiter = Some(Deadline::after(now, self.cur_delay));
    }

    /// Record a successful attempt.
    pub fn reset_fault(&mut self) {
        self.awaiter = None;
        self.cur_delay = Duration::ZERO;
    }

    /// True when no fault is pending or its backoff has elapsed.
    pub fn should_try(&self, now: Instant) -> bool {
        self.awaiter.is_none_or(|awaiter| awaiter.elapsed(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_tracker_always_tries() {
        let tracker = RetryTracker::default();
        assert!(!tracker.is_fault());
        assert!(tracker.should_try(Instant::now()));
        assert_eq!(tracker.cur_delay(), Duration::ZERO);
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let mut tracker = RetryTracker::default();
        let t0 = Instant::now();

        let mut delays = Vec::new();
        for _ in 0..7 {
            tracker.set_fault(t0);
            delays.push(tracker.cur_delay().as_secs());
        }
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 16, 16]);
    }

    #[test]
    fn should_try_waits_for_backoff() {
        let mut tracker = RetryTracker::default();
        let t0 = Instant::now();

        tracker.set_fault(t0);
        tracker.set_fault(t0);
        assert!(!tracker.should_try(t0 + Duration::from_millis(1999)));
        assert!(tracker.should_try(t0 + Duration::from_secs(2)));
        assert!(tracker.is_fault());

        tracker.reset_fault();
        assert!(!tracker.is_fault());
        assert_eq!(tracker.cur_delay(), Duration::ZERO);

        // After a reset the ladder starts over
        tracker.set_fault(t0);
        assert_eq!(tracker.cur_delay(), Duration::from_secs(1));
    }
}
