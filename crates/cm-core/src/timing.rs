//! Monotonic time helpers.
//!
//! Debounce windows are deadlines compared against a caller-supplied `now`,
//! never separate timers. Passing `now` explicitly keeps every state machine
//! deterministic under test.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A wait armed at some instant; over once `wait` has passed since then.
///
/// Stores the arming instant rather than `armed + wait`, so any wait up to
/// [`Duration::MAX`] is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    armed: Instant,
    wait: Duration,
}

impl Deadline {
    /// Arm a deadline `wait` after `now`.
    pub fn after(now: Instant, wait: Duration) -> Self {
        Self { armed: now, wait }
    }

    /// The deadline as an instant, `None` if it lies beyond what `Instant` can hold.
    pub fn at(&self) -> Option<Instant> {
        self.armed.checked_add(self.wait)
    }

    /// True once `now` has reached the deadline.
    pub fn elapsed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.armed) >= self.wait
    }

    /// Time left until the deadline, zero when elapsed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.wait
            .saturating_sub(now.saturating_duration_since(self.armed))
    }
}

/// Source of monotonic time.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Block until `duration` has passed on this clock.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock; sleeping advances it instantly.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_elapses_at_target() {
        let t0 = Instant::now();
        let deadline = Deadline::after(t0, Duration::from_secs(5));

        assert!(!deadline.elapsed(t0));
        assert!(!deadline.elapsed(t0 + Duration::from_millis(4999)));
        assert!(deadline.elapsed(t0 + Duration::from_secs(5)));
        assert!(deadline.elapsed(t0 + Duration::from_secs(6)));
    }

    #[test]
    fn manual_clock_advances_on_sleep() {
        let t0 = Instant::now();
        let clock = ManualClock::new(t0);
        clock.sleep(Duration::from_secs(3));
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now(), t0 + Duration::from_millis(3500));
    }

    #[test]
    fn deadline_remaining_saturates() {
        let t0 = Instant::now();
        let deadline = Deadline::after(t0, Duration::from_secs(2));
        assert_eq!(deadline.remaining(t0), Duration::from_secs(2));
        assert_eq!(deadline.remaining(t0 + Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn huge_wait_never_overflows() {
        let t0 = Instant::now();
        let deadline = Deadline::after(t0, Duration::MAX);
        let later = t0 + Duration::from_secs(365 * 24 * 3600);

        assert!(!deadline.elapsed(later));
        assert!(deadline.remaining(later) > Duration::from_secs(1_000_000_000));
        assert_eq!(deadline.at(), None);
    }
}
