//! Window-open override.

use std::fmt;
use std::time::{Duration, Instant};

use cm_core::{BooleanDisplay, Deadline, EntityRef, NullDisplay, StateReader};

/// Time a window must stay closed before heating resumes.
pub const WINDOW_WARMUP: Duration = Duration::from_secs(5 * 60);

/// Debounced window detector for one zone.
///
/// Heating is permitted only while every window is closed and, after any
/// opening, once the windows have stayed closed for the whole warmup.
pub struct ZoneWindow {
    sensors: Vec<EntityRef>,
    warmup: Duration,
    last_open: bool,
    warmup_deadline: Option<Deadline>,
    display: Box<dyn BooleanDisplay>,
}

impl fmt::Debug for ZoneWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneWindow")
            .field("sensors", &self.sensors)
            .field("warmup", &self.warmup)
            .field("last_open", &self.last_open)
            .field("warmup_deadline", &self.warmup_deadline)
            .finish_non_exhaustive()
    }
}

impl ZoneWindow {
    pub fn new(sensors: Vec<EntityRef>) -> Self {
        Self {
            sensors,
            warmup: WINDOW_WARMUP,
            last_open: false,
            warmup_deadline: None,
            display: Box::new(NullDisplay),
        }
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Mirror the window-open state into a display.
    pub fn with_display(mut self, display: Box<dyn BooleanDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn sensors(&self) -> &[EntityRef] {
        &self.sensors
    }

    /// Window state seen on the last [`Self::should_heat`] call.
    pub fn last_open(&self) -> bool {
        self.last_open
    }

    /// True while a closed window is still waiting out its warmup.
    pub fn is_warming_up(&self) -> bool {
        self.warmup_deadline.is_some()
    }

    /// Any configured window open. Missing or unreadable sensors count as closed.
    pub fn window_open(&self, states: &dyn StateReader) -> bool {
        self.sensors
            .iter()
            .any(|sensor| states.read_bool(sensor).unwrap_or(false))
    }

    /// Whether the zone may heat, advancing the warmup state machine.
    pub fn should_heat(&mut self, states: &dyn StateReader, now: Instant) -> bool {
        let window_open = self.window_open(states);

        if self.last_open == window_open {
            if !window_open && self.warmup_deadline.is_some_and(|d| d.elapsed(now)) {
                self.warmup_deadline = None;
            }
        } else {
            self.last_open = window_open;
            self.warmup_deadline = if window_open {
                None
            } else {
                Some(Deadline::after(now, self.warmup))
            };
            self.display.set_on(window_open);
        }

        !window_open && self.warmup_deadline.is_none()
    }
}
