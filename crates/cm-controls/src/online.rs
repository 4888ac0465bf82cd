//! Online/offline debounce.
//!
//! States:
//! - **Healthy**: no fault, nothing pending
//! - **Grace**: input went offline, waiting `wait_interval` for it to come back
//! - **Faulted**: grace expired; fault indicator set, offline handler ran once
//!
//! The fault indicator is written only on transitions.

use std::fmt;
use std::time::{Duration, Instant};

use cm_core::{BooleanDisplay, Deadline, NullDisplay};
use tracing::{info, warn};

use crate::error::ControlResult;

type OfflineHandler = Box<dyn FnMut() -> ControlResult<()>>;

/// Debounce state of a tracked signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineState {
    Healthy,
    Grace,
    Faulted,
}

/// Tracks whether a sensor (or other "is online" input) should be treated as faulted.
pub struct OnlineTracker {
    subject: String,
    wait_interval: Duration,
    awaiter: Option<Deadline>,
    fault: bool,
    fault_display: Box<dyn BooleanDisplay>,
    on_offline: Option<OfflineHandler>,
}

impl fmt::Debug for OnlineTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnlineTracker")
            .field("subject", &self.subject)
            .field("wait_interval", &self.wait_interval)
            .field("awaiter", &self.awaiter)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

impl OnlineTracker {
    /// Create a tracker for `subject` with the given grace period.
    pub fn new(subject: impl Into<String>, wait_interval: Duration) -> Self {
        Self {
            subject: subject.into(),
            wait_interval,
            awaiter: None,
            fault: false,
            fault_display: Box::new(NullDisplay),
            on_offline: None,
        }
    }

    /// Mirror the fault flag into a display.
    pub fn with_fault_display(mut self, display: Box<dyn BooleanDisplay>) -> Self {
        self.fault_display = display;
        self
    }

    /// Handler run once on every transition into the fault state.
    pub fn with_offline_handler(
        mut self,
        handler: impl FnMut() -> ControlResult<()> + 'static,
    ) -> Self {
        self.on_offline = Some(Box::new(handler));
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn wait_interval(&self) -> Duration {
        self.wait_interval
    }

    pub fn is_fault(&self) -> bool {
        self.fault
    }

    pub fn state(&self) -> OnlineState {
        if self.fault {
            OnlineState::Faulted
        } else if self.awaiter.is_some() {
            OnlineState::Grace
        } else {
            OnlineState::Healthy
        }
    }

    /// Feed one raw sample using the registered offline handler.
    ///
    /// Returns whether the caller should proceed as if the input is online.
    pub fn is_online(&mut self, online_raw: bool, now: Instant) -> ControlResult<bool> {
        let mut handler = self.on_offline.take();
        let result = self.is_online_with(online_raw, now, || match handler.as_mut() {
            Some(handler) => handler(),
            None => Ok(()),
        });
        self.on_offline = handler;
        result
    }

    /// Feed one raw sample, running `on_offline` if this sample moves the
    /// tracker into the fault state.
    ///
    /// A failing handler aborts the transition: the error is returned, the
    /// fault flag stays clear and the next offline sample starts a new grace
    /// period.
    pub fn is_online_with<E, F>(&mut self, online_raw: bool, now: Instant, on_offline: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        if !online_raw {
            if self.fault {
                return Ok(false);
            }

            let Some(awaiter) = self.awaiter else {
                info!(
                    subject = %self.subject,
                    wait = ?self.wait_interval,
                    "input went offline, waiting for it to resolve itself"
                );
                self.awaiter = Some(Deadline::after(now, self.wait_interval));
                return Ok(true);
            };

            if !awaiter.elapsed(now) {
                return Ok(true);
            }

            self.awaiter = None;
            warn!(
                subject = %self.subject,
                wait = ?self.wait_interval,
                "input did not come back within the grace period"
            );
            on_offline()?;
            self.set_fault(true);
            return Ok(false);
        }

        if self.fault {
            info!(subject = %self.subject, "input came back after the fault state");
            self.set_fault(false);
        }
        if self.awaiter.take().is_some() {
            info!(
                subject = %self.subject,
                wait = ?self.wait_interval,
                "input came back within the grace period"
            );
        }

        Ok(true)
    }

    fn set_fault(&mut self, fault: bool) {
        self.fault = fault;
        self.fault_display.set_on(fault);
    }
}
