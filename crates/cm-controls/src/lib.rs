//! Control primitives for the climate manager.
//!
//! This crate holds the leaf state machines of the control loop. None of them
//! own a timer: each takes the current monotonic time as an argument and
//! compares it against stored deadlines, so a single tick driver can advance
//! all of them in one pass.
//!
//! # Components
//!
//! - **Regulators**: PID with a rolling output average, and two-point hysteresis
//! - **OnlineTracker**: debounces a flapping "is online" signal into a fault flag
//! - **RetryTracker**: exponential backoff gate for retryable actions
//! - **ZoneWindow**: window-open detector with a closed-dwell warmup
//! - **Ticker**: fixed-interval firing schedule with a single tick in flight

pub mod error;
pub mod online;
pub mod pid;
pub mod regulator;
pub mod retry;
pub mod ticker;
pub mod window;

pub use error::{ControlError, ControlResult};
pub use online::{OnlineState, OnlineTracker};
pub use pid::{Pid, PidComponents, PidState};
pub use regulator::{
    AnyRegulator, CoefficientsChanged, HysteresisRegulator, PidRegulator, PidSettings, Regulator,
};
pub use retry::RetryTracker;
pub use ticker::Ticker;
pub use window::{WINDOW_WARMUP, ZoneWindow};
