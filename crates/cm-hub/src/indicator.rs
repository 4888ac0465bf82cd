//! Values mirrored into host displays.

use std::fmt;

use cm_core::{BooleanDisplay, NumericDisplay};

/// Binary indicator that writes its display only when the value changes.
pub struct BinaryIndicator {
    display: Box<dyn BooleanDisplay>,
    is_on: bool,
}

impl fmt::Debug for BinaryIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryIndicator")
            .field("is_on", &self.is_on)
            .finish_non_exhaustive()
    }
}

impl BinaryIndicator {
    /// Wrap a display and publish the initial `false`.
    pub fn new(mut display: Box<dyn BooleanDisplay>) -> Self {
        display.set_on(false);
        Self {
            display,
            is_on: false,
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns `true` if the value changed.
    pub fn set(&mut self, on: bool) -> bool {
        if self.is_on == on {
            return false;
        }
        self.is_on = on;
        self.display.set_on(on);
        true
    }
}

/// Numeric measurement published on every update.
pub struct NumericIndicator {
    display: Box<dyn NumericDisplay>,
    value: Option<f64>,
}

impl fmt::Debug for NumericIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericIndicator")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl NumericIndicator {
    pub fn new(display: Box<dyn NumericDisplay>) -> Self {
        Self {
            display,
            value: None,
        }
    }

    /// Last published value.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn set(&mut self, value: f64) {
        self.value = Some(value);
        self.display.set_value(value);
    }
}
