//! Contracts with the host environment.
//!
//! The control core only needs to read sensor values, publish display values
//! and invoke named actuator commands. Everything else (entity registration,
//! persistence, transport) lives on the host side of these traits.

use core::fmt;
use core::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::ids::{DeviceInfo, EntityRef};

/// Operating mode of a climate control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HvacMode {
    Off,
    #[default]
    Heat,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            _ => Err(CoreError::InvalidArg {
                what: "hvac mode must be 'off' or 'heat'",
            }),
        }
    }
}

const BOOL_TRUE: [&str; 4] = ["y", "yes", "true", "on"];
const BOOL_FALSE: [&str; 4] = ["n", "no", "false", "off"];

/// Parse a raw host state as a boolean.
///
/// Accepts `y`/`yes`/`true`/`on` and `n`/`no`/`false`/`off`, case-insensitive.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let value = raw.trim().to_ascii_lowercase();
    if BOOL_TRUE.contains(&value.as_str()) {
        Some(true)
    } else if BOOL_FALSE.contains(&value.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Parse a raw host state as a finite number.
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read access to host entity states.
///
/// Both reads return `None` when the entity is missing, unavailable or its
/// state cannot be parsed. Implementations must not fail.
pub trait StateReader {
    fn read(&self, entity: &EntityRef) -> Option<f64>;

    fn read_bool(&self, entity: &EntityRef) -> Option<bool>;
}

/// A named actuator command.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    /// `climate.set_hvac_mode` on a TRV.
    ClimateSetHvacMode { target: EntityRef, mode: HvacMode },
    /// `switch.turn_on`.
    SwitchTurnOn { target: EntityRef },
    /// `switch.turn_off`.
    SwitchTurnOff { target: EntityRef },
}

impl ServiceCall {
    pub fn switch(target: EntityRef, on: bool) -> Self {
        if on {
            Self::SwitchTurnOn { target }
        } else {
            Self::SwitchTurnOff { target }
        }
    }

    pub fn domain(&self) -> &'static str {
        match self {
            Self::ClimateSetHvacMode { .. } => "climate",
            Self::SwitchTurnOn { .. } | Self::SwitchTurnOff { .. } => "switch",
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::ClimateSetHvacMode { .. } => "set_hvac_mode",
            Self::SwitchTurnOn { .. } => "turn_on",
            Self::SwitchTurnOff { .. } => "turn_off",
        }
    }

    pub fn target(&self) -> &EntityRef {
        match self {
            Self::ClimateSetHvacMode { target, .. }
            | Self::SwitchTurnOn { target }
            | Self::SwitchTurnOff { target } => target,
        }
    }

    /// Build the error a bus reports when this call fails.
    pub fn failed(&self, message: impl Into<String>) -> CoreError {
        CoreError::ServiceCall {
            domain: self.domain(),
            service: self.service(),
            target: self.target().to_string(),
            message: message.into(),
        }
    }
}

/// Fire-and-forget command interface to the host.
pub trait ServiceBus {
    fn call(&mut self, call: ServiceCall) -> CoreResult<()>;
}

/// A binary indicator shown to the user.
pub trait BooleanDisplay {
    fn set_on(&mut self, on: bool);
}

/// A numeric value shown to the user.
pub trait NumericDisplay {
    fn set_value(&mut self, value: f64);
}

/// A climate control shown to the user.
pub trait ClimateDisplay {
    fn set_current_temperature(&mut self, value: Option<f64>);
    fn set_target_temperature(&mut self, value: Option<f64>);
    fn set_hvac_mode(&mut self, mode: Option<HvacMode>);
    fn set_preset(&mut self, preset: Option<&str>);
}

/// Hands out displays for a device.
///
/// Called only while the hub is being built from configuration.
pub trait DisplayRegistry {
    fn boolean(&mut self, device: &DeviceInfo, role: &str) -> Box<dyn BooleanDisplay>;
    fn numeric(&mut self, device: &DeviceInfo, role: &str) -> Box<dyn NumericDisplay>;
    fn climate(&mut self, device: &DeviceInfo, role: &str) -> Box<dyn ClimateDisplay>;
}

/// Display that discards every value; used where nothing is registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl BooleanDisplay for NullDisplay {
    fn set_on(&mut self, _on: bool) {}
}

impl NumericDisplay for NullDisplay {
    fn set_value(&mut self, _value: f64) {}
}

impl ClimateDisplay for NullDisplay {
    fn set_current_temperature(&mut self, _value: Option<f64>) {}
    fn set_target_temperature(&mut self, _value: Option<f64>) {}
    fn set_hvac_mode(&mut self, _mode: Option<HvacMode>) {}
    fn set_preset(&mut self, _preset: Option<&str>) {}
}

impl DisplayRegistry for NullDisplay {
    fn boolean(&mut self, _device: &DeviceInfo, _role: &str) -> Box<dyn BooleanDisplay> {
        Box::new(NullDisplay)
    }

    fn numeric(&mut self, _device: &DeviceInfo, _role: &str) -> Box<dyn NumericDisplay> {
        Box::new(NullDisplay)
    }

    fn climate(&mut self, _device: &DeviceInfo, _role: &str) -> Box<dyn ClimateDisplay> {
        Box::new(NullDisplay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_vocabulary() {
        for raw in ["y", "yes", "true", "on", "ON", " True "] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["n", "no", "false", "off", "Off"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["", "unavailable", "unknown", "1", "0"] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }

    #[test]
    fn parse_float_rejects_garbage() {
        assert_eq!(parse_float("21.5"), Some(21.5));
        assert_eq!(parse_float(" -3 "), Some(-3.0));
        assert_eq!(parse_float("unavailable"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("inf"), None);
    }

    #[test]
    fn service_call_names() {
        let call = ServiceCall::ClimateSetHvacMode {
            target: EntityRef::from("climate.trv_1"),
            mode: HvacMode::Heat,
        };
        assert_eq!(call.domain(), "climate");
        assert_eq!(call.service(), "set_hvac_mode");
        assert_eq!(call.target().as_str(), "climate.trv_1");

        let call = ServiceCall::switch(EntityRef::from("switch.pump"), false);
        assert_eq!(call.domain(), "switch");
        assert_eq!(call.service(), "turn_off");
    }

    #[test]
    fn service_call_failure_names_the_call() {
        let call = ServiceCall::switch(EntityRef::from("switch.pump"), true);
        let msg = call.failed("timeout").to_string();
        assert!(msg.contains("switch.turn_on"));
        assert!(msg.contains("switch.pump"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn hvac_mode_from_str() {
        assert_eq!("heat".parse::<HvacMode>(), Ok(HvacMode::Heat));
        assert_eq!("OFF".parse::<HvacMode>(), Ok(HvacMode::Off));
        assert!("cool".parse::<HvacMode>().is_err());
    }
}
