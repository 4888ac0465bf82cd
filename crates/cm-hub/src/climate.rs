//! User-facing climate state of a zone: mode, setpoint and presets.
//!
//! Every user change is also recorded into the active preset, so switching
//! back to a preset restores what was last chosen while it was active.

use std::collections::BTreeMap;
use std::fmt;

use cm_core::{ClimateDisplay, HvacMode, ensure_finite};
use cm_project::{ClimateSnapshot, PresetSnapshot};
use tracing::warn;

use crate::error::{HubError, HubResult};

pub const PRESET_HOME: &str = "home";
pub const PRESET_SLEEP: &str = "sleep";
pub const PRESET_AWAY: &str = "away";
pub const PRESETS: [&str; 3] = [PRESET_HOME, PRESET_SLEEP, PRESET_AWAY];

pub const DEFAULT_TARGET_TEMPERATURE: f64 = 22.0;
pub const MIN_TARGET_TEMPERATURE: f64 = 18.0;
pub const MAX_TARGET_TEMPERATURE: f64 = 32.0;

pub struct ZoneClimate {
    hvac_mode: HvacMode,
    target_temperature: f64,
    preset: &'static str,
    current_temperature: Option<f64>,
    presets: BTreeMap<&'static str, PresetSnapshot>,
    display: Box<dyn ClimateDisplay>,
}

impl fmt::Debug for ZoneClimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneClimate")
            .field("hvac_mode", &self.hvac_mode)
            .field("target_temperature", &self.target_temperature)
            .field("preset", &self.preset)
            .field("current_temperature", &self.current_temperature)
            .field("presets", &self.presets)
            .finish_non_exhaustive()
    }
}

impl ZoneClimate {
    pub fn new(display: Box<dyn ClimateDisplay>) -> Self {
        Self {
            hvac_mode: HvacMode::default(),
            target_temperature: DEFAULT_TARGET_TEMPERATURE,
            preset: PRESET_HOME,
            current_temperature: None,
            presets: BTreeMap::new(),
            display,
        }
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.hvac_mode
    }

    pub fn target_temperature(&self) -> f64 {
        self.target_temperature
    }

    pub fn preset(&self) -> &'static str {
        self.preset
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    pub fn preset_values(&self, preset: &str) -> Option<&PresetSnapshot> {
        self.presets.get(preset)
    }

    /// Write the whole state to the display.
    pub fn publish(&mut self) {
        self.display.set_current_temperature(self.current_temperature);
        self.display.set_target_temperature(Some(self.target_temperature));
        self.display.set_hvac_mode(Some(self.hvac_mode));
        self.display.set_preset(Some(self.preset));
    }

    pub fn set_current_temperature(&mut self, value: Option<f64>) {
        if self.current_temperature != value {
            self.current_temperature = value;
            self.display.set_current_temperature(value);
        }
    }

    pub fn set_hvac_mode(&mut self, mode: HvacMode) {
        self.hvac_mode = mode;
        self.active_preset_mut().mode = Some(mode);
        self.display.set_hvac_mode(Some(mode));
    }

    /// Set the target, clamped to the supported range. Returns the applied value.
    pub fn set_target_temperature(&mut self, value: f64) -> HubResult<f64> {
        let value = clamp_target(ensure_finite(value, "target temperature")?);
        self.target_temperature = value;
        self.active_preset_mut().temperature = Some(value);
        self.display.set_target_temperature(Some(value));
        Ok(value)
    }

    /// Switch preset. If values were stored for it, they are applied and
    /// returned so the caller can apply the regulator part.
    pub fn set_preset_mode(&mut self, preset: &str) -> HubResult<Option<PresetSnapshot>> {
        let preset = known_preset(preset).ok_or_else(|| HubError::UnknownPreset {
            preset: preset.to_string(),
        })?;
        self.preset = preset;
        self.display.set_preset(Some(preset));

        let Some(values) = self.presets.get(preset).copied() else {
            return Ok(None);
        };
        if let Some(temperature) = values.temperature {
            self.target_temperature = clamp_target(temperature);
            self.display.set_target_temperature(Some(self.target_temperature));
        }
        if let Some(mode) = values.mode {
            self.hvac_mode = mode;
            self.display.set_hvac_mode(Some(mode));
        }
        Ok(Some(values))
    }

    /// Record the PID gains into the active preset.
    pub fn save_pid_coefficients(&mut self, kp: f64, ki: f64) {
        let preset = self.active_preset_mut();
        preset.kp = Some(kp);
        preset.ki = Some(ki);
    }

    /// Apply a restore record. Unknown presets and non-finite values are skipped.
    pub fn restore(&mut self, snapshot: &ClimateSnapshot) {
        if let Some(mode) = snapshot.hvac_mode {
            self.hvac_mode = mode;
        }
        if let Some(temperature) = snapshot.target_temperature.filter(|t| t.is_finite()) {
            self.target_temperature = clamp_target(temperature);
        }
        for (name, values) in &snapshot.presets {
            match known_preset(name) {
                Some(preset) => {
                    self.presets.insert(preset, *values);
                }
                None => warn!(preset = %name, "ignoring unknown preset in restore record"),
            }
        }
        if let Some(preset) = snapshot.preset_mode.as_deref().and_then(known_preset) {
            self.preset = preset;
        }
    }

    pub fn snapshot(&self) -> ClimateSnapshot {
        ClimateSnapshot {
            hvac_mode: Some(self.hvac_mode),
            target_temperature: Some(self.target_temperature),
            preset_mode: Some(self.preset.to_string()),
            presets: self
                .presets
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(name, values)| (name.to_string(), *values))
                .collect(),
        }
    }

    fn active_preset_mut(&mut self) -> &mut PresetSnapshot {
        self.presets.entry(self.preset).or_default()
    }
}

fn known_preset(name: &str) -> Option<&'static str> {
    PRESETS.into_iter().find(|preset| *preset == name)
}

fn clamp_target(value: f64) -> f64 {
    value.clamp(MIN_TARGET_TEMPERATURE, MAX_TARGET_TEMPERATURE)
}
