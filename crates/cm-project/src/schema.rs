//! Configuration schema definitions.

use std::time::Duration;

use cm_core::{EntityRef, slugify};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

/// Longest interval accepted for any `*_s` setting: one day.
pub const MAX_INTERVAL_S: f64 = 86_400.0;

/// Top-level configuration of one hub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    /// Binary sensor reporting whether the boiler is reachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boiler_status_sensor: Option<EntityRef>,
    #[serde(default = "default_tick_interval_s")]
    pub tick_interval_s: f64,
    #[serde(default = "default_boiler_grace_s")]
    pub boiler_grace_s: f64,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub circuits: Vec<CircuitConfig>,
}

impl HubConfig {
    pub fn hub_id(&self) -> String {
        slugify(&self.name)
    }

    pub fn tick_interval(&self) -> Option<Duration> {
        seconds(self.tick_interval_s)
    }

    pub fn boiler_grace(&self) -> Option<Duration> {
        seconds(self.boiler_grace_s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RegulatorType {
    #[serde(rename = "PID")]
    Pid,
    Hysteresis,
}

/// One heating zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneConfig {
    /// Stable id; defaults to the slug of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub regulator_type: RegulatorType,
    pub temperature_sensor: EntityRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub window_sensors: Vec<EntityRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trvs: Vec<EntityRef>,
    #[serde(default = "default_sensor_grace_s")]
    pub sensor_grace_s: f64,
    #[serde(default = "default_window_warmup_s")]
    pub window_warmup_s: f64,
    #[serde(default)]
    pub pid: PidConfig,
}

impl ZoneConfig {
    pub fn zone_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| slugify(&self.name))
    }

    pub fn sensor_grace(&self) -> Option<Duration> {
        seconds(self.sensor_grace_s)
    }

    pub fn window_warmup(&self) -> Option<Duration> {
        seconds(self.window_warmup_s)
    }
}

/// Initial PID tuning of a zone. Ignored for hysteresis zones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PidConfig {
    #[serde(default = "default_kp")]
    pub kp: f64,
    #[serde(default = "default_ki")]
    pub ki: f64,
    #[serde(default = "default_average_samples")]
    pub average_samples: usize,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: default_ki(),
            average_samples: default_average_samples(),
        }
    }
}

/// A group of zones sharing switches (pumps, boiler demand).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Zone ids, in control order.
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub switches: Vec<EntityRef>,
}

impl CircuitConfig {
    pub fn circuit_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| slugify(&self.name))
    }
}

fn seconds(value: f64) -> Option<Duration> {
    if value > 0.0 && value <= MAX_INTERVAL_S {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

fn default_version() -> u32 {
    LATEST_VERSION
}

fn default_tick_interval_s() -> f64 {
    1.0
}

fn default_boiler_grace_s() -> f64 {
    20.0
}

fn default_sensor_grace_s() -> f64 {
    5.0
}

fn default_window_warmup_s() -> f64 {
    300.0
}

fn default_kp() -> f64 {
    0.5
}

fn default_ki() -> f64 {
    0.001
}

fn default_average_samples() -> usize {
    20
}
