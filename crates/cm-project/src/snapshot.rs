//! Restore snapshots.
//!
//! The host persists one snapshot per zone climate at shutdown and hands the
//! set back at startup, so setpoints and presets survive restarts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cm_core::HvacMode;
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Values stored for one preset. Every field is optional; only what the user
/// changed while the preset was active is recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PresetSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<HvacMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ki: Option<f64>,
}

impl PresetSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Persisted state of a zone climate control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClimateSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_mode: Option<HvacMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_mode: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, PresetSnapshot>,
}

/// PID gains last set by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PidSnapshot {
    pub kp: f64,
    pub ki: f64,
}

/// Everything restored for one zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ZoneSnapshot {
    #[serde(flatten)]
    pub climate: ClimateSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<PidSnapshot>,
}

/// Snapshots of every zone of a hub, keyed by zone id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSet {
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneSnapshot>,
}

impl Default for SnapshotSet {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: None,
            zones: BTreeMap::new(),
        }
    }
}

impl SnapshotSet {
    /// Empty set stamped with the current time.
    pub fn now() -> Self {
        Self {
            saved_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn zone(&self, zone_id: &str) -> Option<&ZoneSnapshot> {
        self.zones.get(zone_id)
    }
}

fn default_snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}
