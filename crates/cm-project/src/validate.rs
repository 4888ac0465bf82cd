//! Configuration and snapshot validation.

use std::collections::HashSet;

use crate::schema::{HubConfig, LATEST_VERSION, MAX_INTERVAL_S, ZoneConfig};
use crate::snapshot::{PresetSnapshot, ZoneSnapshot};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing value: {field} in {context}")]
    Missing { field: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_config(config: &HubConfig) -> Result<(), ValidationError> {
    if config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    if config.hub_id().is_empty() {
        return Err(ValidationError::Missing {
            field: "name".to_string(),
            context: "hub".to_string(),
        });
    }

    positive_interval("tick_interval_s", config.tick_interval_s)?;
    positive_interval("boiler_grace_s", config.boiler_grace_s)?;

    let mut zone_ids = HashSet::new();
    for zone in &config.zones {
        let id = zone.zone_id();
        if id.is_empty() {
            return Err(ValidationError::Missing {
                field: "name".to_string(),
                context: "zones".to_string(),
            });
        }
        if !zone_ids.insert(id.clone()) {
            return Err(ValidationError::DuplicateId {
                id,
                context: "zones".to_string(),
            });
        }
        validate_zone(zone)?;
    }

    let mut circuit_ids = HashSet::new();
    for circuit in &config.circuits {
        let id = circuit.circuit_id();
        if id.is_empty() {
            return Err(ValidationError::Missing {
                field: "name".to_string(),
                context: "circuits".to_string(),
            });
        }
        if !circuit_ids.insert(id.clone()) {
            return Err(ValidationError::DuplicateId {
                id,
                context: "circuits".to_string(),
            });
        }

        let mut members = HashSet::new();
        for zone_id in &circuit.zones {
            if !members.insert(zone_id) {
                return Err(ValidationError::DuplicateId {
                    id: zone_id.clone(),
                    context: format!("circuit '{}' zones", circuit.name),
                });
            }
        }
    }

    Ok(())
}

fn validate_zone(zone: &ZoneConfig) -> Result<(), ValidationError> {
    let context = format!("zone '{}'", zone.name);

    if zone.temperature_sensor.as_str().trim().is_empty() {
        return Err(ValidationError::Missing {
            field: "temperature_sensor".to_string(),
            context,
        });
    }

    positive_interval("sensor_grace_s", zone.sensor_grace_s)?;
    positive_interval("window_warmup_s", zone.window_warmup_s)?;

    non_negative_gain("pid.kp", zone.pid.kp)?;
    non_negative_gain("pid.ki", zone.pid.ki)?;
    if zone.pid.average_samples == 0 {
        return Err(ValidationError::InvalidValue {
            field: format!("{context} pid.average_samples"),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Check a restored zone snapshot before it is applied.
pub fn validate_zone_snapshot(snapshot: &ZoneSnapshot) -> Result<(), ValidationError> {
    if let Some(temperature) = snapshot.climate.target_temperature {
        finite("target_temperature", temperature)?;
    }
    for (name, preset) in &snapshot.climate.presets {
        validate_preset(name, preset)?;
    }
    if let Some(pid) = &snapshot.pid {
        non_negative_gain("pid.kp", pid.kp)?;
        non_negative_gain("pid.ki", pid.ki)?;
    }
    Ok(())
}

fn validate_preset(name: &str, preset: &PresetSnapshot) -> Result<(), ValidationError> {
    if let Some(temperature) = preset.temperature {
        finite(&format!("presets.{name}.temperature"), temperature)?;
    }
    if let Some(kp) = preset.kp {
        non_negative_gain(&format!("presets.{name}.kp"), kp)?;
    }
    if let Some(ki) = preset.ki {
        non_negative_gain(&format!("presets.{name}.ki"), ki)?;
    }
    Ok(())
}

fn positive_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 && value <= MAX_INTERVAL_S {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("must be a positive number of seconds, at most {MAX_INTERVAL_S}"),
        })
    }
}

fn non_negative_gain(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be finite and non-negative".to_string(),
        })
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        })
    }
}
