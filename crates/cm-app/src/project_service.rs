//! Configuration loading, validation, and introspection.

use std::path::Path;

use cm_project::{HubConfig, RegulatorType};

use crate::error::{AppError, AppResult};

/// Summary of a zone for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    pub regulator_type: RegulatorType,
    pub temperature_sensor: String,
    pub window_count: usize,
    pub trv_count: usize,
    /// Ids of the circuits this zone belongs to.
    pub circuits: Vec<String>,
}

/// Summary of a circuit for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitSummary {
    pub id: String,
    pub name: String,
    pub zones: Vec<String>,
    /// Referenced zones that do not exist; skipped at runtime.
    pub missing_zones: Vec<String>,
    pub switch_count: usize,
}

/// Load and validate a hub configuration from a YAML file.
pub fn load_config(path: &Path) -> AppResult<HubConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = cm_project::config_from_yaml_str(&content)?;
    Ok(config)
}

/// Validate configuration structure.
pub fn validate_config(config: &HubConfig) -> AppResult<()> {
    cm_project::validate_config(config)?;

    if config.zones.is_empty() {
        return Err(AppError::Validation(
            "Config must have at least one zone".to_string(),
        ));
    }

    Ok(())
}

/// List all zones with summaries.
pub fn list_zones(config: &HubConfig) -> Vec<ZoneSummary> {
    config
        .zones
        .iter()
        .map(|zone| {
            let id = zone.zone_id();
            ZoneSummary {
                circuits: config
                    .circuits
                    .iter()
                    .filter(|c| c.zones.contains(&id))
                    .map(|c| c.circuit_id())
                    .collect(),
                name: zone.name.clone(),
                regulator_type: zone.regulator_type,
                temperature_sensor: zone.temperature_sensor.to_string(),
                window_count: zone.window_sensors.len(),
                trv_count: zone.trvs.len(),
                id,
            }
        })
        .collect()
}

/// List all circuits with summaries.
pub fn list_circuits(config: &HubConfig) -> Vec<CircuitSummary> {
    let zone_ids: Vec<String> = config.zones.iter().map(|z| z.zone_id()).collect();
    config
        .circuits
        .iter()
        .map(|circuit| CircuitSummary {
            id: circuit.circuit_id(),
            name: circuit.name.clone(),
            zones: circuit.zones.clone(),
            missing_zones: circuit
                .zones
                .iter()
                .filter(|z| !zone_ids.contains(z))
                .cloned()
                .collect(),
            switch_count: circuit.switches.len(),
        })
        .collect()
}
