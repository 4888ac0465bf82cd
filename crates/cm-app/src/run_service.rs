//! Run a hub against an in-memory host.
//!
//! Entity states come from a YAML map and stay fixed for the run. Service
//! calls are recorded, not executed. Restore snapshots are read before the
//! hub starts and written after it stops.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use cm_controls::Regulator;
use cm_core::{Clock, HvacMode, ManualClock, NullDisplay, SystemClock};
use cm_hub::{Hub, MemoryServices, MemoryStates, RunLimits};
use cm_project::HubConfig;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// How to run the hub.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many ticks. Required unless `realtime`.
    pub ticks: Option<u64>,
    /// Follow the wall clock instead of a simulated one.
    pub realtime: bool,
    /// Snapshot file applied before start; a missing file is not an error.
    pub restore: Option<PathBuf>,
    /// Snapshot file written after the run.
    pub save: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStatus {
    pub id: String,
    pub name: String,
    pub output: f64,
    pub regulator_enabled: bool,
    pub current_temperature: Option<f64>,
    pub target_temperature: f64,
    pub hvac_mode: HvacMode,
    pub preset: String,
    pub sensor_fault: bool,
    pub control_fault: bool,
    pub trv_open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitStatus {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
    pub preset: Option<String>,
}

/// Hub state after a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub hub: String,
    pub ticks: u64,
    pub restored_zones: usize,
    pub output: f64,
    pub control_fault: bool,
    pub boiler_fault: bool,
    pub service_calls: usize,
    pub zones: Vec<ZoneStatus>,
    pub circuits: Vec<CircuitStatus>,
    pub finished_at: DateTime<Utc>,
}

/// Load entity states from a YAML map of entity id to state.
pub fn load_states(path: &Path) -> AppResult<MemoryStates> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    states_from_yaml_str(&content)
}

/// Parse entity states. Null values are left out, as unavailable entities.
pub fn states_from_yaml_str(content: &str) -> AppResult<MemoryStates> {
    let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(content)
        .map_err(|e| AppError::InvalidInput(format!("Failed to parse states YAML: {e}")))?;

    let mut entries = Vec::with_capacity(raw.len());
    for (entity, value) in raw {
        let state = match value {
            serde_yaml::Value::Null => continue,
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "State of '{entity}' must be a scalar"
                )));
            }
        };
        entries.push((entity, state));
    }
    Ok(entries.into_iter().collect())
}

/// Build a hub from `config` and run it against `states`.
pub fn simulate(
    config: &HubConfig,
    states: &MemoryStates,
    options: &RunOptions,
) -> AppResult<RunReport> {
    if !options.realtime && options.ticks.is_none() {
        return Err(AppError::InvalidInput(
            "A simulated run needs a tick count".to_string(),
        ));
    }

    let mut hub = Hub::from_config(config, &mut NullDisplay)?;
    let restored_zones = match &options.restore {
        Some(path) => restore_snapshots(&mut hub, path)?,
        None => 0,
    };

    let mut services = MemoryServices::default();
    let limits = RunLimits {
        max_ticks: options.ticks,
        stop: None,
    };
    let ticks = if options.realtime {
        drive(&mut hub, states, &mut services, &SystemClock, limits)
    } else {
        drive(
            &mut hub,
            states,
            &mut services,
            &ManualClock::new(Instant::now()),
            limits,
        )
    };
    hub.destroy();

    if let Some(path) = &options.save {
        cm_project::save_snapshots(path, &hub.snapshot())
            .map_err(|e| AppError::Snapshot(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "saved restore snapshots");
    }

    Ok(report(&hub, states, ticks, restored_zones, services.calls().len()))
}

fn drive<C: Clock>(
    hub: &mut Hub,
    states: &MemoryStates,
    services: &mut MemoryServices,
    clock: &C,
    limits: RunLimits<'_>,
) -> u64 {
    hub.initialize(clock.now());
    cm_hub::run(hub, states, services, clock, limits, |tick, hub| {
        debug!(
            tick,
            output = hub.output(),
            control_fault = hub.is_control_fault(),
            "tick done"
        );
    })
}

fn restore_snapshots(hub: &mut Hub, path: &Path) -> AppResult<usize> {
    if !path.exists() {
        info!(path = %path.display(), "no restore snapshots yet");
        return Ok(0);
    }
    let snapshots = cm_project::load_snapshots(path)
        .map_err(|e| AppError::Snapshot(format!("{}: {e}", path.display())))?;
    Ok(hub.restore(&snapshots))
}

fn report(
    hub: &Hub,
    states: &MemoryStates,
    ticks: u64,
    restored_zones: usize,
    service_calls: usize,
) -> RunReport {
    RunReport {
        hub: hub.name().to_string(),
        ticks,
        restored_zones,
        output: hub.output(),
        control_fault: hub.is_control_fault(),
        boiler_fault: hub.is_boiler_fault(),
        service_calls,
        zones: hub
            .zones()
            .iter()
            .map(|zone| ZoneStatus {
                id: zone.id().to_string(),
                name: zone.name().to_string(),
                output: zone.regulator_output(),
                regulator_enabled: zone.regulator().enabled(),
                current_temperature: zone.current_temperature(states),
                target_temperature: zone.climate().target_temperature(),
                hvac_mode: zone.climate().hvac_mode(),
                preset: zone.climate().preset().to_string(),
                sensor_fault: zone.is_sensor_fault(),
                control_fault: zone.is_control_fault(),
                trv_open: zone.is_trv_open(),
            })
            .collect(),
        circuits: hub
            .circuits()
            .iter()
            .map(|circuit| {
                let state = circuit.state();
                CircuitStatus {
                    id: circuit.id().to_string(),
                    name: circuit.name().to_string(),
                    active: circuit.is_active(),
                    current_temperature: state.current_temperature,
                    target_temperature: state.target_temperature,
                    hvac_mode: state.hvac_mode,
                    preset: state.preset.map(str::to_string),
                }
            })
            .collect(),
        finished_at: Utc::now(),
    }
}
