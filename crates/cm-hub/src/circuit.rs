//! Heating circuit: zones sharing a pump or boiler demand switch.
//!
//! The circuit's climate display is a read-through aggregate of its zones.
//! User changes made on it are fanned out to the zones by the hub.

use std::fmt;

use cm_core::{
    ClimateDisplay, DeviceInfo, DisplayRegistry, EntityRef, HvacMode, ServiceBus, ServiceCall,
    StateReader, Tolerances, nearly_equal,
};
use cm_project::CircuitConfig;
use tracing::{Span, info_span, warn};

use crate::error::HubResult;
use crate::indicator::BinaryIndicator;
use crate::zone::Zone;

pub const CIRCUIT_MODEL: &str = "Heating Circuit";

/// What a circuit needs to know about one of its zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneReport {
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
    pub preset: Option<&'static str>,
    pub output: f64,
    pub trv_open: bool,
}

/// Aggregated state shown on the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CircuitState {
    /// Coldest reading among the zones.
    pub current_temperature: Option<f64>,
    /// Set only when every zone agrees.
    pub target_temperature: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
    pub preset: Option<&'static str>,
    /// Any zone calling for heat or holding its TRVs open.
    pub active: bool,
}

/// Fold zone reports into the circuit state.
pub fn aggregate(reports: &[ZoneReport]) -> CircuitState {
    let tol = Tolerances::default();

    let current_temperature = reports
        .iter()
        .filter_map(|r| r.current_temperature)
        .reduce(f64::min);

    CircuitState {
        current_temperature,
        target_temperature: common(reports.iter().map(|r| r.target_temperature), |a, b| {
            nearly_equal(*a, *b, tol)
        }),
        hvac_mode: common(reports.iter().map(|r| r.hvac_mode), |a, b| a == b),
        preset: common(reports.iter().map(|r| r.preset), |a, b| a == b),
        active: reports.iter().any(|r| r.output > 0.0 || r.trv_open),
    }
}

/// The single value shared by all present values, `None` if they disagree.
fn common<T, I, F>(values: I, same: F) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
    F: Fn(&T, &T) -> bool,
{
    let mut present = values.into_iter().flatten();
    let first = present.next()?;
    present.all(|v| same(&first, &v)).then_some(first)
}

pub struct Circuit {
    device: DeviceInfo,
    span: Span,
    /// Indices into the hub's zone list, in configuration order.
    zones: Vec<usize>,
    switches: Vec<EntityRef>,
    climate: Box<dyn ClimateDisplay>,
    active: BinaryIndicator,
    state: CircuitState,
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("device", &self.device)
            .field("zones", &self.zones)
            .field("switches", &self.switches)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Circuit {
    /// Build a circuit over `zones`. References to unknown zones are skipped.
    pub fn from_config(
        config: &CircuitConfig,
        zones: &[Zone],
        displays: &mut dyn DisplayRegistry,
    ) -> Self {
        let device = DeviceInfo::new(config.circuit_id(), config.name.clone(), CIRCUIT_MODEL);
        let span = info_span!("circuit", circuit = %device.name);

        let mut members = Vec::with_capacity(config.zones.len());
        for zone_id in &config.zones {
            match zones.iter().position(|z| z.id() == zone_id.as_str()) {
                Some(index) => members.push(index),
                None => warn!(
                    circuit = %device.name,
                    zone = %zone_id,
                    "circuit references unknown zone, skipping"
                ),
            }
        }

        Self {
            climate: displays.climate(&device, "Climate"),
            active: BinaryIndicator::new(displays.boolean(&device, "Active")),
            zones: members,
            switches: config.switches.clone(),
            state: CircuitState::default(),
            device,
            span,
        }
    }

    pub fn id(&self) -> &str {
        &self.device.id
    }

    pub fn name(&self) -> &str {
        &self.device.name
    }

    pub fn zone_indices(&self) -> &[usize] {
        &self.zones
    }

    pub fn state(&self) -> &CircuitState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.active.is_on()
    }

    /// Aggregate the member zones and drive the switches.
    pub fn control_circuit(
        &mut self,
        zones: &[Zone],
        states: &dyn StateReader,
        services: &mut dyn ServiceBus,
    ) -> HubResult<()> {
        let span = self.span.clone();
        let _entered = span.enter();

        let reports: Vec<ZoneReport> = self
            .zones
            .iter()
            .filter_map(|&index| zones.get(index))
            .map(|zone| zone.report(states))
            .collect();
        let state = aggregate(&reports);

        self.climate.set_current_temperature(state.current_temperature);
        self.climate.set_target_temperature(state.target_temperature);
        self.climate.set_hvac_mode(state.hvac_mode);
        self.climate.set_preset(state.preset);
        self.state = state;

        self.set_active(services, state.active)
    }

    /// Switch every circuit switch on or off.
    pub fn set_active(&mut self, services: &mut dyn ServiceBus, active: bool) -> HubResult<()> {
        for switch in &self.switches {
            services.call(ServiceCall::switch(switch.clone(), active))?;
        }
        self.active.set(active);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(current: Option<f64>, target: f64) -> ZoneReport {
        ZoneReport {
            current_temperature: current,
            target_temperature: Some(target),
            hvac_mode: Some(HvacMode::Heat),
            preset: Some("home"),
            output: 0.0,
            trv_open: false,
        }
    }

    #[test]
    fn agreeing_targets_are_reported() {
        let state = aggregate(&[report(Some(20.0), 20.0), report(Some(21.0), 20.0)]);
        assert_eq!(state.target_temperature, Some(20.0));
        assert_eq!(state.hvac_mode, Some(HvacMode::Heat));
        assert_eq!(state.preset, Some("home"));
    }

    #[test]
    fn disagreeing_targets_are_unset() {
        let state = aggregate(&[report(None, 20.0), report(None, 21.0)]);
        assert_eq!(state.target_temperature, None);
    }

    #[test]
    fn current_is_minimum_of_readings() {
        let state = aggregate(&[
            report(Some(19.5), 20.0),
            report(None, 20.0),
            report(Some(21.0), 20.0),
        ]);
        assert_eq!(state.current_temperature, Some(19.5));

        let state = aggregate(&[report(None, 20.0)]);
        assert_eq!(state.current_temperature, None);
    }

    #[test]
    fn active_on_output_or_open_trv() {
        let idle = report(Some(20.0), 20.0);
        assert!(!aggregate(&[idle, idle]).active);

        let heating = ZoneReport { output: 0.05, ..idle };
        assert!(aggregate(&[idle, heating]).active);

        let valve_open = ZoneReport { trv_open: true, ..idle };
        assert!(aggregate(&[valve_open, idle]).active);
    }

    #[test]
    fn mixed_modes_and_presets_are_unset() {
        let a = report(Some(20.0), 20.0);
        let b = ZoneReport {
            hvac_mode: Some(HvacMode::Off),
            preset: Some("away"),
            ..a
        };
        let state = aggregate(&[a, b]);
        assert_eq!(state.hvac_mode, None);
        assert_eq!(state.preset, None);
    }

    #[test]
    fn empty_circuit_is_idle() {
        assert_eq!(aggregate(&[]), CircuitState::default());
    }
}
