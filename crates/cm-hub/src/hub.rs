//! Hub: owns all zones and circuits and runs the fixed-interval tick.

use std::time::{Duration, Instant};

use cm_controls::{OnlineTracker, Ticker};
use cm_core::{DeviceInfo, DisplayRegistry, EntityRef, HvacMode, ServiceBus, StateReader};
use cm_project::{HubConfig, SnapshotSet, ValidationError, validate_config};
use tracing::{Span, debug, error, info, info_span, warn};

use crate::circuit::Circuit;
use crate::error::{HubError, HubResult};
use crate::indicator::{BinaryIndicator, NumericIndicator};
use crate::zone::Zone;

pub const HUB_MODEL: &str = "Main Thermostat";

/// Host access for one tick.
pub struct TickContext<'a> {
    pub states: &'a dyn StateReader,
    pub services: &'a mut dyn ServiceBus,
    pub now: Instant,
}

#[derive(Debug)]
pub struct Hub {
    device: DeviceInfo,
    span: Span,
    zones: Vec<Zone>,
    circuits: Vec<Circuit>,
    boiler_sensor: Option<EntityRef>,
    boiler_tracker: OnlineTracker,
    output: NumericIndicator,
    control_fault: BinaryIndicator,
    ticker: Ticker,
}

impl Hub {
    /// Validate `config` and build every zone and circuit.
    pub fn from_config(config: &HubConfig, displays: &mut dyn DisplayRegistry) -> HubResult<Self> {
        validate_config(config)?;

        let device = DeviceInfo::new(config.hub_id(), config.name.clone(), HUB_MODEL);
        let span = info_span!("hub", hub = %device.name);

        let zones = config
            .zones
            .iter()
            .map(|zone| Zone::from_config(zone, displays))
            .collect::<HubResult<Vec<_>>>()?;
        let circuits = config
            .circuits
            .iter()
            .map(|circuit| Circuit::from_config(circuit, &zones, displays))
            .collect();

        let tick_interval = config.tick_interval().ok_or_else(|| {
            invalid_interval("tick_interval_s", config.tick_interval_s)
        })?;
        let boiler_grace = config.boiler_grace().ok_or_else(|| {
            invalid_interval("boiler_grace_s", config.boiler_grace_s)
        })?;

        let mut boiler_tracker = OnlineTracker::new("Boiler", boiler_grace);
        if config.boiler_status_sensor.is_some() {
            boiler_tracker =
                boiler_tracker.with_fault_display(displays.boolean(&device, "Boiler Fault"));
        }

        Ok(Self {
            output: NumericIndicator::new(displays.numeric(&device, "Output")),
            control_fault: BinaryIndicator::new(displays.boolean(&device, "Control Fault")),
            boiler_sensor: config.boiler_status_sensor.clone(),
            boiler_tracker,
            ticker: Ticker::new(tick_interval),
            zones,
            circuits,
            device,
            span,
        })
    }

    pub fn id(&self) -> &str {
        &self.device.id
    }

    pub fn name(&self) -> &str {
        &self.device.name
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id() == id)
    }

    pub fn circuit(&self, id: &str) -> Option<&Circuit> {
        self.circuits.iter().find(|c| c.id() == id)
    }

    /// Highest zone output published by the last completed tick.
    pub fn output(&self) -> f64 {
        self.output.value().unwrap_or(0.0)
    }

    pub fn is_control_fault(&self) -> bool {
        self.control_fault.is_on()
    }

    pub fn is_boiler_fault(&self) -> bool {
        self.boiler_tracker.is_fault()
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    /// Apply restore records to matching zones, before or after [`Hub::initialize`].
    ///
    /// A bad record is logged and skipped. Returns how many zones were restored.
    pub fn restore(&mut self, snapshots: &SnapshotSet) -> usize {
        let mut restored = 0;
        for zone in &mut self.zones {
            let Some(snapshot) = snapshots.zone(zone.id()) else {
                continue;
            };
            match zone.restore(snapshot) {
                Ok(()) => restored += 1,
                Err(err) => warn!(zone = %zone.name(), error = %err, "ignoring restore record"),
            }
        }
        restored
    }

    pub fn snapshot(&self) -> SnapshotSet {
        let mut set = SnapshotSet::now();
        for zone in &self.zones {
            set.zones.insert(zone.id().to_string(), zone.snapshot());
        }
        set
    }

    /// Seed the regulators and start the ticker.
    pub fn initialize(&mut self, now: Instant) {
        for zone in &mut self.zones {
            zone.initialize();
        }
        self.ticker.start(now);
        info!(
            hub = %self.device.name,
            zones = self.zones.len(),
            circuits = self.circuits.len(),
            interval = ?self.ticker.interval(),
            "hub started"
        );
    }

    /// Stop the ticker. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.ticker.is_running() {
            self.ticker.stop();
            info!(hub = %self.device.name, "hub stopped");
        }
    }

    /// Time until the next tick is due, `None` while stopped.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.ticker.time_until_due(now)
    }

    /// Run a tick if one is due. Returns whether a tick ran.
    pub fn poll(&mut self, ctx: TickContext<'_>) -> bool {
        if !self.ticker.poll(ctx.now) {
            return false;
        }
        self.tick(ctx);
        true
    }

    /// One control tick. Never fails: errors end up in the fault indicators.
    pub fn tick(&mut self, ctx: TickContext<'_>) {
        let span = self.span.clone();
        let _entered = span.enter();

        let TickContext {
            states,
            services,
            now,
        } = ctx;

        if let Some(sensor) = self.boiler_sensor.as_ref() {
            // Unreadable boiler state counts as offline.
            let online_raw = states.read_bool(sensor).unwrap_or(false);
            let zones = &mut self.zones;
            let circuits = &mut self.circuits;
            let checked = self
                .boiler_tracker
                .is_online_with(online_raw, now, || fail_safe(zones, circuits, &mut *services));
            match checked {
                Ok(true) => {}
                Ok(false) => {
                    debug!("boiler offline, skipping control");
                    return;
                }
                Err(err) => {
                    self.report_control(Err(err));
                    return;
                }
            }
        }

        let result = self.control_heating(states, services, now);
        self.report_control(result);
    }

    fn control_heating(
        &mut self,
        states: &dyn StateReader,
        services: &mut dyn ServiceBus,
        now: Instant,
    ) -> HubResult<()> {
        let mut output: f64 = 0.0;
        for zone in &mut self.zones {
            zone.control_temperature(states, services, now);
            output = output.max(zone.regulator_output());
        }
        self.output.set(output);

        for circuit in &mut self.circuits {
            circuit.control_circuit(&self.zones, states, services)?;
        }
        Ok(())
    }

    /// Sticky hub fault: logged once on onset and once on recovery.
    fn report_control(&mut self, result: HubResult<()>) {
        match result {
            Ok(()) => {
                if self.control_fault.set(false) {
                    info!("hub recovered from control fault");
                }
            }
            Err(err) => {
                if self.control_fault.set(true) {
                    error!(error = %err, "hub control tick failed");
                }
            }
        }
    }

    pub fn set_zone_target_temperature(&mut self, zone_id: &str, value: f64) -> HubResult<()> {
        self.zone_mut(zone_id)?.set_target_temperature(value)
    }

    pub fn set_zone_hvac_mode(&mut self, zone_id: &str, mode: HvacMode) -> HubResult<()> {
        self.zone_mut(zone_id)?.set_hvac_mode(mode);
        Ok(())
    }

    pub fn set_zone_preset_mode(&mut self, zone_id: &str, preset: &str) -> HubResult<()> {
        self.zone_mut(zone_id)?.set_preset_mode(preset)
    }

    pub fn set_zone_kp(&mut self, zone_id: &str, kp: f64) -> HubResult<()> {
        self.zone_mut(zone_id)?.set_kp(kp)
    }

    pub fn set_zone_ki(&mut self, zone_id: &str, ki: f64) -> HubResult<()> {
        self.zone_mut(zone_id)?.set_ki(ki)
    }

    /// Apply a target to every zone of a circuit.
    pub fn set_circuit_target_temperature(&mut self, circuit_id: &str, value: f64) -> HubResult<()> {
        for index in self.circuit_members(circuit_id)? {
            self.zones[index].set_target_temperature(value)?;
        }
        Ok(())
    }

    pub fn set_circuit_hvac_mode(&mut self, circuit_id: &str, mode: HvacMode) -> HubResult<()> {
        for index in self.circuit_members(circuit_id)? {
            self.zones[index].set_hvac_mode(mode);
        }
        Ok(())
    }

    pub fn set_circuit_preset(&mut self, circuit_id: &str, preset: &str) -> HubResult<()> {
        for index in self.circuit_members(circuit_id)? {
            self.zones[index].set_preset_mode(preset)?;
        }
        Ok(())
    }

    fn zone_mut(&mut self, zone_id: &str) -> HubResult<&mut Zone> {
        self.zones
            .iter_mut()
            .find(|z| z.id() == zone_id)
            .ok_or_else(|| HubError::UnknownZone {
                id: zone_id.to_string(),
            })
    }

    fn circuit_members(&self, circuit_id: &str) -> HubResult<Vec<usize>> {
        self.circuit(circuit_id)
            .map(|c| c.zone_indices().to_vec())
            .ok_or_else(|| HubError::UnknownCircuit {
                id: circuit_id.to_string(),
            })
    }
}

/// Boiler unreachable: open every TRV and run every circuit so heat can circulate.
fn fail_safe(
    zones: &mut [Zone],
    circuits: &mut [Circuit],
    services: &mut dyn ServiceBus,
) -> HubResult<()> {
    info!("starting pumps and opening TRVs");
    for zone in zones.iter_mut() {
        zone.operate_trvs(services, 1.0)?;
    }
    for circuit in circuits.iter_mut() {
        circuit.set_active(services, true)?;
    }
    Ok(())
}

fn invalid_interval(field: &str, value: f64) -> HubError {
    HubError::Config(ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: "must be a positive number of seconds".to_string(),
    })
}
