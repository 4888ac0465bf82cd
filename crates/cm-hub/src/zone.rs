//! Heating zone: one temperature sensor, one regulator, optional windows and TRVs.

use std::time::{Duration, Instant};

use cm_controls::{AnyRegulator, OnlineTracker, PidSettings, Regulator, ZoneWindow};
use cm_core::{
    DeviceInfo, DisplayRegistry, EntityRef, HvacMode, ServiceBus, ServiceCall, StateReader,
};
use cm_project::{
    PidSnapshot, RegulatorType, ValidationError, ZoneConfig, ZoneSnapshot, validate_zone_snapshot,
};
use tracing::{Span, error, info, info_span};

use crate::circuit::ZoneReport;
use crate::climate::ZoneClimate;
use crate::error::{HubError, HubResult};
use crate::indicator::{BinaryIndicator, NumericIndicator};

pub const ZONE_MODEL: &str = "Zone Thermostat";

/// Diagnostic displays of a PID zone.
#[derive(Debug)]
struct PidDisplays {
    kp: NumericIndicator,
    ki: NumericIndicator,
    proportional: NumericIndicator,
    integral: NumericIndicator,
}

#[derive(Debug)]
pub struct Zone {
    device: DeviceInfo,
    span: Span,
    temperature_sensor: EntityRef,
    trvs: Vec<EntityRef>,
    regulator: AnyRegulator,
    window: Option<ZoneWindow>,
    sensor_tracker: OnlineTracker,
    climate: ZoneClimate,
    control_fault: BinaryIndicator,
    regulator_active: BinaryIndicator,
    output: NumericIndicator,
    trv_open: Option<BinaryIndicator>,
    pid_displays: Option<PidDisplays>,
}

impl Zone {
    /// Build a zone and register its displays.
    pub fn from_config(config: &ZoneConfig, displays: &mut dyn DisplayRegistry) -> HubResult<Self> {
        let device = DeviceInfo::new(config.zone_id(), config.name.clone(), ZONE_MODEL);
        let span = info_span!("zone", zone = %device.name);

        let sensor_grace = interval("sensor_grace_s", config.sensor_grace_s, config.sensor_grace())?;
        let window_warmup = interval(
            "window_warmup_s",
            config.window_warmup_s,
            config.window_warmup(),
        )?;

        let (regulator, pid_displays) = match config.regulator_type {
            RegulatorType::Pid => {
                let regulator = AnyRegulator::pid(PidSettings {
                    kp: config.pid.kp,
                    ki: config.pid.ki,
                    average_samples: config.pid.average_samples,
                })?;
                let pid_displays = PidDisplays {
                    kp: NumericIndicator::new(displays.numeric(&device, "Kp")),
                    ki: NumericIndicator::new(displays.numeric(&device, "Ki")),
                    proportional: NumericIndicator::new(displays.numeric(&device, "PID Proportional")),
                    integral: NumericIndicator::new(displays.numeric(&device, "PID Integral")),
                };
                (regulator, Some(pid_displays))
            }
            RegulatorType::Hysteresis => (AnyRegulator::hysteresis(), None),
        };

        let window = (!config.window_sensors.is_empty()).then(|| {
            ZoneWindow::new(config.window_sensors.clone())
                .with_warmup(window_warmup)
                .with_display(displays.boolean(&device, "Window Open"))
        });

        let sensor_tracker = OnlineTracker::new(format!("{} temperature", device.name), sensor_grace)
            .with_fault_display(displays.boolean(&device, "Sensor Fault"));

        let trv_open = (!config.trvs.is_empty())
            .then(|| BinaryIndicator::new(displays.boolean(&device, "TRV")));

        Ok(Self {
            climate: ZoneClimate::new(displays.climate(&device, "Climate")),
            control_fault: BinaryIndicator::new(displays.boolean(&device, "Control Fault")),
            regulator_active: BinaryIndicator::new(displays.boolean(&device, "Regulator Active")),
            output: NumericIndicator::new(displays.numeric(&device, "Output")),
            temperature_sensor: config.temperature_sensor.clone(),
            trvs: config.trvs.clone(),
            regulator,
            window,
            sensor_tracker,
            trv_open,
            pid_displays,
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

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn regulator(&self) -> &AnyRegulator {
        &self.regulator
    }

    pub fn climate(&self) -> &ZoneClimate {
        &self.climate
    }

    pub fn window(&self) -> Option<&ZoneWindow> {
        self.window.as_ref()
    }

    pub fn regulator_output(&self) -> f64 {
        self.regulator.output()
    }

    pub fn is_control_fault(&self) -> bool {
        self.control_fault.is_on()
    }

    pub fn is_sensor_fault(&self) -> bool {
        self.sensor_tracker.is_fault()
    }

    pub fn is_trv_open(&self) -> bool {
        self.trv_open.as_ref().is_some_and(BinaryIndicator::is_on)
    }

    /// Current reading of the zone's temperature sensor.
    pub fn current_temperature(&self, states: &dyn StateReader) -> Option<f64> {
        states.read(&self.temperature_sensor)
    }

    /// State consumed by circuit aggregation.
    pub fn report(&self, states: &dyn StateReader) -> ZoneReport {
        ZoneReport {
            current_temperature: self.current_temperature(states),
            target_temperature: Some(self.climate.target_temperature()),
            hvac_mode: Some(self.climate.hvac_mode()),
            preset: Some(self.climate.preset()),
            output: self.regulator.output(),
            trv_open: self.is_trv_open(),
        }
    }

    /// Seed the regulator and publish the initial state.
    pub fn initialize(&mut self) {
        self.regulator.initialize(self.climate.target_temperature());
        self.climate.publish();
        self.publish_coefficients();
    }

    /// Run one control step behind the zone fault boundary.
    ///
    /// A failure sets the sticky control fault and is logged once; the next
    /// step that completes clears it.
    pub fn control_temperature(
        &mut self,
        states: &dyn StateReader,
        services: &mut dyn ServiceBus,
        now: Instant,
    ) {
        let span = self.span.clone();
        let _entered = span.enter();

        match self.control_step(states, services, now) {
            Ok(()) => {
                if self.control_fault.set(false) {
                    info!("zone recovered from control fault");
                }
            }
            Err(err) => {
                if self.control_fault.set(true) {
                    error!(error = %err, "control step failed");
                }
            }
        }
    }

    fn control_step(
        &mut self,
        states: &dyn StateReader,
        services: &mut dyn ServiceBus,
        now: Instant,
    ) -> HubResult<()> {
        let current = self.current_temperature(states);

        // Grace period before a missing reading counts as a sensor fault.
        self.sensor_tracker.is_online(current.is_some(), now)?;

        self.recalculate_regulator_enabled(states, now);
        if self.regulator.enabled() {
            // A short sensor dropout keeps the previous output.
            if let Some(temperature) = current {
                self.climate.set_current_temperature(Some(temperature));
                self.regulator.calculate_output(temperature);
                self.publish_components();
            }
        }

        let output = self.regulator.output();
        self.output.set(output);

        // Leave the valves alone while paused.
        if !self.trvs.is_empty() && self.regulator.enabled() {
            self.operate_trvs(services, output)?;
        }

        Ok(())
    }

    /// Heat is allowed when the mode is heat, the sensor is not faulted and
    /// any configured window has settled closed.
    fn recalculate_regulator_enabled(&mut self, states: &dyn StateReader, now: Instant) {
        let window_allows = match self.window.as_mut() {
            Some(window) => window.should_heat(states, now),
            None => true,
        };
        let enabled = self.climate.hvac_mode() == HvacMode::Heat
            && !self.sensor_tracker.is_fault()
            && window_allows;

        self.regulator.set_enabled(enabled);
        self.regulator_active.set(enabled);
    }

    /// Command every TRV to heat when `output > 0`, otherwise off.
    pub fn operate_trvs(&mut self, services: &mut dyn ServiceBus, output: f64) -> HubResult<()> {
        let mode = if output > 0.0 { HvacMode::Heat } else { HvacMode::Off };
        for trv in &self.trvs {
            services.call(ServiceCall::ClimateSetHvacMode {
                target: trv.clone(),
                mode,
            })?;
        }
        if let Some(indicator) = self.trv_open.as_mut() {
            indicator.set(output > 0.0);
        }
        Ok(())
    }

    pub fn set_target_temperature(&mut self, value: f64) -> HubResult<()> {
        let applied = self.climate.set_target_temperature(value)?;
        self.regulator.set_target_temperature(applied);
        Ok(())
    }

    /// Takes effect on the next control step.
    pub fn set_hvac_mode(&mut self, mode: HvacMode) {
        self.climate.set_hvac_mode(mode);
    }

    /// Switch preset; stored preset values reset the regulator.
    pub fn set_preset_mode(&mut self, preset: &str) -> HubResult<()> {
        let Some(values) = self.climate.set_preset_mode(preset)? else {
            return Ok(());
        };

        if let Some(pid) = self.regulator.as_pid_mut() {
            if let Some(kp) = values.kp {
                pid.set_kp(kp)?;
            }
            if let Some(ki) = values.ki {
                pid.set_ki(ki)?;
            }
        }
        self.regulator
            .set_target_temperature(self.climate.target_temperature());
        self.regulator.reset();
        self.publish_coefficients();
        Ok(())
    }

    pub fn set_kp(&mut self, kp: f64) -> HubResult<()> {
        let changed = self.pid_mut()?.set_kp(kp)?;
        self.climate.save_pid_coefficients(changed.kp, changed.ki);
        self.publish_coefficients();
        Ok(())
    }

    pub fn set_ki(&mut self, ki: f64) -> HubResult<()> {
        let changed = self.pid_mut()?.set_ki(ki)?;
        self.climate.save_pid_coefficients(changed.kp, changed.ki);
        self.publish_coefficients();
        Ok(())
    }

    /// Apply a restore record. Also valid on a running zone: the regulator
    /// follows the restored setpoint.
    pub fn restore(&mut self, snapshot: &ZoneSnapshot) -> HubResult<()> {
        validate_zone_snapshot(snapshot)?;
        self.climate.restore(&snapshot.climate);
        self.regulator
            .set_target_temperature(self.climate.target_temperature());
        if let (Some(gains), Some(pid)) = (snapshot.pid, self.regulator.as_pid_mut()) {
            pid.set_coefficients(gains.kp, gains.ki)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            climate: self.climate.snapshot(),
            pid: self.regulator.as_pid().map(|pid| PidSnapshot {
                kp: pid.kp(),
                ki: pid.ki(),
            }),
        }
    }

    fn pid_mut(&mut self) -> HubResult<&mut cm_controls::PidRegulator> {
        let zone = self.device.name.clone();
        self.regulator
            .as_pid_mut()
            .ok_or(HubError::NotPid { zone })
    }

    fn publish_coefficients(&mut self) {
        if let (Some(pid), Some(displays)) = (self.regulator.as_pid(), self.pid_displays.as_mut()) {
            displays.kp.set(pid.kp());
            displays.ki.set(pid.ki());
        }
    }

    fn publish_components(&mut self) {
        if let (Some(pid), Some(displays)) = (self.regulator.as_pid(), self.pid_displays.as_mut()) {
            let components = pid.components();
            displays.proportional.set(components.proportional);
            displays.integral.set(components.integral);
        }
    }
}

fn interval(field: &str, value: f64, duration: Option<Duration>) -> HubResult<Duration> {
    duration.ok_or_else(|| {
        HubError::Config(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be a positive number of seconds".to_string(),
        })
    })
}
