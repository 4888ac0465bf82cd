//! Temperature regulators.
//!
//! A regulator maps the current temperature of a zone to a heating output in
//! `[0, 1]`. Two variants are provided:
//! - **PID**: reports the mean of its last `average_samples` PID outputs,
//!   trading latency for a calm actuator signal
//! - **Hysteresis**: two-point control around the target with a 1 degree band
//!   on either side; its output only means "heat requested" (any value > 0)

use std::collections::VecDeque;

use crate::error::{ControlError, ControlResult};
use crate::pid::{Pid, PidComponents, PidState};

/// Capability shared by every regulator.
pub trait Regulator {
    /// Prepare the regulator for the first tick.
    fn initialize(&mut self, target_temperature: f64);

    /// Feed one temperature sample. No-op while disabled.
    fn calculate_output(&mut self, current_temperature: f64);

    /// Last computed output; zero while disabled or before the first sample.
    fn output(&self) -> f64;

    fn enabled(&self) -> bool;

    /// Disabling clears any running state so re-enabling starts cold.
    fn set_enabled(&mut self, enabled: bool);

    fn target_temperature(&self) -> f64;

    fn set_target_temperature(&mut self, value: f64);

    /// Clear running state without touching `enabled`.
    fn reset(&mut self);
}

/// Default number of PID samples averaged into the reported output.
pub const DEFAULT_AVERAGE_SAMPLES: usize = 20;
/// Default proportional gain.
pub const DEFAULT_KP: f64 = 0.5;
/// Default integral gain.
pub const DEFAULT_KI: f64 = 0.001;
/// PID sample period, matching the hub tick.
pub const PID_SAMPLE_PERIOD_S: f64 = 1.0;

/// User-tunable settings of a PID regulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidSettings {
    pub kp: f64,
    pub ki: f64,
    pub average_samples: usize,
}

impl Default for PidSettings {
    fn default() -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            average_samples: DEFAULT_AVERAGE_SAMPLES,
        }
    }
}

/// Gains after a user change, to be stored by the owner into the active preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientsChanged {
    pub kp: f64,
    pub ki: f64,
}

/// PID regulator with a rolling output average.
#[derive(Debug, Clone)]
pub struct PidRegulator {
    pid: Pid,
    state: PidState,
    history: VecDeque<f64>,
    average_samples: usize,
    enabled: bool,
}

impl PidRegulator {
    pub fn new(settings: PidSettings) -> ControlResult<Self> {
        if settings.average_samples == 0 {
            return Err(ControlError::InvalidArg {
                what: "average_samples must be at least 1",
            });
        }
        let pid = Pid::new(settings.kp, settings.ki, 0.0, 0.0, -1.0, 1.0)?;
        Ok(Self {
            pid,
            state: PidState::default(),
            history: VecDeque::with_capacity(settings.average_samples),
            average_samples: settings.average_samples,
            enabled: true,
        })
    }

    pub fn kp(&self) -> f64 {
        self.pid.kp
    }

    pub fn ki(&self) -> f64 {
        self.pid.ki
    }

    /// Change the proportional gain. Takes effect on the next sample; the
    /// averaging window is kept.
    pub fn set_kp(&mut self, kp: f64) -> ControlResult<CoefficientsChanged> {
        self.set_coefficients(kp, self.pid.ki)
    }

    /// Change the integral gain. Takes effect on the next sample.
    pub fn set_ki(&mut self, ki: f64) -> ControlResult<CoefficientsChanged> {
        self.set_coefficients(self.pid.kp, ki)
    }

    pub fn set_coefficients(&mut self, kp: f64, ki: f64) -> ControlResult<CoefficientsChanged> {
        let checked = Pid::new(kp, ki, self.pid.kd, self.pid.setpoint, self.pid.out_min, self.pid.out_max)?;
        self.pid = checked;
        Ok(CoefficientsChanged { kp, ki })
    }

    pub fn average_samples(&self) -> usize {
        self.average_samples
    }

    /// Samples currently retained in the averaging window.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Term breakdown of the last PID sample.
    pub fn components(&self) -> PidComponents {
        self.state.components
    }
}

impl Regulator for PidRegulator {
    fn initialize(&mut self, target_temperature: f64) {
        self.pid.setpoint = target_temperature;
        self.state = PidState::default();
        self.history.clear();
    }

    fn calculate_output(&mut self, current_temperature: f64) {
        if !self.enabled {
            return;
        }

        let (state, sample) = self.pid.update(&self.state, current_temperature, PID_SAMPLE_PERIOD_S);
        self.state = state;

        if self.history.len() == self.average_samples {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    fn output(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        cm_core::mean(self.samples()).unwrap_or(0.0)
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            // Cold start: forget the integral and last input
            self.state = PidState::default();
        } else {
            self.history.clear();
        }
    }

    fn target_temperature(&self) -> f64 {
        self.pid.setpoint
    }

    fn set_target_temperature(&mut self, value: f64) {
        self.pid.setpoint = value;
    }

    fn reset(&mut self) {
        self.state = PidState::default();
        self.history.clear();
    }
}

/// Half-width of the hysteresis band, in degrees.
pub const HYSTERESIS_BAND: f64 = 1.0;
/// Output reported while heat is requested.
pub const HYSTERESIS_HEAT_OUTPUT: f64 = 0.05;

/// Two-point regulator.
///
/// Requests heat once the temperature falls to `target - 1` and stops once it
/// reaches `target + 1`. Inside the band the previous decision holds.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisRegulator {
    target: f64,
    enabled: bool,
    output: f64,
}

impl Default for HysteresisRegulator {
    fn default() -> Self {
        Self::new()
    }
}

impl HysteresisRegulator {
    pub fn new() -> Self {
        Self {
            target: 0.0,
            enabled: true,
            output: 0.0,
        }
    }

    pub fn is_heating(&self) -> bool {
        self.output > 0.0
    }
}

impl Regulator for HysteresisRegulator {
    fn initialize(&mut self, target_temperature: f64) {
        self.target = target_temperature;
    }

    fn calculate_output(&mut self, current_temperature: f64) {
        if !self.enabled {
            return;
        }

        if current_temperature <= self.target - HYSTERESIS_BAND {
            self.output = HYSTERESIS_HEAT_OUTPUT;
        } else if current_temperature >= self.target + HYSTERESIS_BAND {
            self.output = 0.0;
        }
    }

    fn output(&self) -> f64 {
        if self.enabled { self.output } else { 0.0 }
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.output = 0.0;
        }
    }

    fn target_temperature(&self) -> f64 {
        self.target
    }

    fn set_target_temperature(&mut self, value: f64) {
        self.target = value;
    }

    fn reset(&mut self) {
        self.output = 0.0;
    }
}

/// Regulator selected by zone configuration.
#[derive(Debug, Clone)]
pub enum AnyRegulator {
    Pid(PidRegulator),
    Hysteresis(HysteresisRegulator),
}

impl AnyRegulator {
    pub fn pid(settings: PidSettings) -> ControlResult<Self> {
        PidRegulator::new(settings).map(Self::Pid)
    }

    pub fn hysteresis() -> Self {
        Self::Hysteresis(HysteresisRegulator::new())
    }

    pub fn as_pid(&self) -> Option<&PidRegulator> {
        match self {
            Self::Pid(pid) => Some(pid),
            Self::Hysteresis(_) => None,
        }
    }

    pub fn as_pid_mut(&mut self) -> Option<&mut PidRegulator> {
        match self {
            Self::Pid(pid) => Some(pid),
            Self::Hysteresis(_) => None,
        }
    }

    fn inner(&self) -> &dyn Regulator {
        match self {
            Self::Pid(pid) => pid,
            Self::Hysteresis(hysteresis) => hysteresis,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regulator {
        match self {
            Self::Pid(pid) => pid,
            Self::Hysteresis(hysteresis) => hysteresis,
        }
    }
}

impl Regulator for AnyRegulator {
    fn initialize(&mut self, target_temperature: f64) {
        self.inner_mut().initialize(target_temperature);
    }

    fn calculate_output(&mut self, current_temperature: f64) {
        self.inner_mut().calculate_output(current_temperature);
    }

    fn output(&self) -> f64 {
        self.inner().output()
    }

    fn enabled(&self) -> bool {
        self.inner().enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.inner_mut().set_enabled(enabled);
    }

    fn target_temperature(&self) -> f64 {
        self.inner().target_temperature()
    }

    fn set_target_temperature(&mut self, value: f64) {
        self.inner_mut().set_target_temperature(value);
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(average_samples: usize) -> PidRegulator {
        let mut regulator = PidRegulator::new(PidSettings {
            kp: 0.1,
            ki: 0.0,
            average_samples,
        })
        .unwrap();
        regulator.initialize(22.0);
        regulator
    }

    #[test]
    fn pid_output_is_zero_before_first_sample() {
        let regulator = pid(20);
        assert_eq!(regulator.output(), 0.0);
    }

    #[test]
    fn pid_output_is_window_mean() {
        let mut regulator = pid(3);
        // P-only with kp=0.1: samples are 0.1 * (22 - t)
        regulator.calculate_output(21.0); // 0.1
        regulator.calculate_output(20.0); // 0.2
        assert!((regulator.output() - 0.15).abs() < 1e-12);

        regulator.calculate_output(19.0); // 0.3
        regulator.calculate_output(18.0); // 0.4, evicts 0.1
        assert_eq!(regulator.samples().count(), 3);
        assert!((regulator.output() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn pid_disable_clears_window() {
        let mut regulator = pid(20);
        regulator.calculate_output(20.0);
        assert!(regulator.output() > 0.0);

        regulator.set_enabled(false);
        assert_eq!(regulator.output(), 0.0);
        regulator.calculate_output(20.0);
        assert_eq!(regulator.samples().count(), 0);

        regulator.set_enabled(true);
        assert_eq!(regulator.output(), 0.0);
    }

    #[test]
    fn pid_gain_change_keeps_window() {
        let mut regulator = pid(20);
        regulator.calculate_output(21.0); // 0.1
        let changed = regulator.set_kp(0.3).unwrap();
        assert_eq!(changed, CoefficientsChanged { kp: 0.3, ki: 0.0 });

        regulator.calculate_output(21.0); // 0.3
        assert_eq!(regulator.samples().count(), 2);
        assert!((regulator.output() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn pid_rejects_bad_settings() {
        assert!(
            PidRegulator::new(PidSettings {
                average_samples: 0,
                ..PidSettings::default()
            })
            .is_err()
        );
        let mut regulator = pid(20);
        assert!(regulator.set_ki(-1.0).is_err());
        assert_eq!(regulator.ki(), 0.0);
    }

    #[test]
    fn pid_target_change_applies_to_next_sample() {
        let mut regulator = pid(1);
        regulator.set_target_temperature(25.0);
        assert_eq!(regulator.target_temperature(), 25.0);
        regulator.calculate_output(24.0);
        assert!((regulator.output() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn hysteresis_band() {
        let mut regulator = HysteresisRegulator::new();
        regulator.initialize(20.0);

        regulator.calculate_output(19.5);
        assert_eq!(regulator.output(), 0.0);

        regulator.calculate_output(19.0);
        assert_eq!(regulator.output(), HYSTERESIS_HEAT_OUTPUT);

        regulator.calculate_output(20.9);
        assert_eq!(regulator.output(), HYSTERESIS_HEAT_OUTPUT);

        regulator.calculate_output(21.0);
        assert_eq!(regulator.output(), 0.0);

        regulator.calculate_output(19.1);
        assert_eq!(regulator.output(), 0.0);
    }

    #[test]
    fn hysteresis_disable_is_cold() {
        let mut regulator = HysteresisRegulator::new();
        regulator.initialize(20.0);
        regulator.calculate_output(18.0);
        assert!(regulator.is_heating());

        regulator.set_enabled(false);
        assert_eq!(regulator.output(), 0.0);
        regulator.set_enabled(true);
        assert_eq!(regulator.output(), 0.0);
    }

    #[test]
    fn any_regulator_dispatch() {
        let mut regulator = AnyRegulator::hysteresis();
        regulator.initialize(20.0);
        regulator.calculate_output(10.0);
        assert_eq!(regulator.output(), HYSTERESIS_HEAT_OUTPUT);
        assert!(regulator.as_pid().is_none());

        let mut regulator = AnyRegulator::pid(PidSettings::default()).unwrap();
        regulator.initialize(22.0);
        regulator.calculate_output(18.0);
        assert!(regulator.output() > 0.0);
        assert!(regulator.as_pid_mut().is_some());
    }
}
