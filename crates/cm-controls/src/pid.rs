//! PID transfer function.
//!
//! Sampled/digital PID with:
//! - Proportional action on error
//! - Integral accumulated as `ki * e * dt`, clamped to the output limits (anti-windup)
//! - Derivative on measurement, so setpoint changes do not kick the output
//! - Output clamping

use crate::error::{ControlError, ControlResult};

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
    /// Desired process value.
    pub setpoint: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
}

impl Pid {
    /// Create a new PID controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `kd` - Derivative gain
    /// * `setpoint` - Initial setpoint
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        setpoint: f64,
        out_min: f64,
        out_max: f64,
    ) -> ControlResult<Self> {
        validate_gain(kp, "kp must be finite and non-negative")?;
        validate_gain(ki, "ki must be finite and non-negative")?;
        validate_gain(kd, "kd must be finite and non-negative")?;
        if !(out_min < out_max) {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ki,
            kd,
            setpoint,
            out_min,
            out_max,
        })
    }

    /// Compute controller output.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral, last input)
    /// * `input` - Process variable (measured value)
    /// * `dt` - Time since last update (seconds)
    ///
    /// # Returns
    ///
    /// Updated state and output value.
    pub fn update(&self, state: &PidState, input: f64, dt: f64) -> (PidState, f64) {
        let dt = if dt > 0.0 { dt } else { f64::EPSILON };

        let error = self.setpoint - input;
        let d_input = state.last_input.map_or(0.0, |last| input - last);

        let proportional = self.kp * error;

        // Integral is stored already scaled by ki, so changing ki does not
        // rescale the accumulated history.
        let integral = (state.integral + self.ki * error * dt).clamp(self.out_min, self.out_max);

        let derivative = -self.kd * d_input / dt;

        let output = (proportional + integral + derivative).clamp(self.out_min, self.out_max);

        let new_state = PidState {
            integral,
            last_input: Some(input),
            last_output: Some(output),
            components: PidComponents {
                proportional,
                integral,
                derivative,
            },
        };

        (new_state, output)
    }
}

fn validate_gain(value: f64, what: &'static str) -> ControlResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ControlError::InvalidArg { what })
    }
}

/// Contribution of each term to the last computed output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidComponents {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

/// PID controller state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PidState {
    /// Integral term (already multiplied by `ki`).
    pub integral: f64,
    /// Input seen on the previous update, for derivative on measurement.
    pub last_input: Option<f64>,
    /// Output of the previous update.
    pub last_output: Option<f64>,
    /// Term breakdown of the previous update.
    pub components: PidComponents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_creation() {
        let pid = Pid::new(0.5, 0.001, 0.0, 22.0, -1.0, 1.0).unwrap();
        assert_eq!(pid.kp, 0.5);
        assert_eq!(pid.setpoint, 22.0);
    }

    #[test]
    fn pid_proportional_only() {
        let pid = Pid::new(0.1, 0.0, 0.0, 22.0, -1.0, 1.0).unwrap();
        let (state, output) = pid.update(&PidState::default(), 20.0, 1.0);
        // Error = 2.0, P = 0.2
        assert!((output - 0.2).abs() < 1e-12);
        assert!((state.components.proportional - 0.2).abs() < 1e-12);
        assert_eq!(state.components.integral, 0.0);
    }

    #[test]
    fn pid_output_clamping() {
        let pid = Pid::new(10.0, 0.0, 0.0, 22.0, -1.0, 1.0).unwrap();
        let (_, output) = pid.update(&PidState::default(), 0.0, 1.0);
        assert_eq!(output, 1.0);
        let (_, output) = pid.update(&PidState::default(), 40.0, 1.0);
        assert_eq!(output, -1.0);
    }

    #[test]
    fn pid_integral_accumulates_and_clamps() {
        let pid = Pid::new(0.0, 0.1, 0.0, 22.0, -1.0, 1.0).unwrap();
        let mut state = PidState::default();

        let (next, output) = pid.update(&state, 21.0, 1.0);
        assert!((output - 0.1).abs() < 1e-12);
        state = next;

        for _ in 0..100 {
            let (next, _) = pid.update(&state, 21.0, 1.0);
            state = next;
        }
        // Anti-windup keeps the integral inside the output limits
        assert_eq!(state.integral, 1.0);
    }

    #[test]
    fn pid_derivative_on_measurement() {
        let pid = Pid::new(0.0, 0.0, 1.0, 22.0, -10.0, 10.0).unwrap();
        let (state, first) = pid.update(&PidState::default(), 20.0, 1.0);
        // No previous input, no derivative kick
        assert_eq!(first, 0.0);

        let (_, output) = pid.update(&state, 21.0, 1.0);
        // Rising measurement pulls the output down
        assert!((output + 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_pid_params() {
        assert!(Pid::new(-1.0, 0.0, 0.0, 20.0, -1.0, 1.0).is_err());
        assert!(Pid::new(1.0, f64::NAN, 0.0, 20.0, -1.0, 1.0).is_err());
        assert!(Pid::new(1.0, 0.0, 0.0, 20.0, 1.0, -1.0).is_err());
    }
}
