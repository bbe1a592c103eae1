//! PID controller for boiler temperature
//!
//! Produces a heater duty fraction that the relay window turns into
//! on/off time.  The setpoint is supplied on every call so the same
//! instance follows brew and steam targets.

use super::ContinuousController;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    integral: f32,
    prev_error: Option<f32>,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: None,
            output_min: 0.0,
            output_max: 1.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Replace the gains without dropping accumulated state.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }
}

impl ContinuousController for PidController {
    fn compute(&mut self, measured: f32, target: f32, dt_secs: f32) -> f32 {
        if !measured.is_finite() || !target.is_finite() {
            return self.output_min;
        }
        let error = target - measured;

        // Proportional
        let p = self.kp * error;

        // Integral (with anti-windup)
        self.integral += error * dt_secs;
        let i = self.ki * self.integral;

        // Derivative; skipped on the first sample so a fresh setpoint
        // does not produce a kick.
        let d = match self.prev_error {
            Some(prev) if dt_secs > 0.0 => self.kd * (error - prev) / dt_secs,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        // Anti-windup: if output is saturated, stop integrating
        if output >= self.output_max || output <= self.output_min {
            self.integral -= error * dt_secs;
        }

        output
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}
