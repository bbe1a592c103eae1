//! Safety supervisor.
//!
//! The supervisor runs **every poll before the FSM** and produces a
//! fault bitmask.  Any set bit forces the heater relay off for that
//! poll and sends the machine to `Error`.
//!
//! ## Fault lifecycle
//!
//! 1. A condition triggers a fault (e.g. boiler over temperature).
//! 2. The supervisor sets the corresponding bit.
//! 3. The controller dispatches `MachineEvent::Fault`; `error_enter`
//!    drops the heater setpoint and stops the pump.
//! 4. Each poll the supervisor re-evaluates.  Condition faults clear on
//!    their own; latched faults (button sequence) clear when the machine
//!    is turned off.
//! 5. The machine stays in `Error` until an explicit off request.

use crate::config::MachineConfig;
use crate::error::ControlFault;
use log::{error, info};

/// Lowest temperature a working boiler sensor can report (°C).
const MIN_PLAUSIBLE_C: f32 = -20.0;
/// Highest temperature a working boiler sensor can report (°C).
const MAX_PLAUSIBLE_C: f32 = 250.0;
/// Consecutive bad readings before the sensor is declared faulty.
const SENSOR_FAULT_SAMPLES: u8 = 3;

/// Safety supervisor.
pub struct SafetySupervisor {
    trip_c: f32,
    /// Fault bitmask.
    faults: u8,
    /// Faults that persist until cleared explicitly.
    latched: u8,
    bad_samples: u8,
}

impl SafetySupervisor {
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            trip_c: config.max_temp_c + config.over_temp_margin_c,
            faults: 0,
            latched: 0,
            bad_samples: 0,
        }
    }

    /// Evaluate all safety conditions against the latest temperature.
    /// Returns the updated fault bitmask.
    pub fn evaluate(&mut self, temperature_c: f32) -> u8 {
        // ── Sensor plausibility ───────────────────────────────────
        let implausible = !temperature_c.is_finite()
            || !(MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C).contains(&temperature_c);
        self.bad_samples = if implausible {
            self.bad_samples.saturating_add(1)
        } else {
            0
        };
        self.eval_fault(
            ControlFault::SensorFault,
            self.bad_samples >= SENSOR_FAULT_SAMPLES,
        );

        // ── Temperature ceiling ───────────────────────────────────
        self.eval_fault(
            ControlFault::OverTemperature,
            temperature_c.is_finite() && temperature_c > self.trip_c,
        );

        self.faults | self.latched
    }

    /// Record a fault that persists until [`clear_latched`](Self::clear_latched).
    pub fn latch(&mut self, fault: ControlFault) {
        if self.latched & fault.mask() == 0 {
            error!("SAFETY FAULT LATCHED: {fault}");
        }
        self.latched |= fault.mask();
    }

    /// Drop latched faults (machine turned off).
    pub fn clear_latched(&mut self) {
        if self.latched != 0 {
            info!("SAFETY: latched faults cleared (0b{:08b})", self.latched);
        }
        self.latched = 0;
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults | self.latched
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults() != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: ControlFault) -> bool {
        self.faults() & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: ControlFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SAFETY FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
