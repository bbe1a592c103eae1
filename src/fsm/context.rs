//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the latest boiler temperature, the heater setpoint and pump
//! requests, the ready latch, configuration, and active faults.  The
//! controller applies the requests to the hardware after each poll.

use crate::config::MachineConfig;
use crate::control::heater::{HeaterSetpoint, ReadyLatch};
use crate::error::ControlFault;

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Inputs --
    /// Latest boiler temperature (°C).  Updated before events are dispatched.
    pub temperature_c: f32,

    // -- Outputs --
    /// Heater setpoint requested by the current state.
    pub heater: HeaterSetpoint,
    /// Pump relay request.
    pub pump_on: bool,

    // -- Configuration --
    pub config: MachineConfig,

    // -- Safety --
    /// Active fault bitmask (see `ControlFault::mask()`).
    pub fault_flags: u8,

    ready: ReadyLatch,
}

impl FsmContext {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            temperature_c: f32::NAN,
            heater: HeaterSetpoint::Off,
            pump_on: false,
            config,
            fault_flags: 0,
            ready: ReadyLatch::default(),
        }
    }

    /// Select a heater setpoint and immediately re-evaluate readiness
    /// against the current temperature.
    pub fn request_heater(&mut self, setpoint: HeaterSetpoint) {
        self.heater = setpoint;
        self.ready.retarget(setpoint);
        self.refresh_ready();
    }

    /// The target temperatures were edited.  Readiness must be earned
    /// again against the new value.
    pub fn targets_changed(&mut self) {
        self.ready.reset();
        self.refresh_ready();
    }

    /// Feed the current temperature to the ready latch.
    pub fn refresh_ready(&mut self) -> bool {
        let target = self.heater.target_c(&self.config);
        self.ready
            .observe(self.temperature_c, target, self.config.ready_band_c)
    }

    /// True once the boiler has reached the current setpoint.
    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Target temperature for the current setpoint, if the heater is on.
    pub fn target_c(&self) -> Option<f32> {
        self.heater.target_c(&self.config)
    }

    /// Returns `true` if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    /// Check whether a specific fault flag is set.
    pub fn has_fault(&self, fault: ControlFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }
}
