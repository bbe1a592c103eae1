//! Heater setpoint selection, ready latch, and relay drive.

use serde::{Deserialize, Serialize};

use super::ContinuousController;
use super::relay_window::RelayWindow;
use crate::config::MachineConfig;

/// Which temperature the boiler should hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeaterSetpoint {
    #[default]
    Off,
    BrewTemp,
    SteamTemp,
}

impl HeaterSetpoint {
    /// Target temperature for this setpoint, capped at `max_temp_c`.
    /// `None` when the heater is off.
    pub fn target_c(self, cfg: &MachineConfig) -> Option<f32> {
        let raw = match self {
            Self::Off => return None,
            Self::BrewTemp => cfg.brew_setpoint_c,
            Self::SteamTemp => cfg.steam_setpoint_c,
        };
        Some(raw.min(cfg.max_temp_c))
    }
}

/// "At temperature" latch.
///
/// Latches the first time the measurement lands inside the band around
/// the target and stays latched until the setpoint changes, so a dip
/// while pulling a shot does not bounce the machine back to heating.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadyLatch {
    setpoint: HeaterSetpoint,
    latched: bool,
}

impl ReadyLatch {
    /// Point the latch at a new setpoint.  Clears the latch only when the
    /// setpoint actually changes.  Returns `true` if it changed.
    pub fn retarget(&mut self, setpoint: HeaterSetpoint) -> bool {
        if setpoint == self.setpoint {
            return false;
        }
        self.setpoint = setpoint;
        self.latched = false;
        true
    }

    /// Feed a measurement.  Returns the latch state afterwards.
    pub fn observe(&mut self, measured: f32, target: Option<f32>, band: f32) -> bool {
        if self.setpoint == HeaterSetpoint::Off {
            self.latched = false;
            return false;
        }
        if let Some(target) = target {
            if measured.is_finite() && (target - band..=target + band).contains(&measured) {
                self.latched = true;
            }
        }
        self.latched
    }

    pub fn is_ready(&self) -> bool {
        self.latched && self.setpoint != HeaterSetpoint::Off
    }

    /// Drop the latch without changing the setpoint (target value edited).
    pub fn reset(&mut self) {
        self.latched = false;
    }

    pub fn setpoint(&self) -> HeaterSetpoint {
        self.setpoint
    }
}

/// Boiler heater: continuous controller feeding a relay window.
pub struct Heater<C> {
    controller: C,
    window: RelayWindow,
    setpoint: HeaterSetpoint,
    last_ms: Option<u32>,
    relay_on: bool,
}

impl<C: ContinuousController> Heater<C> {
    pub fn new(controller: C, window_ms: u32) -> Self {
        Self {
            controller,
            window: RelayWindow::new(window_ms),
            setpoint: HeaterSetpoint::Off,
            last_ms: None,
            relay_on: false,
        }
    }

    /// Compute the relay level for this cycle.
    ///
    /// A setpoint change resets the controller and starts a new window.
    /// A non-finite measurement keeps the relay off.
    pub fn update(
        &mut self,
        now_ms: u32,
        measured: f32,
        setpoint: HeaterSetpoint,
        cfg: &MachineConfig,
    ) -> bool {
        if setpoint != self.setpoint {
            self.controller.reset();
            self.window.reset();
            self.last_ms = None;
            self.setpoint = setpoint;
        }

        let Some(target) = setpoint.target_c(cfg) else {
            self.relay_on = false;
            return false;
        };
        if !measured.is_finite() {
            self.relay_on = false;
            return false;
        }

        let dt_secs = self
            .last_ms
            .map_or(0.0, |last| now_ms.wrapping_sub(last) as f32 / 1000.0);
        self.last_ms = Some(now_ms);

        let duty = self.controller.compute(measured, target, dt_secs);
        self.relay_on = self.window.compute(now_ms, measured, target, duty);
        self.relay_on
    }

    /// De-energise immediately and drop controller state.
    pub fn force_off(&mut self) {
        self.controller.reset();
        self.window.reset();
        self.last_ms = None;
        self.relay_on = false;
    }

    pub fn relay_on(&self) -> bool {
        self.relay_on
    }

    pub fn setpoint(&self) -> HeaterSetpoint {
        self.setpoint
    }
}
