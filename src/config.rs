//! Machine configuration parameters
//!
//! All tunable parameters for the VBM controller.  The boot path starts
//! from [`MachineConfig::default`] and overlays whatever the parameter
//! store holds; commands received at runtime mutate the controller's
//! copy and persist the single changed value.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Highest setpoint the controller accepts from a command (°C).
pub const SETPOINT_LIMIT_C: f32 = 160.0;

/// Minutes in a day; schedule times live in `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    // --- Boiler ---
    /// Brew setpoint (°C)
    pub brew_setpoint_c: f32,
    /// Steam setpoint (°C)
    pub steam_setpoint_c: f32,
    /// Absolute ceiling applied to every heater target (°C)
    pub max_temp_c: f32,
    /// Half-width of the "at temperature" band (°C)
    pub ready_band_c: f32,
    /// Margin above `max_temp_c` at which the safety supervisor trips (°C)
    pub over_temp_margin_c: f32,

    // --- Heater control ---
    pub pid_kp: f32,
    pub pid_ki: f32,
    pub pid_kd: f32,
    /// Time-proportioning window length (ms)
    pub relay_window_ms: u32,

    // --- Button ---
    /// Hold time for a ShortHold classification (ms)
    pub short_hold_ms: u32,
    /// Hold time for a LongHold classification (ms)
    pub long_hold_ms: u32,
    /// Minimum quiet time after a release before a new press counts (ms)
    pub debounce_ms: u32,
    /// Button input is ignored until this long after boot (ms)
    pub startup_grace_ms: u32,
    /// A press held this long is reported as a stuck contact (ms)
    pub stuck_after_ms: u32,

    // --- Schedule ---
    /// Weekday bitmask, bit 0 = Sunday … bit 6 = Saturday
    pub schedule_days: u8,
    /// Daily turn-on time in minutes from midnight (0 = unset)
    pub turn_on_at_min: u16,
    /// Daily turn-off time in minutes from midnight (0 = unset)
    pub turn_off_at_min: u16,

    // --- Timing ---
    /// Period of one status LED blink pattern (ms)
    pub blink_interval_ms: u32,
    /// Control loop poll interval (ms)
    pub poll_interval_ms: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            // Boiler
            brew_setpoint_c: 100.0,
            steam_setpoint_c: 130.0,
            max_temp_c: 135.0,
            ready_band_c: 2.0,
            over_temp_margin_c: 10.0,

            // Heater control
            pid_kp: 0.05,
            pid_ki: 0.0,
            pid_kd: 0.3,
            relay_window_ms: 50,

            // Button
            short_hold_ms: 2000,
            long_hold_ms: 5000,
            debounce_ms: 50,
            startup_grace_ms: 1000,
            stuck_after_ms: 30_000,

            // Schedule (unset)
            schedule_days: 0,
            turn_on_at_min: 0,
            turn_off_at_min: 0,

            // Timing
            blink_interval_ms: 2500,
            poll_interval_ms: 10,
        }
    }
}

/// Values read back from the parameter store.  Every field is optional:
/// a missing key keeps the compiled-in default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoredParameters {
    pub brew_setpoint_c: Option<f32>,
    pub steam_setpoint_c: Option<f32>,
    pub schedule_days: Option<u8>,
    pub turn_on_at_min: Option<u16>,
    pub turn_off_at_min: Option<u16>,
}

impl MachineConfig {
    /// Overlay persisted values.  Values that fail validation are skipped
    /// so a corrupted slot cannot push the boiler past its ceiling.
    pub fn apply(&mut self, stored: &StoredParameters) {
        if let Some(sp) = stored.brew_setpoint_c {
            match validate_setpoint(sp) {
                Ok(()) => self.brew_setpoint_c = sp,
                Err(e) => log::warn!("Config: stored brew setpoint ignored ({})", e),
            }
        }
        if let Some(sp) = stored.steam_setpoint_c {
            match validate_setpoint(sp) {
                Ok(()) => self.steam_setpoint_c = sp,
                Err(e) => log::warn!("Config: stored steam setpoint ignored ({})", e),
            }
        }
        if let Some(days) = stored.schedule_days {
            self.schedule_days = days & 0x7F;
        }
        if let Some(on) = stored.turn_on_at_min {
            self.turn_on_at_min = on % MINUTES_PER_DAY;
        }
        if let Some(off) = stored.turn_off_at_min {
            self.turn_off_at_min = off % MINUTES_PER_DAY;
        }
    }

    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_setpoint(self.brew_setpoint_c)?;
        validate_setpoint(self.steam_setpoint_c)?;
        if !(50.0..=SETPOINT_LIMIT_C).contains(&self.max_temp_c) {
            return Err(ConfigError::ValidationFailed("max_temp_c must be 50–160"));
        }
        if !(0.1..=10.0).contains(&self.ready_band_c) {
            return Err(ConfigError::ValidationFailed("ready_band_c must be 0.1–10"));
        }
        if self.relay_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("relay_window_ms must be > 0"));
        }
        if self.short_hold_ms >= self.long_hold_ms {
            return Err(ConfigError::ValidationFailed(
                "short_hold_ms must be < long_hold_ms",
            ));
        }
        if self.long_hold_ms >= self.stuck_after_ms {
            return Err(ConfigError::ValidationFailed(
                "long_hold_ms must be < stuck_after_ms",
            ));
        }
        if self.blink_interval_ms < 8 {
            return Err(ConfigError::ValidationFailed("blink_interval_ms must be >= 8"));
        }
        if self.turn_on_at_min >= MINUTES_PER_DAY || self.turn_off_at_min >= MINUTES_PER_DAY {
            return Err(ConfigError::ValidationFailed("schedule time must be < 1440"));
        }
        Ok(())
    }
}

/// A setpoint must be a finite, positive temperature no hotter than
/// [`SETPOINT_LIMIT_C`].
pub fn validate_setpoint(celsius: f32) -> Result<(), ConfigError> {
    if !celsius.is_finite() || !(0.0..=SETPOINT_LIMIT_C).contains(&celsius) {
        return Err(ConfigError::ValidationFailed("setpoint must be 0–160 °C"));
    }
    Ok(())
}
