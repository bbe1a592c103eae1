//! Inbound commands to the machine controller.
//!
//! These represent actions requested by the outside world (companion app,
//! serial console, tests) that the
//! [`MachineController`](super::controller::MachineController) interprets
//! and acts upon.  Parsing the wire format is the transport's job; it
//! hands us a command keyword plus an optional numeric value and
//! [`AppCommand::from_raw`] turns that into a typed command.

use log::warn;

use crate::config::{validate_setpoint, MINUTES_PER_DAY};
use crate::error::CommandError;
use crate::fsm::MachineState;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Start heating to the brew setpoint.
    TurnOn,

    /// Switch everything off.
    TurnOff,

    /// Change and persist the brew setpoint (°C).
    SetBrewSetpoint(f32),

    /// Change and persist the steam setpoint (°C).
    SetSteamSetpoint(f32),

    /// Turn off after the given number of minutes.  Zero cancels.
    TurnOffIn { minutes: u32 },

    /// Change and persist the schedule weekday mask (bit 0 = Sunday).
    SetScheduleDays(u8),

    /// Change and persist the daily on-time (minutes after midnight, 0 = unset).
    SetTurnOnAt(u16),

    /// Change and persist the daily off-time (minutes after midnight, 0 = unset).
    SetTurnOffAt(u16),

    /// Set the wall clock.
    SetUnixTime(i64),

    /// Emit a [`ParameterReport`](super::events::ParameterReport).
    ReportParameters,

    /// Force the FSM into a specific state (debug / testing only).
    ForceState(MachineState),
}

impl AppCommand {
    /// Build a command from a decoded keyword and its numeric argument.
    ///
    /// Keywords are matched case-insensitively after trimming whitespace.
    pub fn from_raw(kind: &str, value: Option<f64>) -> Result<Self, CommandError> {
        let kind = kind.trim().to_ascii_lowercase();
        let cmd = match kind.as_str() {
            "turnon" => Self::TurnOn,
            "turnoff" => Self::TurnOff,
            "updateapp" | "report" => Self::ReportParameters,
            "setpointbrew" => Self::SetBrewSetpoint(setpoint(value)?),
            "setpointsteam" => Self::SetSteamSetpoint(setpoint(value)?),
            "durationtimer" => Self::TurnOffIn {
                minutes: integer(value, u64::from(u32::MAX))? as u32,
            },
            "daystimer1" => Self::SetScheduleDays(integer(value, 0x7F)? as u8),
            "timer1on" => Self::SetTurnOnAt(minute_of_day(value)?),
            "timer1off" => Self::SetTurnOffAt(minute_of_day(value)?),
            "setunixtime" => Self::SetUnixTime(
                i64::try_from(integer(value, i64::MAX as u64)?)
                    .map_err(|_| CommandError::OutOfRange)?,
            ),
            _ => return Err(CommandError::UnknownKind),
        };
        Ok(cmd)
    }
}

fn setpoint(value: Option<f64>) -> Result<f32, CommandError> {
    let v = value.ok_or(CommandError::MissingValue)? as f32;
    validate_setpoint(v).map_err(|_| CommandError::OutOfRange)?;
    Ok(v)
}

/// Minutes past the end of the day wrap around rather than fail.
fn minute_of_day(value: Option<f64>) -> Result<u16, CommandError> {
    let minute = integer(value, u64::from(u16::MAX))? as u16;
    if minute >= MINUTES_PER_DAY {
        warn!("Command: minute {} out of range, wrapping", minute);
    }
    Ok(minute % MINUTES_PER_DAY)
}

/// Non-negative whole number no larger than `max`.
fn integer(value: Option<f64>, max: u64) -> Result<u64, CommandError> {
    let v = value.ok_or(CommandError::MissingValue)?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
        return Err(CommandError::OutOfRange);
    }
    // Compare as u64: `max as f64` rounds i64::MAX up to 2^63.
    let n = v as u64;
    if n > max {
        return Err(CommandError::OutOfRange);
    }
    Ok(n)
}
