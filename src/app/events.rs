//! Outbound application events.
//!
//! The [`MachineController`](super::controller::MachineController) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them — log to serial, forward
//! to the companion app, etc.

use serde::Serialize;

use crate::fsm::MachineState;
use crate::status::StatusCode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries initial state).
    Started(MachineState),

    /// The FSM transitioned between states.
    StateChanged { from: MachineState, to: MachineState },

    /// The machine switched between off and on.
    TurnedOn(bool),

    /// The brew lever moved; carries the new position.
    Brewing(bool),

    /// Answer to a parameter report request.
    Parameters(ParameterReport),

    /// One or more control faults were raised.
    Fault(u8),
}

/// Snapshot of every user-visible parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterReport {
    pub turned_on: bool,
    pub state: MachineState,
    pub status: StatusCode,
    /// Wall-clock seconds, `None` until the clock is set.
    pub unix_time: Option<i64>,
    pub schedule_days: u8,
    pub turn_on_at: u16,
    pub turn_off_at: u16,
    pub off_deadline: Option<i64>,
    pub brew_setpoint_c: f32,
    pub steam_setpoint_c: f32,
    pub temperature_c: f32,
    pub heater_on: bool,
    pub pump_on: bool,
    pub fault_flags: u8,
}
