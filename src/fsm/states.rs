//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  OFF, SLEEP ──[Click / ShortHold / TurnOn / ScheduleOn]──▶ HEATING_TO_BREW
//!
//!  HEATING_TO_BREW ──[ready]──▶ IDLE_BREW
//!  COOLING_DOWN    ──[ready]──▶ IDLE_BREW
//!  HEATING_TO_STEAM ─[ready]──▶ IDLE_STEAM
//!
//!  brew side  ──[ShortHold]──▶ IDLE_STEAM if ready, else HEATING_TO_STEAM
//!  steam side ──[ShortHold]──▶ IDLE_BREW  if ready, else COOLING_DOWN
//!
//!  Any running state ──[Click]──▶ (same state, pump toggled)
//!  Any running state ──[LongHold / TurnOff / ScheduleOff]──▶ OFF
//!  Any state ──[button error / fault]──▶ ERROR ──[off event]──▶ OFF
//! ```

use super::context::FsmContext;
use super::{MachineEvent, MachineState, StateDescriptor};
use crate::control::heater::HeaterSetpoint;
use log::{error, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; MachineState::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            id: MachineState::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_event: standby_event,
        },
        // Index 1: Sleep
        StateDescriptor {
            id: MachineState::Sleep,
            name: "Sleep",
            on_enter: Some(sleep_enter),
            on_exit: None,
            on_event: standby_event,
        },
        // Index 2: HeatingToBrew
        StateDescriptor {
            id: MachineState::HeatingToBrew,
            name: "HeatingToBrew",
            on_enter: Some(brew_enter),
            on_exit: None,
            on_event: heating_to_brew_event,
        },
        // Index 3: IdleBrew
        StateDescriptor {
            id: MachineState::IdleBrew,
            name: "IdleBrew",
            on_enter: Some(brew_enter),
            on_exit: None,
            on_event: idle_brew_event,
        },
        // Index 4: HeatingToSteam
        StateDescriptor {
            id: MachineState::HeatingToSteam,
            name: "HeatingToSteam",
            on_enter: Some(steam_enter),
            on_exit: None,
            on_event: heating_to_steam_event,
        },
        // Index 5: IdleSteam
        StateDescriptor {
            id: MachineState::IdleSteam,
            name: "IdleSteam",
            on_enter: Some(steam_enter),
            on_exit: None,
            on_event: idle_steam_event,
        },
        // Index 6: CoolingDown
        StateDescriptor {
            id: MachineState::CoolingDown,
            name: "CoolingDown",
            on_enter: Some(brew_enter),
            on_exit: None,
            on_event: cooling_down_event,
        },
        // Index 7: Error
        StateDescriptor {
            id: MachineState::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_event: error_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF / SLEEP: heater off, waiting for a start request
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut FsmContext) {
    ctx.request_heater(HeaterSetpoint::Off);
    ctx.pump_on = false;
    info!("OFF: heater and pump de-energised");
}

fn sleep_enter(ctx: &mut FsmContext) {
    ctx.request_heater(HeaterSetpoint::Off);
    info!("SLEEP: heater off");
}

fn standby_event(_ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    match event {
        MachineEvent::Click
        | MachineEvent::ShortHold
        | MachineEvent::TurnOn
        | MachineEvent::ScheduleOn => Some(MachineState::HeatingToBrew),
        MachineEvent::LongHold | MachineEvent::TurnOff | MachineEvent::ScheduleOff => {
            Some(MachineState::Off)
        }
        MachineEvent::ButtonError | MachineEvent::Fault(_) => Some(MachineState::Error),
        MachineEvent::TemperatureReady => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Brew side: HEATING_TO_BREW, IDLE_BREW, COOLING_DOWN
// ═══════════════════════════════════════════════════════════════════════════

fn brew_enter(ctx: &mut FsmContext) {
    ctx.request_heater(HeaterSetpoint::BrewTemp);
    info!(
        "BREW: target {:.1}\u{00b0}C, boiler at {:.1}\u{00b0}C",
        ctx.target_c().unwrap_or(0.0),
        ctx.temperature_c
    );
}

fn heating_to_brew_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    match event {
        MachineEvent::TemperatureReady => Some(MachineState::IdleBrew),
        other => brew_side_event(ctx, other),
    }
}

fn idle_brew_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    brew_side_event(ctx, event)
}

fn cooling_down_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    match event {
        MachineEvent::TemperatureReady => Some(MachineState::IdleBrew),
        other => brew_side_event(ctx, other),
    }
}

/// Switch to steam: setpoint first, then decide on readiness.
fn brew_side_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    if event == MachineEvent::ShortHold {
        ctx.request_heater(HeaterSetpoint::SteamTemp);
        return Some(if ctx.is_ready() {
            MachineState::IdleSteam
        } else {
            MachineState::HeatingToSteam
        });
    }
    running_event(ctx, event)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Steam side: HEATING_TO_STEAM, IDLE_STEAM
// ═══════════════════════════════════════════════════════════════════════════

fn steam_enter(ctx: &mut FsmContext) {
    ctx.request_heater(HeaterSetpoint::SteamTemp);
    info!(
        "STEAM: target {:.1}\u{00b0}C, boiler at {:.1}\u{00b0}C",
        ctx.target_c().unwrap_or(0.0),
        ctx.temperature_c
    );
}

fn heating_to_steam_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    match event {
        MachineEvent::TemperatureReady => Some(MachineState::IdleSteam),
        other => steam_side_event(ctx, other),
    }
}

fn idle_steam_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    steam_side_event(ctx, event)
}

/// Switch back to brew: cooling down unless already in the brew band.
fn steam_side_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    if event == MachineEvent::ShortHold {
        ctx.request_heater(HeaterSetpoint::BrewTemp);
        return Some(if ctx.is_ready() {
            MachineState::IdleBrew
        } else {
            MachineState::CoolingDown
        });
    }
    running_event(ctx, event)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared by every running state
// ═══════════════════════════════════════════════════════════════════════════

fn running_event(ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    match event {
        MachineEvent::Click => {
            ctx.pump_on = !ctx.pump_on;
            info!("PUMP: {}", if ctx.pump_on { "on" } else { "off" });
            None
        }
        MachineEvent::LongHold | MachineEvent::TurnOff | MachineEvent::ScheduleOff => {
            Some(MachineState::Off)
        }
        MachineEvent::ButtonError | MachineEvent::Fault(_) => Some(MachineState::Error),
        MachineEvent::TurnOn
        | MachineEvent::ScheduleOn
        | MachineEvent::TemperatureReady
        | MachineEvent::ShortHold => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR: everything off until an explicit off request
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut FsmContext) {
    ctx.request_heater(HeaterSetpoint::Off);
    ctx.pump_on = false;
    error!("ERROR: heater and pump disabled, faults=0b{:08b}", ctx.fault_flags);
}

fn error_exit(ctx: &mut FsmContext) {
    info!("ERROR: cleared, faults=0b{:08b}", ctx.fault_flags);
}

fn error_event(_ctx: &mut FsmContext, event: MachineEvent) -> Option<MachineState> {
    match event {
        MachineEvent::LongHold | MachineEvent::TurnOff | MachineEvent::ScheduleOff => {
            Some(MachineState::Off)
        }
        _ => None,
    }
}
