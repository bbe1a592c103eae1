//! Integration tests for the inputs → MachineController → actuators pipeline.
//!
//! Drives the controller through the same port traits the firmware uses,
//! with mock hardware, a hand-cranked clock and in-memory storage.

use crate::mock_hw::{Rig, ScriptedCommands};

use vbm::adapters::console::ConsoleCommands;
use vbm::app::commands::AppCommand;
use vbm::app::ports::ParameterPort;
use vbm::app::events::AppEvent;
use vbm::drivers::button::ButtonSample;
use vbm::error::{CommandError, ControlFault, Error};
use vbm::fsm::MachineState;
use vbm::status::StatusCode;

/// Sunday 2024-01-07 00:00:00 UTC.
const SUNDAY_MIDNIGHT: i64 = 1_704_585_600;
const DAY: i64 = 86_400;

fn at_minute(day_start: i64, minute: i64) -> i64 {
    day_start + minute * 60
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn starts_off_with_everything_deenergised() {
    let rig = Rig::new();
    assert_eq!(rig.ctl.state(), MachineState::Off);
    assert!(!rig.hw.heater_on());
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.hw.status(), Some(StatusCode::Off));
    assert_eq!(rig.sink.events, [AppEvent::Started(MachineState::Off)]);
}

#[test]
fn button_ignored_during_startup_grace() {
    let mut rig = Rig::new();
    rig.clock.ms = 0;
    rig.click();
    assert_eq!(rig.ctl.state(), MachineState::Off);
}

// ── Button ────────────────────────────────────────────────────

#[test]
fn click_turns_machine_on_and_heats() {
    let mut rig = Rig::new();
    rig.click();

    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);
    assert!(rig.hw.heater_on(), "cold boiler should heat");
    assert_eq!(rig.hw.status(), Some(StatusCode::Quarter));
    assert_eq!(rig.sink.count(&AppEvent::TurnedOn(true)), 1);
}

#[test]
fn click_while_running_toggles_pump() {
    let mut rig = Rig::new();
    rig.click();
    rig.click();
    assert!(rig.hw.pump_on());
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);

    rig.click();
    assert!(!rig.hw.pump_on());
}

#[test]
fn long_hold_turns_off_and_stops_pump() {
    let mut rig = Rig::new();
    rig.click();
    rig.click();
    assert!(rig.hw.pump_on());

    // Passes the short-hold threshold on the way to the long one.
    rig.hw.queue_button(ButtonSample::PRESS);
    rig.step(100);
    rig.step(2_100);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToSteam);
    rig.step(3_000);
    assert_eq!(rig.ctl.state(), MachineState::Off);
    rig.hw.queue_button(ButtonSample::RELEASE);
    rig.step(100);

    assert_eq!(rig.ctl.state(), MachineState::Off);
    assert!(!rig.hw.pump_on());
    assert!(!rig.hw.heater_on());
    assert_eq!(rig.sink.count(&AppEvent::TurnedOn(false)), 1);
}

#[test]
fn short_hold_cycles_between_brew_and_steam() {
    let mut rig = Rig::new();
    rig.hw.temperature_c = 99.0;
    rig.click();
    rig.poll();
    assert_eq!(rig.ctl.state(), MachineState::IdleBrew);

    rig.hold(2_100);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToSteam);
    assert_eq!(rig.hw.status(), Some(StatusCode::Sixteenth));

    rig.hw.temperature_c = 130.0;
    rig.step(100);
    assert_eq!(rig.ctl.state(), MachineState::IdleSteam);

    rig.hold(2_100);
    assert_eq!(rig.ctl.state(), MachineState::CoolingDown);
    assert!(!rig.hw.heater_on(), "hotter than brew target");

    rig.hw.temperature_c = 100.5;
    rig.step(100);
    assert_eq!(rig.ctl.state(), MachineState::IdleBrew);
}

#[test]
fn stuck_button_latches_error_until_off() {
    let mut rig = Rig::new();
    rig.command(AppCommand::TurnOn).unwrap();

    rig.hw.queue_button(ButtonSample::PRESS);
    rig.step(100);
    rig.step(31_000);

    assert_eq!(rig.ctl.state(), MachineState::Error);
    assert!(!rig.hw.heater_on());
    assert_eq!(rig.hw.status(), Some(StatusCode::Gallop));
    assert_ne!(rig.ctl.fault_flags() & ControlFault::ButtonSequence.mask(), 0);

    rig.command(AppCommand::TurnOff).unwrap();
    assert_eq!(rig.ctl.state(), MachineState::Off);
    assert_eq!(rig.ctl.fault_flags(), 0);
}

// ── Temperature ───────────────────────────────────────────────

#[test]
fn reaching_setpoint_enters_idle_brew_once() {
    let mut rig = Rig::new();
    rig.command(AppCommand::TurnOn).unwrap();
    rig.hw.temperature_c = 99.0;
    for _ in 0..5 {
        rig.step(10);
    }
    assert_eq!(rig.ctl.state(), MachineState::IdleBrew);
    assert!(rig.ctl.is_ready());

    // A dip while pulling a shot does not drop back to heating.
    rig.hw.temperature_c = 90.0;
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::IdleBrew);

    let entered = rig
        .sink
        .transitions()
        .iter()
        .filter(|(_, to)| *to == MachineState::IdleBrew)
        .count();
    assert_eq!(entered, 1);
}

#[test]
fn over_temperature_trips_error() {
    let mut rig = Rig::new();
    rig.command(AppCommand::TurnOn).unwrap();
    rig.hw.temperature_c = 150.0;
    rig.step(10);

    assert_eq!(rig.ctl.state(), MachineState::Error);
    assert!(!rig.hw.heater_on());
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Fault(flags) if flags & ControlFault::OverTemperature.mask() != 0
    )));

    // Cooling down clears the fault but not the error state.
    rig.hw.temperature_c = 100.0;
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Error);
    assert_eq!(rig.ctl.fault_flags(), 0);

    rig.hold(5_100);
    assert_eq!(rig.ctl.state(), MachineState::Off);
}

#[test]
fn unreadable_probe_trips_error_after_repeated_samples() {
    let mut rig = Rig::new();
    rig.command(AppCommand::TurnOn).unwrap();
    rig.hw.temperature_c = f32::NAN;
    rig.step(10);
    rig.step(10);
    assert_ne!(rig.ctl.state(), MachineState::Error);
    assert!(!rig.hw.heater_on(), "no heating on a NaN reading");
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Error);
}

#[test]
fn brew_setpoint_change_while_idle_reheats() {
    let mut rig = Rig::new();
    rig.command(AppCommand::TurnOn).unwrap();
    rig.hw.temperature_c = 100.0;
    rig.step(10);
    assert!(rig.ctl.is_ready());

    rig.command(AppCommand::SetBrewSetpoint(110.0)).unwrap();
    assert!(!rig.ctl.is_ready());
    rig.step(10);
    assert!(rig.hw.heater_on());
}

// ── Brew lever ────────────────────────────────────────────────

#[test]
fn lever_drives_pump_only_while_on() {
    let mut rig = Rig::new();
    rig.hw.lever_down = true;
    rig.step(10);
    assert!(!rig.hw.pump_on(), "lever ignored while off");
    assert_eq!(rig.sink.count(&AppEvent::Brewing(true)), 0);

    rig.command(AppCommand::TurnOn).unwrap();
    rig.step(10);
    assert!(rig.hw.pump_on());
    assert_eq!(rig.sink.count(&AppEvent::Brewing(true)), 1);

    rig.hw.lever_down = false;
    rig.step(10);
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.sink.count(&AppEvent::Brewing(false)), 1);
}

#[test]
fn lever_drives_pump_in_sleep() {
    let mut rig = Rig::new();
    rig.command(AppCommand::ForceState(MachineState::Sleep)).unwrap();
    rig.hw.lever_down = true;
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Sleep);
    assert!(rig.hw.pump_on());
    assert!(!rig.hw.heater_on());
    assert_eq!(rig.sink.count(&AppEvent::Brewing(true)), 1);

    rig.hw.lever_down = false;
    rig.step(10);
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.sink.count(&AppEvent::Brewing(false)), 1);
}

// ── Schedule ──────────────────────────────────────────────────

fn scheduled_rig() -> Rig {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetScheduleDays(0x7F)).unwrap();
    rig.command(AppCommand::SetTurnOnAt(480)).unwrap();
    rig.command(AppCommand::SetTurnOffAt(600)).unwrap();
    rig
}

#[test]
fn schedule_turns_machine_on_and_off() {
    let mut rig = scheduled_rig();
    rig.command(AppCommand::SetUnixTime(at_minute(SUNDAY_MIDNIGHT, 479)))
        .unwrap();
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Off);

    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT, 480));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);

    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT, 600));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Off);

    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT, 601));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Off);

    // Next morning it fires again.
    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT + DAY, 480));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);
}

#[test]
fn schedule_fires_at_most_once_per_day() {
    let mut rig = scheduled_rig();
    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT, 480));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);

    rig.command(AppCommand::TurnOff).unwrap();
    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT, 500));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Off);
}

#[test]
fn schedule_skips_disabled_days() {
    let mut rig = scheduled_rig();
    // Monday only.
    rig.command(AppCommand::SetScheduleDays(0b000_0010)).unwrap();
    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT, 480));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Off);

    rig.clock.unix = Some(at_minute(SUNDAY_MIDNIGHT + DAY, 481));
    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);
}

#[test]
fn turn_off_in_shuts_down_at_deadline() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetUnixTime(at_minute(SUNDAY_MIDNIGHT, 720)))
        .unwrap();
    rig.command(AppCommand::TurnOn).unwrap();
    rig.command(AppCommand::TurnOffIn { minutes: 5 }).unwrap();

    rig.step(4 * 60_000);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);

    rig.step(60_000);
    assert_eq!(rig.ctl.state(), MachineState::Off);
    assert_eq!(rig.ctl.report(&rig.clock).off_deadline, None);
}

#[test]
fn turn_off_in_without_clock_is_rejected() {
    let mut rig = Rig::new();
    let err = rig.command(AppCommand::TurnOffIn { minutes: 5 }).unwrap_err();
    assert!(matches!(err, Error::Command(CommandError::ClockNotSet)));
}

// ── Command link ──────────────────────────────────────────────

#[test]
fn console_lines_set_clock_and_schedule() {
    let mut rig = Rig::new();
    let mut console = ConsoleCommands::new();
    let line = format!(
        "daystimer1:127\ntimer1on:1920\ntimer1off:600\nsetunixtime:{}\n",
        at_minute(SUNDAY_MIDNIGHT, 479)
    );
    console.feed(line.as_bytes());

    assert_eq!(rig.drain(&mut console), 4);
    let stored = rig.params.load().unwrap();
    assert_eq!(stored.turn_on_at_min, Some(480), "1920 wraps to 08:00");
    assert_eq!(stored.turn_off_at_min, Some(600));

    rig.step(10);
    assert_eq!(rig.ctl.state(), MachineState::Off);
    rig.step(60_000);
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);

    // With the wall clock set, the off timer is accepted too.
    console.feed(b"durationtimer:5\n");
    assert_eq!(rig.drain(&mut console), 1);
    assert!(rig.ctl.report(&rig.clock).off_deadline.is_some());
}

#[test]
fn rejected_command_does_not_block_the_rest() {
    let mut rig = Rig::new();
    let mut link = ScriptedCommands::new([
        AppCommand::TurnOffIn { minutes: 5 },
        AppCommand::SetBrewSetpoint(500.0),
        AppCommand::TurnOn,
    ]);
    assert_eq!(rig.drain(&mut link), 3);
    assert!(link.queue.is_empty());
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);
    assert_eq!(rig.ctl.report(&rig.clock).off_deadline, None);
    assert_eq!(rig.params.load().unwrap().brew_setpoint_c, None);
}

// ── Reporting ─────────────────────────────────────────────────

#[test]
fn report_reflects_live_state() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSteamSetpoint(125.0)).unwrap();
    rig.command(AppCommand::TurnOn).unwrap();
    rig.step(10);
    rig.command(AppCommand::ReportParameters).unwrap();

    let Some(AppEvent::Parameters(report)) = rig.sink.events.last() else {
        panic!("expected a parameter report, got {:?}", rig.sink.events.last());
    };
    assert!(report.turned_on);
    assert_eq!(report.state, MachineState::HeatingToBrew);
    assert_eq!(report.steam_setpoint_c, 125.0);
    assert_eq!(report.brew_setpoint_c, 100.0);
    assert_eq!(report.unix_time, None);
    assert!(report.heater_on);
}

#[test]
fn raw_command_round_trip_through_controller() {
    let mut rig = Rig::new();
    let cmd = AppCommand::from_raw("turnOn", None).unwrap();
    rig.command(cmd).unwrap();
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);

    let cmd = AppCommand::from_raw("turnoff", Some(1.0)).unwrap();
    rig.command(cmd).unwrap();
    assert_eq!(rig.ctl.state(), MachineState::Off);
}

#[test]
fn forced_sleep_resumes_on_click() {
    let mut rig = Rig::new();
    rig.command(AppCommand::ForceState(MachineState::Sleep)).unwrap();
    assert_eq!(rig.ctl.state(), MachineState::Sleep);
    assert_eq!(rig.hw.status(), Some(StatusCode::Half));

    rig.click();
    assert_eq!(rig.ctl.state(), MachineState::HeatingToBrew);
}
