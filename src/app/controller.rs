//! Machine controller — the hexagonal core.
//!
//! [`MachineController`] owns the FSM, button classifier, daily scheduler,
//! safety supervisor and heater loop.  All I/O flows through port traits
//! injected at call sites, so the whole controller runs on the host
//! against mock adapters.
//!
//! ```text
//!  TemperaturePort ─┐                                 ┌─▶ ActuatorPort
//!  ButtonPort ──────┤   ┌──────────────────────────┐  │
//!  BrewLeverPort ───┼──▶│    MachineController     │──┼─▶ EventSink
//!  ClockPort ───────┘   │ FSM · Button · Schedule  │  │
//!                       │ Safety · PID · Relay     │  └─▶ ParameterPort
//!                       └──────────────────────────┘
//! ```

use heapless::Vec;
use log::{info, warn};

use crate::config::{validate_setpoint, MachineConfig};
use crate::control::heater::{Heater, HeaterSetpoint};
use crate::control::pid::PidController;
use crate::control::ContinuousController;
use crate::drivers::button::{ButtonCommand, ButtonInput};
use crate::error::{CommandError, ControlFault, Result};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, MachineEvent, MachineState};
use crate::safety::SafetySupervisor;
use crate::scheduler::{DailyScheduler, ScheduleState};
use crate::status::StatusCode;

use super::commands::AppCommand;
use super::events::{AppEvent, ParameterReport};
use super::ports::{
    ActuatorPort, BrewLeverPort, ButtonPort, ClockPort, CommandPort, EventSink, Parameter,
    ParameterPort, TemperaturePort,
};

/// Fault, schedule and button can each produce one event per poll.
const EVENTS_PER_POLL: usize = 4;

// ───────────────────────────────────────────────────────────────
// MachineController
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates all domain logic.
pub struct MachineController<C = PidController> {
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetySupervisor,
    button: ButtonInput,
    scheduler: DailyScheduler,
    heater: Heater<C>,
    /// Last brew-lever level acted upon.
    was_brewing: bool,
    status: StatusCode,
    poll_count: u64,
}

impl MachineController<PidController> {
    /// Construct the controller with a PID heater loop tuned from `config`.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: MachineConfig) -> Self {
        let pid = PidController::new(config.pid_kp, config.pid_ki, config.pid_kd);
        Self::with_controller(config, pid)
    }
}

impl<C: ContinuousController> MachineController<C> {
    /// Construct the controller around any continuous heater controller.
    pub fn with_controller(config: MachineConfig, controller: C) -> Self {
        let safety = SafetySupervisor::new(&config);
        let button = ButtonInput::new(&config);
        let scheduler = DailyScheduler::new(
            config.schedule_days,
            config.turn_on_at_min,
            config.turn_off_at_min,
        );
        let heater = Heater::new(controller, config.relay_window_ms);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), MachineState::Off);

        Self {
            fsm,
            ctx,
            safety,
            button,
            scheduler,
            heater,
            was_brewing: false,
            status: StatusCode::Off,
            poll_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in `Off` and drive the outputs to match.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        hw.all_off();
        self.apply_actuators(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("MachineController started in {:?}", self.fsm.current_state());
    }

    // ── Per-poll orchestration ────────────────────────────────

    /// Run one control cycle:
    /// temperature → safety → schedule → lever → button → ready → heater → outputs.
    ///
    /// The `hw` parameter satisfies every hardware port at once.  This
    /// avoids several mutable borrows of one adapter while keeping the
    /// port boundary explicit.
    pub fn poll(
        &mut self,
        hw: &mut (impl TemperaturePort + BrewLeverPort + ButtonPort + ActuatorPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        self.poll_count += 1;
        let now_ms = clock.now_ms();
        let was_on = self.fsm.current_state().is_on();
        let mut events: Vec<MachineEvent, EVENTS_PER_POLL> = Vec::new();

        // 1. Boiler temperature
        let temperature = hw.read_celsius();
        self.ctx.temperature_c = temperature;

        // 2. Safety evaluation
        let prev_faults = self.ctx.fault_flags;
        let faults = self.safety.evaluate(temperature);
        self.ctx.fault_flags = faults;
        if faults & !prev_faults != 0 {
            sink.emit(&AppEvent::Fault(faults));
        }
        if faults != 0 && self.fsm.current_state() != MachineState::Error {
            warn!("Safety fault! flags=0b{:08b}", faults);
            queue(&mut events, MachineEvent::Fault(faults));
        }

        // 3. Daily schedule and off deadline
        if let Some(now) = clock.wall_time() {
            self.scheduler.update(&now);
            if self.scheduler.has_changed() {
                queue(
                    &mut events,
                    match self.scheduler.state() {
                        ScheduleState::On => MachineEvent::ScheduleOn,
                        ScheduleState::Off => MachineEvent::ScheduleOff,
                    },
                );
            }
        }

        // 4. Brew lever
        self.handle_brew_lever(hw.is_brewing(), sink);

        // 5. Push-button
        self.button.update(now_ms, hw.sample());
        match self.button.take_command() {
            ButtonCommand::Nothing => {}
            ButtonCommand::Click => queue(&mut events, MachineEvent::Click),
            ButtonCommand::ShortHold => queue(&mut events, MachineEvent::ShortHold),
            ButtonCommand::LongHold => queue(&mut events, MachineEvent::LongHold),
            ButtonCommand::Error => {
                self.safety.latch(ControlFault::ButtonSequence);
                self.ctx.fault_flags = self.safety.faults();
                sink.emit(&AppEvent::Fault(self.ctx.fault_flags));
                queue(&mut events, MachineEvent::ButtonError);
            }
        }

        for event in events {
            self.dispatch(event, sink);
        }

        // 6. Temperature ready, evaluated against whatever setpoint the
        //    events above left behind.
        if self.ctx.refresh_ready() {
            self.dispatch(MachineEvent::TemperatureReady, sink);
        }

        // 7. Heater loop
        if self.ctx.has_faults() || self.ctx.heater == HeaterSetpoint::Off {
            self.heater.force_off();
        } else {
            self.heater
                .update(now_ms, temperature, self.ctx.heater, &self.ctx.config);
        }

        // 8. Outputs
        self.apply_actuators(hw);

        // 9. On/off notification
        self.notify_power(was_on, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (companion app, serial console, tests).
    ///
    /// Invalid values are rejected with an error.  Persistence failures
    /// are logged and absorbed: the new value stays live for this session.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        clock: &mut impl ClockPort,
        params: &mut impl ParameterPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let was_on = self.fsm.current_state().is_on();

        match cmd {
            AppCommand::TurnOn => {
                info!("Command: turn on");
                self.dispatch(MachineEvent::TurnOn, sink);
            }
            AppCommand::TurnOff => {
                info!("Command: turn off");
                self.dispatch(MachineEvent::TurnOff, sink);
            }
            AppCommand::SetBrewSetpoint(celsius) => {
                validate_setpoint(celsius)?;
                info!("Command: brew setpoint {:.1}\u{00b0}C", celsius);
                self.ctx.config.brew_setpoint_c = celsius;
                self.ctx.targets_changed();
                persist(params, Parameter::BrewSetpoint(celsius));
            }
            AppCommand::SetSteamSetpoint(celsius) => {
                validate_setpoint(celsius)?;
                info!("Command: steam setpoint {:.1}\u{00b0}C", celsius);
                self.ctx.config.steam_setpoint_c = celsius;
                self.ctx.targets_changed();
                persist(params, Parameter::SteamSetpoint(celsius));
            }
            AppCommand::TurnOffIn { minutes } => {
                let now = clock.wall_time().ok_or(CommandError::ClockNotSet)?;
                self.scheduler.turn_off_in(minutes, now.unix_secs);
            }
            AppCommand::SetScheduleDays(days) => {
                info!("Command: schedule days 0b{:07b}", days & 0x7F);
                self.scheduler.set_days(days);
                self.ctx.config.schedule_days = self.scheduler.config().days_mask;
                persist(params, Parameter::ScheduleDays(self.ctx.config.schedule_days));
            }
            AppCommand::SetTurnOnAt(minute) => {
                self.scheduler.set_turn_on_at(minute);
                let minute = self.scheduler.config().turn_on_at;
                info!("Command: turn on at {:02}:{:02}", minute / 60, minute % 60);
                self.ctx.config.turn_on_at_min = minute;
                persist(params, Parameter::TurnOnAt(minute));
            }
            AppCommand::SetTurnOffAt(minute) => {
                self.scheduler.set_turn_off_at(minute);
                let minute = self.scheduler.config().turn_off_at;
                info!("Command: turn off at {:02}:{:02}", minute / 60, minute % 60);
                self.ctx.config.turn_off_at_min = minute;
                persist(params, Parameter::TurnOffAt(minute));
            }
            AppCommand::SetUnixTime(unix_secs) => {
                info!("Command: set unix time {}", unix_secs);
                clock.set_unix_time(unix_secs);
            }
            AppCommand::ReportParameters => {
                sink.emit(&AppEvent::Parameters(self.report(&*clock)));
            }
            AppCommand::ForceState(target) => {
                warn!("Command: forcing state {:?}", target);
                if let Some(t) = self.fsm.force_transition(target, &mut self.ctx) {
                    self.on_transition(t.from, t.to, sink);
                }
            }
        }

        if self.ctx.heater == HeaterSetpoint::Off {
            self.heater.force_off();
        }
        self.apply_actuators(hw);
        self.notify_power(was_on, sink);
        Ok(())
    }

    /// Handle every command waiting on `source`.  Rejected commands are
    /// logged and skipped.  Returns how many commands were taken.
    pub fn drain_commands(
        &mut self,
        source: &mut impl CommandPort,
        hw: &mut impl ActuatorPort,
        clock: &mut impl ClockPort,
        params: &mut impl ParameterPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut taken = 0;
        while let Some(cmd) = source.poll() {
            taken += 1;
            if let Err(e) = self.handle_command(cmd, hw, clock, params, sink) {
                warn!("Command {:?} rejected: {}", cmd, e);
            }
        }
        taken
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of every user-visible parameter.
    pub fn report(&self, clock: &impl ClockPort) -> ParameterReport {
        let schedule = self.scheduler.config();
        ParameterReport {
            turned_on: self.fsm.current_state().is_on(),
            state: self.fsm.current_state(),
            status: self.status,
            unix_time: clock.wall_time().map(|w| w.unix_secs),
            schedule_days: schedule.days_mask,
            turn_on_at: schedule.turn_on_at,
            turn_off_at: schedule.turn_off_at,
            off_deadline: schedule.off_deadline,
            brew_setpoint_c: self.ctx.config.brew_setpoint_c,
            steam_setpoint_c: self.ctx.config.steam_setpoint_c,
            temperature_c: self.ctx.temperature_c,
            heater_on: self.heater_on(),
            pump_on: self.ctx.pump_on,
            fault_flags: self.ctx.fault_flags,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> MachineState {
        self.fsm.current_state()
    }

    /// Status code last written to the indicator.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Heater setpoint requested by the current state.
    pub fn heater_setpoint(&self) -> HeaterSetpoint {
        self.ctx.heater
    }

    /// Heater relay level last written.
    pub fn heater_on(&self) -> bool {
        self.heater.relay_on() && !self.ctx.has_faults() && self.ctx.heater != HeaterSetpoint::Off
    }

    pub fn pump_on(&self) -> bool {
        self.ctx.pump_on
    }

    /// True once the boiler has reached the current setpoint.
    pub fn is_ready(&self) -> bool {
        self.ctx.is_ready()
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    /// Live configuration, including edits made by commands.
    pub fn config(&self) -> &MachineConfig {
        &self.ctx.config
    }

    /// Polls executed since construction.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn dispatch(&mut self, event: MachineEvent, sink: &mut impl EventSink) {
        if let Some(t) = self.fsm.dispatch(event, &mut self.ctx) {
            self.on_transition(t.from, t.to, sink);
        }
    }

    fn on_transition(&mut self, from: MachineState, to: MachineState, sink: &mut impl EventSink) {
        if to == MachineState::Off {
            self.safety.clear_latched();
            self.ctx.fault_flags = self.safety.faults();
        }
        sink.emit(&AppEvent::StateChanged { from, to });
    }

    /// Lever transitions drive the pump directly in every state but Off.
    fn handle_brew_lever(&mut self, brewing: bool, sink: &mut impl EventSink) {
        if self.fsm.current_state() == MachineState::Off || brewing == self.was_brewing {
            return;
        }
        self.was_brewing = brewing;
        self.ctx.pump_on = brewing;
        info!("Brew lever: {}", if brewing { "brewing" } else { "released" });
        sink.emit(&AppEvent::Brewing(brewing));
    }

    fn notify_power(&self, was_on: bool, sink: &mut impl EventSink) {
        let is_on = self.fsm.current_state().is_on();
        if is_on != was_on {
            sink.emit(&AppEvent::TurnedOn(is_on));
        }
    }

    /// Translate the context's requests into port calls.
    fn apply_actuators(&mut self, hw: &mut impl ActuatorPort) {
        hw.set_heater(self.heater_on());
        hw.set_pump(self.ctx.pump_on);
        self.status = StatusCode::for_state(self.fsm.current_state());
        hw.set_status(self.status);
    }
}

fn queue(events: &mut Vec<MachineEvent, EVENTS_PER_POLL>, event: MachineEvent) {
    if events.push(event).is_err() {
        warn!("Event queue full, dropping {:?}", event);
    }
}

fn persist(params: &mut impl ParameterPort, param: Parameter) {
    if let Err(e) = params.save(param) {
        warn!("Failed to persist {:?}: {}", param, e);
    }
}
