//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO registers.

use std::collections::{HashMap, VecDeque};

use vbm::adapters::params::ParameterStore;
use vbm::app::commands::AppCommand;
use vbm::app::controller::MachineController;
use vbm::app::events::AppEvent;
use vbm::app::ports::{
    ActuatorPort, BrewLeverPort, ButtonPort, ClockPort, CommandPort, EventSink, StorageError,
    StoragePort, TemperaturePort,
};
use vbm::config::MachineConfig;
use vbm::drivers::button::ButtonSample;
use vbm::fsm::MachineState;
use vbm::scheduler::WallTime;
use vbm::status::StatusCode;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Heater(bool),
    Pump(bool),
    Status(StatusCode),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temperature_c: f32,
    pub lever_down: bool,
    /// Button samples handed out one per poll; idle once drained.
    pub button: VecDeque<ButtonSample>,
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            temperature_c: 22.0,
            lever_down: false,
            button: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    pub fn queue_button(&mut self, sample: ButtonSample) {
        self.button.push_back(sample);
    }

    pub fn heater_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Heater(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Pump(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Status(code) => Some(*code),
            _ => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperaturePort for MockHardware {
    fn read_celsius(&mut self) -> f32 {
        self.temperature_c
    }
}

impl BrewLeverPort for MockHardware {
    fn is_brewing(&mut self) -> bool {
        self.lever_down
    }
}

impl ButtonPort for MockHardware {
    fn sample(&mut self) -> ButtonSample {
        self.button.pop_front().unwrap_or_default()
    }
}

impl ActuatorPort for MockHardware {
    fn set_heater(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Heater(on));
    }

    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Pump(on));
    }

    fn set_status(&mut self, code: StatusCode) {
        self.calls.push(ActuatorCall::Status(code));
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Hand-cranked clock.  Starts past the button grace period with the
/// wall clock unset.
pub struct MockClock {
    pub ms: u32,
    pub unix: Option<i64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            ms: 10_000,
            unix: None,
        }
    }

    /// Advance both clocks.  The wall clock only moves once it is set.
    pub fn advance_ms(&mut self, ms: u32) {
        self.ms = self.ms.wrapping_add(ms);
        if let Some(unix) = self.unix.as_mut() {
            *unix += i64::from(ms / 1000);
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u32 {
        self.ms
    }

    fn wall_time(&self) -> Option<WallTime> {
        self.unix.and_then(WallTime::from_unix)
    }

    fn set_unix_time(&mut self, unix_secs: i64) {
        self.unix = Some(unix_secs);
    }
}

// ── MemStore (StoragePort) ────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
    pub data: HashMap<(String, String), Vec<u8>>,
    /// When set, every write fails with `StorageError::Full`.
    pub full: bool,
}

#[allow(dead_code)]
impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let value = self
            .data
            .get(&(ns.to_owned(), key.to_owned()))
            .ok_or(StorageError::NotFound)?;
        if value.len() > buf.len() {
            return Err(StorageError::IoError);
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.full {
            return Err(StorageError::Full);
        }
        self.data.insert((ns.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&(ns.to_owned(), key.to_owned()));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&(ns.to_owned(), key.to_owned()))
    }
}

// ── RecordingSink (EventSink) ─────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(from, to)` transition in order.
    pub fn transitions(&self) -> Vec<(MachineState, MachineState)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Scripted command link ─────────────────────────────────────

/// Hands out a fixed list of commands, one per `poll`.
#[derive(Default)]
pub struct ScriptedCommands {
    pub queue: VecDeque<AppCommand>,
}

#[allow(dead_code)]
impl ScriptedCommands {
    pub fn new(cmds: impl IntoIterator<Item = AppCommand>) -> Self {
        Self {
            queue: cmds.into_iter().collect(),
        }
    }
}

impl CommandPort for ScriptedCommands {
    fn poll(&mut self) -> Option<AppCommand> {
        self.queue.pop_front()
    }
}

// ── Rig: controller wired to every mock ───────────────────────

pub struct Rig {
    pub ctl: MachineController,
    pub hw: MockHardware,
    pub clock: MockClock,
    pub sink: RecordingSink,
    pub params: ParameterStore<MemStore>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let mut rig = Self {
            ctl: MachineController::new(config),
            hw: MockHardware::new(),
            clock: MockClock::new(),
            sink: RecordingSink::new(),
            params: ParameterStore::new(MemStore::new()),
        };
        rig.ctl.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    pub fn poll(&mut self) {
        self.ctl.poll(&mut self.hw, &self.clock, &mut self.sink);
    }

    /// Advance the clocks by `ms`, then poll once.
    pub fn step(&mut self, ms: u32) {
        self.clock.advance_ms(ms);
        self.poll();
    }

    pub fn command(&mut self, cmd: AppCommand) -> vbm::error::Result<()> {
        self.ctl.handle_command(
            cmd,
            &mut self.hw,
            &mut self.clock,
            &mut self.params,
            &mut self.sink,
        )
    }

    /// Hand every waiting command on `source` to the controller.
    pub fn drain(&mut self, source: &mut impl CommandPort) -> usize {
        self.ctl.drain_commands(
            source,
            &mut self.hw,
            &mut self.clock,
            &mut self.params,
            &mut self.sink,
        )
    }

    /// Press and release between two polls.
    pub fn click(&mut self) {
        self.hw.queue_button(ButtonSample::CLICK);
        self.step(100);
    }

    /// Press, keep the button down for `ms`, then release.
    pub fn hold(&mut self, ms: u32) {
        self.hw.queue_button(ButtonSample::PRESS);
        self.step(100);
        self.step(ms);
        self.hw.queue_button(ButtonSample::RELEASE);
        self.step(100);
    }
}
