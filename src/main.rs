//! VBM Controller — Main Entry Point
//!
//! Hexagonal architecture: hardware adapters on the outside, the
//! [`MachineController`] in the middle, port traits in between.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink  ParameterStore  SystemClock │
//! │  (Sensor+Actuator)  (EventSink)   (NVS params)    (ClockPort) │
//! │  ConsoleCommands                                               │
//! │  (CommandPort)                                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           MachineController (pure logic)               │    │
//! │  │  FSM · Button · Scheduler · Safety · PID · Relay       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_hal::delay::FreeRtos;

use vbm::adapters::console::ConsoleCommands;
use vbm::adapters::hardware::HardwareAdapter;
use vbm::adapters::log_sink::LogEventSink;
use vbm::adapters::nvs::NvsAdapter;
use vbm::adapters::params::ParameterStore;
use vbm::adapters::time::SystemClock;
use vbm::app::controller::MachineController;
use vbm::app::ports::{ClockPort, ParameterPort};
use vbm::config::MachineConfig;
use vbm::drivers::button::BUTTON_LATCH;
use vbm::drivers::hw_init::{self, GpioIn, GpioOut};
use vbm::drivers::watchdog::Watchdog;
use vbm::pins;
use vbm::sensors::temperature::RtdSensor;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║       VBM Controller v{}          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("Hardware init failed: {}. Halting.", e);
        loop {
            FreeRtos::delay_ms(1000);
        }
    }
    if let Err(e) = hw_init::init_isr_service() {
        warn!("Button ISR unavailable ({}), button disabled", e);
    }

    let watchdog = Watchdog::default();

    // ── 2. Persisted parameters ───────────────────────────────
    let nvs = NvsAdapter::new().map_err(vbm::error::Error::from)?;
    let mut params = ParameterStore::new(nvs);
    let mut config = MachineConfig::default();
    match params.load() {
        Ok(stored) => config.apply(&stored),
        Err(e) => warn!("Parameter load failed ({}), using defaults", e),
    }
    if let Err(e) = config.validate() {
        warn!("Stored parameters invalid ({}), using defaults", e);
        config = MachineConfig::default();
    }
    info!(
        "Config: brew={:.1}\u{00b0}C steam={:.1}\u{00b0}C days=0b{:07b} on={} off={}",
        config.brew_setpoint_c,
        config.steam_setpoint_c,
        config.schedule_days,
        config.turn_on_at_min,
        config.turn_off_at_min,
    );

    // ── 3. Adapters and controller ────────────────────────────
    let mut hw = HardwareAdapter::new(
        RtdSensor::new(pins::RTD_ADC_CHANNEL),
        GpioOut::new(pins::BOILER_SSR_GPIO),
        GpioOut::new(pins::PUMP_SSR_GPIO),
        GpioIn::new(pins::BREW_LEVER_GPIO),
        &BUTTON_LATCH,
        GpioOut::new(pins::STATUS_LED_GPIO),
    );
    let mut clock = SystemClock::new();
    let mut console = ConsoleCommands::new();
    let mut sink = LogEventSink::new();

    let poll_interval_ms = config.poll_interval_ms;
    let blink_interval_ms = config.blink_interval_ms;

    let mut controller = MachineController::new(config);
    controller.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        controller.drain_commands(&mut console, &mut hw, &mut clock, &mut params, &mut sink);
        controller.poll(&mut hw, &clock, &mut sink);
        hw.render_status(clock.now_ms(), blink_interval_ms);
        watchdog.feed();
        FreeRtos::delay_ms(poll_interval_ms);
    }
}
