//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! [`AppEvent`] to the logger (UART / USB-CDC in production).  A BLE
//! adapter for the companion app would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::TurnedOn(on) => {
                info!("POWER | turned_on={}", on);
            }
            AppEvent::Brewing(brewing) => {
                info!("BREW  | is_brewing={}", brewing);
            }
            AppEvent::Parameters(report) => match serde_json::to_string(report) {
                Ok(json) => info!("PARAM | {}", json),
                Err(e) => warn!("PARAM | encode failed: {}", e),
            },
            AppEvent::Fault(flags) => {
                info!("FAULT | flags=0b{:08b}", flags);
            }
        }
    }
}
