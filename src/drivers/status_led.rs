//! Single-colour status LED driver.
//!
//! Plays the 8-slot blink pattern of the current [`StatusCode`] over one
//! blink interval.  The controller picks the code; the main loop calls
//! [`StatusLed::render`] every poll to advance the pattern.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::status::StatusCode;

pub struct StatusLed<P> {
    pin: P,
    code: StatusCode,
    lit: Option<bool>,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            code: StatusCode::Off,
            lit: None,
        }
    }

    /// Select the pattern to play.  Takes effect on the next render.
    pub fn show(&mut self, code: StatusCode) {
        self.code = code;
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Drive the pin for `now_ms`.  Writes only on level changes.
    pub fn render(&mut self, now_ms: u32, interval_ms: u32) {
        let level = self.code.level_at(now_ms, interval_ms);
        if self.lit == Some(level) {
            return;
        }
        let result = if level {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.lit = Some(level),
            Err(e) => {
                warn!("Status LED: pin write failed: {:?}", e);
                self.lit = None;
            }
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit == Some(true)
    }
}
