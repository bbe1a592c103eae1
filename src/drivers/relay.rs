//! Solid-state relay driver (boiler heater, pump).
//!
//! A dumb actuator: the controller decides, the relay follows.  The pin
//! is only written when the requested level changes, so the control
//! loop can call [`SsrRelay::set`] every poll.
//!
//! Generic over any `embedded-hal` output pin so the host tests can
//! drive it with a recording fake.

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

pub struct SsrRelay<P> {
    pin: P,
    name: &'static str,
    /// Level last written successfully; `None` before the first write.
    on: Option<bool>,
}

impl<P: OutputPin> SsrRelay<P> {
    /// Wrap `pin` and drive it low.
    pub fn new(pin: P, name: &'static str) -> Self {
        let mut relay = Self {
            pin,
            name,
            on: None,
        };
        relay.set(false);
        relay
    }

    pub fn set(&mut self, on: bool) {
        if self.on == Some(on) {
            return;
        }
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => {
                debug!("{} SSR: {}", self.name, if on { "on" } else { "off" });
                self.on = Some(on);
            }
            Err(e) => {
                // Leave `on` stale so the next poll retries the write.
                warn!("{} SSR: pin write failed: {:?}", self.name, e);
                self.on = None;
            }
        }
    }

    pub fn is_on(&self) -> bool {
        self.on == Some(true)
    }
}
