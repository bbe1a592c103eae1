//! Group-head brew lever micro-switch.
//!
//! Active-low input with pull-up: LOW while the lever is in the brew
//! position.  A failed pin read reports "not brewing" so a broken input
//! can never start the pump.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::BrewLeverPort;

pub struct BrewLever<P> {
    pin: P,
}

impl<P: InputPin> BrewLever<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> BrewLeverPort for BrewLever<P> {
    fn is_brewing(&mut self) -> bool {
        self.pin.is_low().unwrap_or_else(|e| {
            warn!("Brew lever: pin read failed: {:?}", e);
            false
        })
    }
}
