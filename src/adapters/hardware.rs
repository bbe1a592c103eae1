//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the boiler probe, both SSRs, the brew lever, the button source
//! and the status LED, exposing them through [`TemperaturePort`],
//! [`BrewLeverPort`], [`ButtonPort`] and [`ActuatorPort`].  On the board
//! the pins are [`GpioOut`](crate::drivers::hw_init::GpioOut) /
//! [`GpioIn`](crate::drivers::hw_init::GpioIn); on the host any
//! `embedded-hal` fakes will do.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, BrewLeverPort, ButtonPort, TemperaturePort};
use crate::drivers::button::ButtonSample;
use crate::drivers::lever::BrewLever;
use crate::drivers::relay::SsrRelay;
use crate::drivers::status_led::StatusLed;
use crate::status::StatusCode;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<T, O, I, B> {
    probe: T,
    heater: SsrRelay<O>,
    pump: SsrRelay<O>,
    lever: BrewLever<I>,
    button: B,
    led: StatusLed<O>,
}

impl<T, O, I, B> HardwareAdapter<T, O, I, B>
where
    T: TemperaturePort,
    O: OutputPin,
    I: InputPin,
    B: ButtonPort,
{
    pub fn new(probe: T, heater_pin: O, pump_pin: O, lever_pin: I, button: B, led_pin: O) -> Self {
        Self {
            probe,
            heater: SsrRelay::new(heater_pin, "Boiler"),
            pump: SsrRelay::new(pump_pin, "Pump"),
            lever: BrewLever::new(lever_pin),
            button,
            led: StatusLed::new(led_pin),
        }
    }

    /// Advance the status LED blink pattern.  Call every poll.
    pub fn render_status(&mut self, now_ms: u32, interval_ms: u32) {
        self.led.render(now_ms, interval_ms);
    }

    pub fn heater_on(&self) -> bool {
        self.heater.is_on()
    }

    pub fn pump_on(&self) -> bool {
        self.pump.is_on()
    }

    pub fn status(&self) -> StatusCode {
        self.led.code()
    }
}

// ── Input ports ───────────────────────────────────────────────

impl<T: TemperaturePort, O, I, B> TemperaturePort for HardwareAdapter<T, O, I, B> {
    fn read_celsius(&mut self) -> f32 {
        self.probe.read_celsius()
    }
}

impl<T, O, I: InputPin, B> BrewLeverPort for HardwareAdapter<T, O, I, B> {
    fn is_brewing(&mut self) -> bool {
        self.lever.is_brewing()
    }
}

impl<T, O, I, B: ButtonPort> ButtonPort for HardwareAdapter<T, O, I, B> {
    fn sample(&mut self) -> ButtonSample {
        self.button.sample()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<T, O: OutputPin, I, B> ActuatorPort for HardwareAdapter<T, O, I, B> {
    fn set_heater(&mut self, on: bool) {
        self.heater.set(on);
    }

    fn set_pump(&mut self, on: bool) {
        self.pump.set(on);
    }

    fn set_status(&mut self, code: StatusCode) {
        self.led.show(code);
    }

    fn all_off(&mut self) {
        self.heater.set(false);
        self.pump.set(false);
        self.led.show(StatusCode::Off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::relay::fake::RecordingPin;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct Fixed(f32);
    impl TemperaturePort for Fixed {
        fn read_celsius(&mut self) -> f32 {
            self.0
        }
    }

    struct Idle;
    impl ErrorType for Idle {
        type Error = Infallible;
    }
    impl InputPin for Idle {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    struct NoButton;
    impl ButtonPort for NoButton {
        fn sample(&mut self) -> ButtonSample {
            ButtonSample::NONE
        }
    }

    fn adapter() -> HardwareAdapter<Fixed, RecordingPin, Idle, NoButton> {
        HardwareAdapter::new(
            Fixed(93.0),
            RecordingPin::default(),
            RecordingPin::default(),
            Idle,
            NoButton,
            RecordingPin::default(),
        )
    }

    #[test]
    fn ports_reach_the_drivers() {
        let mut hw = adapter();
        assert_eq!(hw.read_celsius(), 93.0);
        assert!(!hw.is_brewing());
        hw.set_heater(true);
        hw.set_pump(true);
        hw.set_status(StatusCode::Solid);
        assert!(hw.heater_on() && hw.pump_on());
        assert_eq!(hw.status(), StatusCode::Solid);
    }

    #[test]
    fn all_off_drops_both_relays() {
        let mut hw = adapter();
        hw.set_heater(true);
        hw.set_pump(true);
        hw.all_off();
        assert!(!hw.heater_on() && !hw.pump_on());
        assert_eq!(hw.status(), StatusCode::Off);
    }
}
