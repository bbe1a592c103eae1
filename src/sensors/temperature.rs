//! PT1000 boiler temperature probe.
//!
//! The RTD sits in a voltage divider under a 4.3 kOhm reference resistor,
//! read by the ESP32-S3 ADC.  Resistance is converted to temperature
//! with the Callendar–Van Dusen equation (IEC 60751 coefficients).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::TemperaturePort;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_RTD_ADC: AtomicU16 = AtomicU16::new(SIM_ROOM_TEMP_RAW);

/// Roughly 22 °C through the default divider.
#[cfg(not(target_os = "espidf"))]
const SIM_ROOM_TEMP_RAW: u16 = 826;

/// Inject a raw ADC value for the host build.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_rtd_adc(raw: u16) {
    SIM_RTD_ADC.store(raw, Ordering::Relaxed);
}

/// Reference resistor in series with the probe (Ohm).
pub const RREF: f32 = 4300.0;
/// PT1000 resistance at 0 °C (Ohm).
pub const R0: f32 = 1000.0;
const CVD_A: f32 = 3.9083e-3;
const CVD_B: f32 = -5.775e-7;
const ADC_MAX: u16 = 4095;
/// Codes this close to either rail mean an open or shorted probe.
const RAIL_MARGIN: u16 = 8;

#[derive(Debug, Clone, Copy)]
pub struct TemperatureReading {
    pub raw: u16,
    pub resistance_ohm: f32,
    /// NaN if the probe is open or shorted.
    pub celsius: f32,
}

pub struct RtdSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    adc_channel: u32,
    last: Option<TemperatureReading>,
}

impl RtdSensor {
    pub fn new(adc_channel: u32) -> Self {
        Self {
            adc_channel,
            last: None,
        }
    }

    pub fn read(&mut self) -> TemperatureReading {
        let raw = self.read_adc();
        let resistance_ohm = raw_to_resistance(raw);
        let reading = TemperatureReading {
            raw,
            resistance_ohm,
            celsius: resistance_to_celsius(resistance_ohm),
        };
        self.last = Some(reading);
        reading
    }

    /// Most recent reading, if any.
    pub fn last(&self) -> Option<TemperatureReading> {
        self.last
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_RTD_ADC.load(Ordering::Relaxed)
    }
}

impl TemperaturePort for RtdSensor {
    fn read_celsius(&mut self) -> f32 {
        self.read().celsius
    }
}

/// Divider: `V = Vref * R / (RREF + R)`, so `R = RREF * raw / (max - raw)`.
fn raw_to_resistance(raw: u16) -> f32 {
    if raw <= RAIL_MARGIN || raw >= ADC_MAX - RAIL_MARGIN {
        return f32::NAN;
    }
    RREF * raw as f32 / (ADC_MAX - raw) as f32
}

/// Callendar–Van Dusen, solved for T on the `T >= 0` branch.
pub fn resistance_to_celsius(r: f32) -> f32 {
    if !r.is_finite() {
        return f32::NAN;
    }
    let disc = CVD_A * CVD_A - 4.0 * CVD_B * (1.0 - r / R0);
    if disc < 0.0 {
        return f32::NAN;
    }
    (-CVD_A + disc.sqrt()) / (2.0 * CVD_B)
}
