//! One-shot hardware peripheral initialization and raw pin access.
//!
//! Configures the RTD ADC channel, the relay and LED outputs, the lever
//! and button inputs, and the button interrupt using raw ESP-IDF sys
//! calls.  Called once from `main()` before the control loop starts.
//!
//! [`GpioOut`] and [`GpioIn`] wrap a configured pin number in the
//! `embedded-hal` digital traits so the drivers stay target-agnostic.
//! On the host they are no-ops (outputs) or idle-high (inputs).

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK { Ok(()) } else { Err(err(ret)) }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_outputs()?;
        init_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let unit_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    check(
        unsafe { adc_oneshot_new_unit(&unit_cfg, &raw mut ADC1_HANDLE) },
        HwInitError::AdcInitFailed,
    )?;

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    check(
        unsafe { adc_oneshot_config_channel(ADC1_HANDLE, pins::RTD_ADC_CHANNEL, &chan_cfg) },
        HwInitError::AdcInitFailed,
    )?;

    info!("hw_init: ADC1 CH{} configured (boiler RTD)", pins::RTD_ADC_CHANNEL);
    Ok(())
}

/// One 12-bit conversion.  Returns 0 on a read error, which the RTD
/// driver treats as an open probe.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once in init_adc() before the loop
    // starts; only the main loop reads it afterwards.
    let ret = unsafe { adc_oneshot_read(ADC1_HANDLE, channel, &mut raw) };
    if ret != ESP_OK {
        return 0;
    }
    raw.max(0) as u16
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn config_pin(pin: i32, mode: gpio_mode_t, pull_up: bool, intr: gpio_int_type_t) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: intr,
    };
    check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)
}

#[cfg(target_os = "espidf")]
unsafe fn init_outputs() -> Result<(), HwInitError> {
    for pin in [pins::BOILER_SSR_GPIO, pins::PUMP_SSR_GPIO, pins::STATUS_LED_GPIO] {
        unsafe {
            config_pin(pin, gpio_mode_t_GPIO_MODE_OUTPUT, false, gpio_int_type_t_GPIO_INTR_DISABLE)?;
            gpio_set_level(pin, 0);
        }
    }
    info!("hw_init: SSR and LED outputs low");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_inputs() -> Result<(), HwInitError> {
    unsafe {
        config_pin(pins::BREW_LEVER_GPIO, gpio_mode_t_GPIO_MODE_INPUT, true, gpio_int_type_t_GPIO_INTR_DISABLE)?;
        config_pin(pins::BUTTON_GPIO, gpio_mode_t_GPIO_MODE_INPUT, true, gpio_int_type_t_GPIO_INTR_ANYEDGE)?;
    }
    info!("hw_init: lever and button inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: register read on a configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host inputs idle high (pull-up, nothing pressed).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: register write on a configured output pin; main loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── embedded-hal pins ─────────────────────────────────────────

/// Output pin configured by [`init_peripherals`].
pub struct GpioOut {
    pin: i32,
}

impl GpioOut {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }
}

impl ErrorType for GpioOut {
    type Error = Infallible;
}

impl OutputPin for GpioOut {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, true);
        Ok(())
    }
}

/// Input pin configured by [`init_peripherals`].
pub struct GpioIn {
    pin: i32,
}

impl GpioIn {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }
}

impl ErrorType for GpioIn {
    type Error = Infallible;
}

impl InputPin for GpioIn {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.pin))
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: gpio_get_level is a register read; safe in ISR context.
    let level_low = unsafe { gpio_get_level(pins::BUTTON_GPIO) } == 0;
    crate::drivers::button::button_isr_handler(level_low);
}

/// Install the per-pin GPIO ISR service and hook the button.
/// Call after init_peripherals() and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // The handler only touches the lock-free button latch.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        check(
            gpio_isr_handler_add(pins::BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut()),
            HwInitError::IsrInstallFailed,
        )?;
        gpio_intr_enable(pins::BUTTON_GPIO);
    }
    info!("hw_init: button ISR installed (any edge)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
