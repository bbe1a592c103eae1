//! GPIO / peripheral pin assignments for the VBM controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Solid-state relays (active HIGH)
// ---------------------------------------------------------------------------

/// Boiler heater SSR.
pub const BOILER_SSR_GPIO: i32 = 7;
/// Vibration pump SSR.
pub const PUMP_SSR_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Inputs (active LOW, internal pull-up)
// ---------------------------------------------------------------------------

/// Group-head brew lever micro-switch.  LOW = brewing.
pub const BREW_LEVER_GPIO: i32 = 2;
/// Front-panel push-button.  LOW = pressed.  Any-edge interrupt.
pub const BUTTON_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Boiler temperature: PT1000 divider on ADC1
// ---------------------------------------------------------------------------

/// GPIO 4 on the ESP32-S3 is ADC1 channel 3.
pub const RTD_ADC_GPIO: i32 = 4;
pub const RTD_ADC_CHANNEL: u32 = 3;

// ---------------------------------------------------------------------------
// Status LED (single colour, active HIGH)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 8;
