//! Actuator and input drivers, hardware initialisation, and peripheral helpers.

pub mod button;
pub mod hw_init;
pub mod lever;
pub mod relay;
pub mod status_led;
pub mod watchdog;
