//! Sensor drivers.
//!
//! The espresso machine has a single analogue sensor, the boiler RTD.
//! The brew lever and the front-panel button are plain digital inputs and
//! live in [`crate::drivers`].

pub mod temperature;
