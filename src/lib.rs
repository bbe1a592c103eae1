//! VBM espresso machine controller library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod status;

// Hardware-facing layers.  Each keeps a host implementation so the
// crate builds and tests off-target.
pub mod adapters;
pub mod drivers;
pub mod sensors;
