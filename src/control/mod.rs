//! Boiler temperature control.
//!
//! ```text
//!  setpoint ──▶ ContinuousController ──duty 0..1──▶ RelayWindow ──▶ heater SSR
//!                      ▲                                 ▲
//!                      └──────── measured °C ────────────┘
//! ```
//!
//! [`heater::Heater`] ties the pieces together.  [`heater::ReadyLatch`]
//! tracks "at temperature" per setpoint for the machine FSM.

pub mod heater;
pub mod pid;
pub mod relay_window;

/// A controller that maps (measured, target) to a duty fraction in `[0, 1]`.
///
/// The relay window does not care how the fraction is computed; PID is the
/// production implementation, tests substitute fixed-duty controllers.
pub trait ContinuousController {
    /// Compute the next duty fraction.  `dt_secs` is the time since the
    /// previous call.
    fn compute(&mut self, measured: f32, target: f32, dt_secs: f32) -> f32;

    /// Drop accumulated state (integral, derivative history).
    fn reset(&mut self);
}
