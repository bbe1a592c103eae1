//! Time-proportioned relay output.
//!
//! A solid-state relay cannot be driven with PWM at mains-cycle
//! granularity, so the duty fraction is spread over a fixed window:
//! the relay is on for the first `duty * window` milliseconds of each
//! window and off for the rest.
//!
//! ```text
//!  duty = 0.5, window = 3000 ms
//!
//!  ┌──────────┐          ┌──────────┐
//!  │   ON     │   OFF    │   ON     │   OFF
//! ─┘          └──────────┘          └──────────
//!  0        1500       3000       4500       6000 ms
//! ```
//!
//! Timestamps are `u32` milliseconds and wrap; all arithmetic is
//! wrapping so the window survives the 49.7-day rollover.

/// Windowed relay state.
#[derive(Debug, Clone)]
pub struct RelayWindow {
    window_ms: u32,
    /// Start of the current window.  `None` until the first call.
    window_start: Option<u32>,
}

impl RelayWindow {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: window_ms.max(1),
            window_start: None,
        }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Decide the relay level for `now_ms`.
    ///
    /// `duty` is clamped to `[0, 1]`.  Once `measured >= target` the relay
    /// is forced off regardless of where in the window we are.
    pub fn compute(&mut self, now_ms: u32, measured: f32, target: f32, duty: f32) -> bool {
        let start = *self.window_start.get_or_insert(now_ms);

        let mut elapsed = now_ms.wrapping_sub(start);
        if elapsed >= self.window_ms {
            // Advance by whole windows so the anchor never passes `now`.
            let whole = elapsed / self.window_ms * self.window_ms;
            self.window_start = Some(start.wrapping_add(whole));
            elapsed -= whole;
        }

        if measured >= target {
            return false;
        }
        let duty = if duty.is_nan() { 0.0 } else { duty.clamp(0.0, 1.0) };
        (elapsed as f32) < duty * self.window_ms as f32
    }

    /// Forget the anchor; the next call starts a fresh window.
    pub fn reset(&mut self) {
        self.window_start = None;
    }
}
