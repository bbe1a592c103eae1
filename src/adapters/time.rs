//! System clock adapter.
//!
//! Implements [`ClockPort`]: a monotonic millisecond counter plus a wall
//! clock that starts unset and is anchored by `SetUnixTime`.
//!
//! - **`target_os = "espidf"`** — `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — `std::time::Instant` for host-side
//!   testing and simulation.

use log::{info, warn};

use crate::app::ports::ClockPort;
use crate::scheduler::WallTime;

/// Anything before 2020-01-01 is treated as a bogus clock value.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    /// `(unix_secs, uptime_us)` at the moment the wall clock was set.
    anchor: Option<(i64, u64)>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            anchor: None,
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer is started by the IDF before app_main.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Current unix seconds, `None` until set.
    pub fn unix_secs(&self) -> Option<i64> {
        let (unix, at_us) = self.anchor?;
        let elapsed = self.uptime_us().saturating_sub(at_us) / 1_000_000;
        Some(unix.saturating_add(elapsed as i64))
    }
}

impl ClockPort for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation gives the wrapping millisecond counter.
        (self.uptime_us() / 1_000) as u32
    }

    fn wall_time(&self) -> Option<WallTime> {
        WallTime::from_unix(self.unix_secs()?)
    }

    fn set_unix_time(&mut self, unix_secs: i64) {
        if unix_secs < EPOCH_2020 {
            warn!("Clock: rejecting unix time {} (before 2020)", unix_secs);
            return;
        }
        self.anchor = Some((unix_secs, self.uptime_us()));
        info!("Clock: wall time set to {}", unix_secs);
    }
}
