//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the board if the control loop stops polling.  A hung loop with
//! the boiler SSR latched on is the failure this guards against, so the
//! watchdog panics (and reboots) rather than just logging.
//!
//! The main loop calls [`Watchdog::feed`] once per poll.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::{info, warn};

/// Default reset timeout.
pub const DEFAULT_TIMEOUT_MS: u32 = 2_000;

pub struct Watchdog {
    timeout_ms: u32,
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        let subscribed = {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI calls from the main task; `cfg` outlives them.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK {
                warn!("Watchdog: reconfigure returned {} (already configured?)", ret);
            }
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            if ret != ESP_OK {
                warn!("Watchdog: subscribe failed ({})", ret);
            }
            ret == ESP_OK
        };

        #[cfg(not(target_os = "espidf"))]
        let subscribed = false;

        if subscribed {
            info!("Watchdog: subscribed ({} ms, panic on trigger)", timeout_ms);
        } else {
            warn!("Watchdog: not armed");
        }
        Self {
            timeout_ms,
            subscribed,
        }
    }

    /// Feed the watchdog.  Must be called more often than the timeout.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the calling task was subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_armed(&self) -> bool {
        self.subscribed
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}
