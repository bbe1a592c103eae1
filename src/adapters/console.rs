//! Serial console command adapter.
//!
//! Implements [`CommandPort`] over the console UART.  The companion app
//! (or a person at a terminal) sends one command per line in the form
//! `keyword` or `keyword:value`, for example `setpointbrew:93.5`.
//!
//! - **`target_os = "espidf"`**: non-blocking reads from UART0 through the
//!   IDF UART driver, installed on first use.
//! - **`not(target_os = "espidf")`**: bytes arrive only through
//!   [`ConsoleCommands::feed`], for host-side testing and simulation.

use heapless::{Deque, Vec};
use log::warn;

use crate::app::commands::AppCommand;
use crate::app::ports::CommandPort;
use crate::error::CommandError;

/// Longest accepted command line, excluding the terminator.
pub const LINE_CAPACITY: usize = 64;

/// Decoded commands waiting for the controller.
const QUEUE_DEPTH: usize = 8;

#[cfg(target_os = "espidf")]
const CONSOLE_UART: i32 = 0;

pub struct ConsoleCommands {
    line: Vec<u8, LINE_CAPACITY>,
    /// The current line outgrew `line` and is dropped at its terminator.
    overflowed: bool,
    pending: Deque<AppCommand, QUEUE_DEPTH>,
    #[cfg(target_os = "espidf")]
    driver_ready: bool,
}

impl Default for ConsoleCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleCommands {
    pub fn new() -> Self {
        Self {
            line: Vec::new(),
            overflowed: false,
            pending: Deque::new(),
            #[cfg(target_os = "espidf")]
            driver_ready: false,
        }
    }

    /// Push raw console bytes through the line decoder.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            match b {
                b'\n' | b'\r' => self.end_line(),
                _ if self.overflowed => {}
                _ => {
                    if self.line.push(b).is_err() {
                        warn!("Console: line longer than {} bytes, dropping", LINE_CAPACITY);
                        self.overflowed = true;
                        self.line.clear();
                    }
                }
            }
        }
    }

    /// Commands decoded but not yet handed out.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn end_line(&mut self) {
        if core::mem::take(&mut self.overflowed) {
            return;
        }
        let decoded = match core::str::from_utf8(&self.line) {
            Ok(text) => parse_line(text),
            Err(_) => Some(Err(CommandError::UnknownKind)),
        };
        self.line.clear();

        match decoded {
            None => {}
            Some(Ok(cmd)) => {
                if self.pending.push_back(cmd).is_err() {
                    warn!("Console: command queue full, dropping {:?}", cmd);
                }
            }
            Some(Err(e)) => warn!("Console: rejected line ({})", e),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_uart(&mut self) {
        use esp_idf_svc::sys::*;

        if !self.driver_ready {
            // SAFETY: UART0 is the console port; the driver is installed at
            // most once, from the main task.
            let ret = unsafe {
                if uart_is_driver_installed(CONSOLE_UART) {
                    ESP_OK
                } else {
                    uart_driver_install(CONSOLE_UART, 256, 0, 0, core::ptr::null_mut(), 0)
                }
            };
            if ret != ESP_OK {
                warn!("Console: UART driver install failed (rc={})", ret);
                return;
            }
            self.driver_ready = true;
        }

        let mut buf = [0u8; LINE_CAPACITY];
        // SAFETY: `buf` outlives the call and its length is passed along;
        // zero ticks makes the read non-blocking.
        let n = unsafe {
            uart_read_bytes(CONSOLE_UART, buf.as_mut_ptr().cast(), buf.len() as u32, 0)
        };
        if n > 0 {
            self.feed(&buf[..n as usize]);
        }
    }
}

impl CommandPort for ConsoleCommands {
    fn poll(&mut self) -> Option<AppCommand> {
        #[cfg(target_os = "espidf")]
        if self.pending.is_empty() {
            self.read_uart();
        }
        self.pending.pop_front()
    }
}

/// Decode one console line.  `None` for a blank line.
pub fn parse_line(line: &str) -> Option<Result<AppCommand, CommandError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (kind, value) = match line.split_once(':') {
        Some((kind, value)) => (kind, Some(value.trim())),
        None => (line, None),
    };
    let value = match value.filter(|v| !v.is_empty()).map(str::parse::<f64>) {
        None => None,
        Some(Ok(v)) => Some(v),
        Some(Err(_)) => return Some(Err(CommandError::OutOfRange)),
    };
    Some(AppCommand::from_raw(kind, value))
}
