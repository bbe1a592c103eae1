//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MachineController (domain)
//! ```
//!
//! Driven adapters (temperature probe, relays, button, command link,
//! clock, storage, event sinks) implement these traits.  The
//! [`MachineController`](super::controller::MachineController) consumes
//! them via generics, so the domain core never touches hardware directly.

use crate::drivers::button::ButtonSample;
use crate::scheduler::WallTime;
use crate::status::StatusCode;

// ───────────────────────────────────────────────────────────────
// Input ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Boiler temperature probe.
pub trait TemperaturePort {
    /// Current boiler temperature in °C.  NaN when the probe cannot be read.
    fn read_celsius(&mut self) -> f32;
}

/// Group-head brew lever.
pub trait BrewLeverPort {
    /// `true` while the lever is in the brew position.
    fn is_brewing(&mut self) -> bool;
}

/// Front-panel push-button.
pub trait ButtonPort {
    /// Edges observed since the previous call.
    fn sample(&mut self) -> ButtonSample;
}

/// Inbound command link (serial console, companion app).
pub trait CommandPort {
    /// Next decoded command, or `None` when nothing is waiting.
    fn poll(&mut self) -> Option<super::commands::AppCommand>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Drive the boiler heater SSR.
    fn set_heater(&mut self, on: bool);

    /// Drive the pump SSR.
    fn set_pump(&mut self, on: bool);

    /// Show a status code on the indicator.
    fn set_status(&mut self, code: StatusCode);

    /// De-energise heater and pump.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds plus a settable wall clock.
pub trait ClockPort {
    /// Milliseconds since boot, wrapping at `u32::MAX`.
    fn now_ms(&self) -> u32;

    /// Calendar time, or `None` until the wall clock has been set.
    fn wall_time(&self) -> Option<WallTime>;

    /// Set the wall clock to `unix_secs`.
    fn set_unix_time(&mut self, unix_secs: i64);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / app link)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Parameter port (driven adapter: domain ↔ persisted parameters)
// ───────────────────────────────────────────────────────────────

/// A single persisted parameter and its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    BrewSetpoint(f32),
    SteamSetpoint(f32),
    ScheduleDays(u8),
    TurnOnAt(u16),
    TurnOffAt(u16),
}

/// Loads and persists the user-adjustable parameters.
///
/// Each parameter is stored independently so a command that changes one
/// value writes only that value.
pub trait ParameterPort {
    /// Read every stored parameter.  Missing keys come back as `None`.
    fn load(&self) -> Result<crate::config::StoredParameters, ConfigError>;

    /// Persist one parameter.
    fn save(&mut self, param: Parameter) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage backed by NVS.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration loading and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored value failed deserialization.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Value could not be encoded for storage.
    Encode,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Encode => write!(f, "encode failed"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
