//! Unified error types for the VBM firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the safety supervisor and FSM without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The parameter store failed.
    Storage(StorageError),
    /// An inbound command could not be decoded.
    Command(CommandError),
    /// A control fault was raised.
    Fault(ControlFault),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Fault(e) => write!(f, "fault: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Command decoding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The command kind is not recognised.
    UnknownKind,
    /// The command needs a value and none was supplied.
    MissingValue,
    /// The value is outside the accepted range for this command.
    OutOfRange,
    /// The command needs wall-clock time and the clock has not been set.
    ClockNotSet,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind => write!(f, "unknown command"),
            Self::MissingValue => write!(f, "missing value"),
            Self::OutOfRange => write!(f, "value out of range"),
            Self::ClockNotSet => write!(f, "clock not set"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Control faults
// ---------------------------------------------------------------------------

/// Faults that send the machine to `Error` and de-energise the heater.
/// Accumulated in a bitfield so simultaneous faults can be reported together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlFault {
    /// The button input produced an impossible sequence or a stuck contact.
    ButtonSequence = 0b0000_0001,
    /// The boiler temperature reading is NaN or physically implausible.
    SensorFault = 0b0000_0010,
    /// The boiler is hotter than the configured ceiling plus margin.
    OverTemperature = 0b0000_0100,
}

impl ControlFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ControlFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ButtonSequence => write!(f, "button sequence"),
            Self::SensorFault => write!(f, "temperature sensor fault"),
            Self::OverTemperature => write!(f, "over temperature"),
        }
    }
}

impl From<ControlFault> for Error {
    fn from(e: ControlFault) -> Self {
        Self::Fault(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
