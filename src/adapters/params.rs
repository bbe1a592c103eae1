//! Persisted user parameters on top of any [`StoragePort`].
//!
//! Every parameter lives under its own key in the `vbm` namespace,
//! `postcard`-encoded, so changing one value rewrites one small blob.
//!
//! | Parameter     | Key        | Type  |
//! |---------------|------------|-------|
//! | brew setpoint | `sp_brew`  | `f32` |
//! | steam setpoint| `sp_steam` | `f32` |
//! | schedule days | `t1_days`  | `u8`  |
//! | turn on at    | `t1_on`    | `u16` |
//! | turn off at   | `t1_off`   | `u16` |

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::ports::{ConfigError, Parameter, ParameterPort, StorageError, StoragePort};
use crate::config::StoredParameters;

pub const NAMESPACE: &str = "vbm";

const KEY_BREW: &str = "sp_brew";
const KEY_STEAM: &str = "sp_steam";
const KEY_DAYS: &str = "t1_days";
const KEY_ON: &str = "t1_on";
const KEY_OFF: &str = "t1_off";

/// Largest encoded value (an `f32` is 4 bytes, varints up to 3).
const MAX_VALUE_LEN: usize = 8;

pub struct ParameterStore<S> {
    storage: S,
}

impl<S: StoragePort> ParameterStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Borrow the underlying storage (tests inspect raw keys through it).
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Read and decode one key.  A missing key is `Ok(None)`; a value
    /// that no longer decodes is skipped with a warning.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let mut buf = [0u8; MAX_VALUE_LEN];
        let len = match self.storage.read(NAMESPACE, key, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Ok(None),
            Err(_) => return Err(ConfigError::IoError),
        };
        match postcard::from_bytes(&buf[..len]) {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!("Params: '{}' is corrupted, ignoring", key);
                Ok(None)
            }
        }
    }

    fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let mut buf = [0u8; MAX_VALUE_LEN];
        let bytes = postcard::to_slice(value, &mut buf).map_err(|_| StorageError::Encode)?;
        self.storage.write(NAMESPACE, key, bytes)
    }
}

impl<S: StoragePort> ParameterPort for ParameterStore<S> {
    fn load(&self) -> Result<StoredParameters, ConfigError> {
        let params = StoredParameters {
            brew_setpoint_c: self.get(KEY_BREW)?,
            steam_setpoint_c: self.get(KEY_STEAM)?,
            schedule_days: self.get(KEY_DAYS)?,
            turn_on_at_min: self.get(KEY_ON)?,
            turn_off_at_min: self.get(KEY_OFF)?,
        };
        info!("Params: loaded {:?}", params);
        Ok(params)
    }

    fn save(&mut self, param: Parameter) -> Result<(), StorageError> {
        match param {
            Parameter::BrewSetpoint(v) => self.put(KEY_BREW, &v),
            Parameter::SteamSetpoint(v) => self.put(KEY_STEAM, &v),
            Parameter::ScheduleDays(v) => self.put(KEY_DAYS, &v),
            Parameter::TurnOnAt(v) => self.put(KEY_ON, &v),
            Parameter::TurnOffAt(v) => self.put(KEY_OFF, &v),
        }?;
        info!("Params: saved {:?}", param);
        Ok(())
    }
}
