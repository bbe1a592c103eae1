//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] as byte blobs keyed by `(namespace, key)`.
//! On ESP-IDF every write is followed by `nvs_commit`, which the IDF makes
//! atomic.  On the host the store is an in-memory map used by the tests.

use crate::app::ports::{ConfigError, StorageError, StoragePort};
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::{cell::RefCell, collections::HashMap};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

/// NVS namespace and key names are limited to 15 bytes plus NUL.
const NVS_NAME_LEN: usize = 16;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blobs: RefCell<HashMap<(String, String), Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// A partition with no free pages or written by a newer IDF is erased
    /// and initialised again.  Anything else is an I/O error.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let mut ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: partition unusable ({}), erasing", ret);
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                ret = unsafe { nvs_flash_init() };
            }
            if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: flash ready");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: in-memory backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blobs: RefCell::new(HashMap::new()),
        })
    }

    /// NUL-terminated copy of an NVS name, truncated to 15 bytes.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; NVS_NAME_LEN] {
        let mut buf = [0u8; NVS_NAME_LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NVS_NAME_LEN - 1);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    #[cfg(not(target_os = "espidf"))]
    fn map_key(namespace: &str, key: &str) -> (String, String) {
        let trunc = |s: &str| s.chars().take(NVS_NAME_LEN - 1).collect::<String>();
        (trunc(namespace), trunc(key))
    }

    /// Open `namespace`, run `f` with the handle, close it again.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, StorageError> {
        let ns = Self::c_name(namespace);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(storage_error(ret));
        }
        let result = f(handle);
        // SAFETY: `handle` was opened above and is not used after this.
        unsafe { nvs_close(handle) };
        result.map_err(storage_error)
    }
}

#[cfg(target_os = "espidf")]
fn storage_error(ret: esp_err_t) -> StorageError {
    match ret {
        ESP_ERR_NVS_NOT_FOUND => StorageError::NotFound,
        ESP_ERR_NVS_NOT_ENOUGH_SPACE => StorageError::Full,
        other => {
            warn!("NVS: error {}", other);
            StorageError::IoError
        }
    }
}

#[cfg(target_os = "espidf")]
fn esp_check(ret: esp_err_t) -> Result<(), esp_err_t> {
    if ret == ESP_OK {
        Ok(())
    } else {
        Err(ret)
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let blobs = self.blobs.borrow();
            let data = blobs
                .get(&Self::map_key(namespace, key))
                .ok_or(StorageError::NotFound)?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, false, |handle| {
                let mut size = buf.len();
                // SAFETY: `buf` is valid for `size` bytes.
                esp_check(unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                })?;
                Ok(size)
            })
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.blobs
                .borrow_mut()
                .insert(Self::map_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, true, |handle| {
                // SAFETY: `data` is valid for `data.len()` bytes.
                esp_check(unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                })?;
                esp_check(unsafe { nvs_commit(handle) })
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.blobs.borrow_mut().remove(&Self::map_key(namespace, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
                if ret != ESP_ERR_NVS_NOT_FOUND {
                    esp_check(ret)?;
                }
                esp_check(unsafe { nvs_commit(handle) })
            })
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.blobs
                .borrow()
                .contains_key(&Self::map_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_handle(namespace, false, |handle| {
                let ret = unsafe {
                    nvs_find_key(handle, key.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            })
            .unwrap_or(false)
        }
    }
}
