//! Fuzz target: `ParameterStore` over arbitrary stored bytes
//!
//! Fills every parameter key with attacker-chosen blobs and verifies:
//! - `load` never panics
//! - whatever survives `MachineConfig::apply` still validates
//!
//! cargo fuzz run fuzz_param_store

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use vbm::adapters::params::{ParameterStore, NAMESPACE};
use vbm::app::ports::{ParameterPort, StorageError, StoragePort};
use vbm::config::MachineConfig;

const KEYS: [&str; 5] = ["sp_brew", "sp_steam", "t1_days", "t1_on", "t1_off"];

struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.data.get(&format!("{ns}::{key}")) {
            Some(v) if v.len() <= buf.len() => {
                buf[..v.len()].copy_from_slice(v);
                Ok(v.len())
            }
            Some(_) => Err(StorageError::IoError),
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }
}

fuzz_target!(|data: &[u8]| {
    // First byte picks which keys are present, the rest is split evenly.
    let Some((&present, rest)) = data.split_first() else {
        return;
    };
    let chunk = (rest.len() / KEYS.len()).max(1);

    let mut store = MemStore { data: HashMap::new() };
    for (i, key) in KEYS.iter().enumerate() {
        if present & (1 << i) == 0 {
            continue;
        }
        let blob = rest.chunks(chunk).nth(i).unwrap_or(&[]);
        store.data.insert(format!("{NAMESPACE}::{key}"), blob.to_vec());
    }

    let params = ParameterStore::new(store);
    if let Ok(stored) = params.load() {
        let mut config = MachineConfig::default();
        config.apply(&stored);
        assert!(config.validate().is_ok(), "applied config invalid: {config:?}");
    }
});
