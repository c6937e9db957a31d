//! Fuzz target: stored config blob
//!
//! Feeds arbitrary bytes to the NVS config loader (simulation backend).
//! A blob either loads as a config that validates or is reported as
//! corrupted; it never panics and never yields an invalid config.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use loranode::adapters::nvs::NvsAdapter;
use loranode::app::ports::{ConfigError, ConfigPort};

fuzz_target!(|data: &[u8]| {
    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.put_raw(data);
    match nvs.load() {
        Ok(cfg) => assert!(cfg.validate().is_ok()),
        Err(e) => assert_eq!(e, ConfigError::Corrupted),
    }
});
