//! Fuzz target: credential hex decoding
//!
//! Drives arbitrary strings through the typed decoders used for the fleet
//! table and the OTAA configuration, and asserts that a successful decode
//! always re-encodes to the uppercase form of its input.
//!
//! cargo fuzz run fuzz_credentials

#![no_main]

use libfuzzer_sys::fuzz_target;
use loranode::credentials::{AesKey, DevAddr, Eui64};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(eui) = Eui64::from_hex(s) {
        assert_eq!(eui.to_hex().as_str(), s.to_ascii_uppercase());
    }
    if let Ok(addr) = DevAddr::from_hex(s) {
        assert_eq!(format!("{addr}"), s.to_ascii_uppercase());
    }
    if let Ok(key) = AesKey::from_hex(s) {
        assert_eq!(key.as_bytes().len(), 16);
        assert_eq!(s.len(), 32);
    }
});
