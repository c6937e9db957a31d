//! LoRaNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the firmware
//! entry point. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod activation;
pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod payload;
pub mod registry;
pub mod scheduler;

// Platform adapters; ESP-IDF paths are selected by cfg inside each one.
pub mod adapters;
