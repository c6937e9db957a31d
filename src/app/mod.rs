//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the startup and uplink orchestration for the node:
//! identity resolution, activation, and the scheduled uplink loop.  All
//! interaction with the radio, clock and sensors happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod events;
pub mod ports;
pub mod service;
