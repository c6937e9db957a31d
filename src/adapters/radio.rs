//! Simulated LoRaWAN radio.
//!
//! Implements [`RadioPort`] without a transceiver so the whole node runs on
//! the host and on boards without a LoRa shield.  OTAA joins complete after
//! a configurable number of `has_joined` polls; ABP is joined immediately.
//! Uplinks are checked against the EU868 maximum payload for the pinned
//! data rate and logged.
//!
//! This is also the radio the firmware image drives: nothing is keyed on
//! air.  [`RadioSettings`] are kept and reported through [`SimRadio::settings`]
//! but region, class, retries and ADR change no behaviour here; they are the
//! initialisation a transceiver adapter behind [`RadioPort`] would apply.

use core::cell::Cell;
use core::time::Duration;

use log::{debug, info};

use crate::activation::ActivationMode;
use crate::app::ports::RadioPort;
use crate::config::{DataRate, RadioSettings};
use crate::credentials::Eui64;
use crate::error::RadioError;

/// EU868 maximum application payload per data rate (no FOpts).
const MAX_PAYLOAD_BY_DR: [usize; 6] = [51, 51, 51, 115, 222, 222];

pub fn max_payload(rate: DataRate) -> usize {
    MAX_PAYLOAD_BY_DR[usize::from(rate.index())]
}

pub struct SimRadio {
    settings: RadioSettings,
    dev_eui: Eui64,
    /// `has_joined` polls an OTAA join needs before it reports success.
    otaa_join_polls: u32,
    mode: Option<ActivationMode>,
    polls: Cell<u32>,
    data_rate: DataRate,
    confirmed: bool,
    blocking: bool,
    uplinks: u32,
}

impl SimRadio {
    pub fn new(settings: RadioSettings, dev_eui: Eui64) -> Self {
        info!(
            "SimRadio: {:?} class {:?}, {} tx retries, ADR {}, DevEUI {}",
            settings.region,
            settings.device_class,
            settings.tx_retries,
            if settings.adr { "on" } else { "off" },
            dev_eui
        );
        Self {
            settings,
            dev_eui,
            otaa_join_polls: 2,
            mode: None,
            polls: Cell::new(0),
            data_rate: DataRate::Dr0,
            confirmed: false,
            blocking: false,
            uplinks: 0,
        }
    }

    /// Number of polls after which an OTAA join reports success.
    pub fn with_otaa_join_polls(mut self, polls: u32) -> Self {
        self.otaa_join_polls = polls;
        self
    }

    pub fn settings(&self) -> &RadioSettings {
        &self.settings
    }

    pub fn uplinks(&self) -> u32 {
        self.uplinks
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}

impl RadioPort for SimRadio {
    fn join(&mut self, mode: &ActivationMode, _timeout: Duration) -> Result<(), RadioError> {
        match mode {
            ActivationMode::Negotiated { app_eui, .. } => {
                info!("SimRadio: OTAA join request (AppEUI {})", app_eui);
            }
            ActivationMode::PreShared { dev_addr, .. } => {
                info!("SimRadio: ABP session DevAddr {}", dev_addr);
            }
        }
        self.mode = Some(*mode);
        self.polls.set(0);
        Ok(())
    }

    fn has_joined(&self) -> bool {
        match self.mode {
            None => false,
            Some(ActivationMode::PreShared { .. }) => true,
            Some(ActivationMode::Negotiated { .. }) => {
                let polls = self.polls.get();
                self.polls.set(polls.saturating_add(1));
                polls >= self.otaa_join_polls
            }
        }
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), RadioError> {
        self.data_rate = rate;
        Ok(())
    }

    fn set_confirmed(&mut self, confirmed: bool) -> Result<(), RadioError> {
        self.confirmed = confirmed;
        Ok(())
    }

    fn set_blocking(&mut self, blocking: bool) {
        self.blocking = blocking;
    }

    fn send(&mut self, payload: &[u8]) -> Result<usize, RadioError> {
        if self.mode.is_none() {
            return Err(RadioError::NotJoined);
        }
        if payload.len() > max_payload(self.data_rate) {
            return Err(RadioError::PayloadTooLarge);
        }
        self.uplinks = self.uplinks.wrapping_add(1);
        debug!(
            "SimRadio: uplink {} bytes DR{} {} (blocking={})",
            payload.len(),
            self.data_rate.index(),
            if self.confirmed { "confirmed" } else { "unconfirmed" },
            self.blocking
        );
        Ok(payload.len())
    }

    fn dev_eui(&self) -> Eui64 {
        self.dev_eui
    }
}
