//! Node configuration parameters
//!
//! All tunable parameters for the LoRaNode uplink cycle.
//! Values can be overridden via NVS (non-volatile storage); they are fixed
//! for the lifetime of a boot.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::activation::{ActivationMode, ActivationSettings, JoinPolicy};
use crate::app::ports::ConfigError;
use crate::credentials::{AesKey, Eui64};
use crate::error::DecodeError;
use crate::registry::ProvisioningRecord;

/// How the node joins the network.  A static choice per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationKind {
    /// Over-the-air activation (negotiated session keys).
    Otaa,
    /// Activation by personalisation (pre-shared session keys).
    Abp,
}

/// LoRaWAN data rate index.  Lower index = higher spreading factor =
/// longer range, lower throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataRate {
    Dr0 = 0,
    Dr1 = 1,
    Dr2 = 2,
    Dr3 = 3,
    Dr4 = 4,
    Dr5 = 5,
}

impl DataRate {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Regional channel plan the radio stack is initialised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Eu868,
    Us915,
    As923,
    Au915,
}

/// LoRaWAN device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    A,
    C,
}

/// Radio stack initialisation, handed to the radio adapter at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioSettings {
    pub region: Region,
    pub device_class: DeviceClass,
    /// MAC-level retransmissions for confirmed uplinks.
    pub tx_retries: u8,
    /// Adaptive data rate.  Off: the configured data rate is pinned.
    pub adr: bool,
    /// Public network sync word.
    pub public_network: bool,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            region: Region::Eu868,
            device_class: DeviceClass::C,
            tx_retries: 3,
            adr: false,
            public_network: true,
        }
    }
}

/// What the uplink loop does when the payload producer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProducerFaultPolicy {
    /// Skip the cycle; no message, no sequence number consumed.
    SkipCycle,
    /// Resend the last good payload; skip if there is none yet.
    ReuseLast,
}

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Schedule ---
    /// Fixed part of the uplink period (milliseconds)
    pub fixed_interval_ms: u32,
    /// Random extra delay window added to every period (milliseconds)
    pub jitter_window_ms: u32,

    // --- Activation ---
    /// Factory DevEUI of the LoRa module, hex.  `None` derives the id from
    /// the eFuse MAC.
    pub dev_eui: Option<heapless::String<16>>,
    pub activation: ActivationKind,
    /// OTAA application (join) EUI, hex
    pub app_eui: heapless::String<16>,
    /// OTAA application key, hex
    pub app_key: heapless::String<32>,
    /// Delay between `has_joined` polls (milliseconds)
    pub join_poll_interval_ms: u32,
    pub join_policy: JoinPolicy,

    // --- Delivery ---
    pub data_rate: DataRate,
    /// Acknowledged uplinks
    pub confirmed: bool,
    /// Sequence number of the first uplink after boot
    pub initial_sequence: u32,
    pub producer_fault: ProducerFaultPolicy,

    // --- Radio ---
    pub radio: RadioSettings,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Schedule: 10 s + U(0, 10 s)
            fixed_interval_ms: 10_000,
            jitter_window_ms: 10_000,

            // Activation
            dev_eui: None,
            activation: ActivationKind::Otaa,
            app_eui: heapless::String::try_from("1234567890ABCDEF").unwrap_or_default(),
            app_key: heapless::String::try_from("00000000000000000000000000000001")
                .unwrap_or_default(),
            join_poll_interval_ms: 2_500,
            join_policy: JoinPolicy::RetryForever,

            // Delivery
            data_rate: DataRate::Dr0,
            confirmed: false,
            initial_sequence: 0,
            producer_fault: ProducerFaultPolicy::ReuseLast,

            radio: RadioSettings::default(),
        }
    }
}

impl NodeConfig {
    pub fn fixed_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.fixed_interval_ms))
    }

    pub fn jitter_window(&self) -> Duration {
        Duration::from_millis(u64::from(self.jitter_window_ms))
    }

    pub fn activation_settings(&self) -> ActivationSettings {
        ActivationSettings {
            poll_interval: Duration::from_millis(u64::from(self.join_poll_interval_ms)),
            policy: self.join_policy,
            data_rate: self.data_rate,
            confirmed: self.confirmed,
        }
    }

    /// DevEUI written at provisioning time, if any.
    pub fn provisioned_dev_eui(&self) -> Result<Option<Eui64>, DecodeError> {
        self.dev_eui.as_deref().map(Eui64::from_hex).transpose()
    }

    /// Build the activation mode for this boot.
    ///
    /// OTAA credentials come from the configuration; ABP session parameters
    /// come from the device's provisioning record.
    pub fn activation_mode(
        &self,
        record: &ProvisioningRecord,
    ) -> Result<ActivationMode, DecodeError> {
        match self.activation {
            ActivationKind::Otaa => Ok(ActivationMode::Negotiated {
                app_eui: Eui64::from_hex(&self.app_eui)?,
                app_key: AesKey::from_hex(&self.app_key)?,
            }),
            ActivationKind::Abp => Ok(ActivationMode::PreShared {
                dev_addr: record.dev_addr,
                nwk_skey: record.nwk_skey,
                app_skey: record.app_skey,
            }),
        }
    }

    /// Range-check every field and decode the OTAA credentials.
    ///
    /// Called before a config is persisted and at boot, so a malformed value
    /// stops the node before it ever touches the radio.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "fixed_interval_ms must be > 0",
            ));
        }
        if self.jitter_window_ms > 24 * 3_600_000 {
            return Err(ConfigError::ValidationFailed(
                "jitter_window_ms must be at most one day",
            ));
        }
        if self.join_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "join_poll_interval_ms must be > 0",
            ));
        }
        if self.join_policy == (JoinPolicy::Bounded { max_polls: 0 }) {
            return Err(ConfigError::ValidationFailed(
                "bounded join policy needs max_polls > 0",
            ));
        }
        if self.radio.tx_retries > 8 {
            return Err(ConfigError::ValidationFailed("tx_retries must be 0–8"));
        }
        self.provisioned_dev_eui()
            .map_err(|_| ConfigError::ValidationFailed("dev_eui must be 16 hex digits"))?;
        if self.activation == ActivationKind::Otaa {
            Eui64::from_hex(&self.app_eui)
                .map_err(|_| ConfigError::ValidationFailed("app_eui must be 16 hex digits"))?;
            AesKey::from_hex(&self.app_key)
                .map_err(|_| ConfigError::ValidationFailed("app_key must be 32 hex digits"))?;
        }
        Ok(())
    }
}
