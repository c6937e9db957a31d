//! Device registry: hardware unique id → provisioning record.
//!
//! The fleet table is a literal compiled into the firmware.  It is decoded
//! and validated once at boot by [`DeviceRegistry::from_entries`]; a bad
//! entry stops the boot instead of surfacing later as a failed join.

use log::info;

use crate::credentials::{AesKey, DevAddr, Eui64, HexId};
use crate::error::RegistryError;

/// Maximum number of devices the registry can hold (stack-allocated).
pub const MAX_DEVICES: usize = 32;

/// Human tag attached to each provisioned device (e.g. `PYCOM01`).
pub type DeviceTag = heapless::String<16>;

/// One row of the fleet table in its external (hex string) form.
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub unique_id: &'static str,
    pub dev_addr: &'static str,
    pub nwk_skey: &'static str,
    pub app_skey: &'static str,
    pub sequence_no: u16,
    pub tag: &'static str,
}

/// Decoded, immutable provisioning record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRecord {
    pub unique_id: Eui64,
    pub dev_addr: DevAddr,
    pub nwk_skey: AesKey,
    pub app_skey: AesKey,
    pub sequence_no: u16,
    pub tag: DeviceTag,
}

impl ProvisioningRecord {
    fn from_entry(entry: &RegistryEntry) -> Result<Self, RegistryError> {
        let mut tag = DeviceTag::new();
        tag.push_str(entry.tag).map_err(|_| RegistryError::TagTooLong)?;
        if entry.sequence_no == 0 {
            return Err(RegistryError::ZeroSequence);
        }
        Ok(Self {
            unique_id: Eui64::from_hex(entry.unique_id)?,
            dev_addr: DevAddr::from_hex(entry.dev_addr)?,
            nwk_skey: AesKey::from_hex(entry.nwk_skey)?,
            app_skey: AesKey::from_hex(entry.app_skey)?,
            sequence_no: entry.sequence_no,
            tag,
        })
    }

    /// Registry key: uppercase hex of the unique id.
    pub fn key(&self) -> HexId {
        self.unique_id.to_hex()
    }
}

/// Read-only lookup table of provisioned devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    records: heapless::Vec<ProvisioningRecord, MAX_DEVICES>,
}

impl DeviceRegistry {
    /// Decode and validate every entry of a fleet table.
    pub fn from_entries(entries: &[RegistryEntry]) -> Result<Self, RegistryError> {
        let mut records = heapless::Vec::new();
        for entry in entries {
            let record = ProvisioningRecord::from_entry(entry)?;
            if records
                .iter()
                .any(|r: &ProvisioningRecord| r.unique_id == record.unique_id)
            {
                return Err(RegistryError::DuplicateId);
            }
            records.push(record).map_err(|_| RegistryError::Full)?;
        }
        info!("Registry: {} provisioned devices", records.len());
        Ok(Self { records })
    }

    /// Look up a device by its uppercase hex unique id.
    pub fn lookup(&self, unique_id: &str) -> Option<&ProvisioningRecord> {
        self.records
            .iter()
            .find(|r| r.key().as_str() == unique_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fleet table for the deployed test nodes.
pub const FLEET: &[RegistryEntry] = &[
    RegistryEntry {
        unique_id: "70B3D54994DE968F",
        dev_addr: "00000001",
        nwk_skey: "00000000000000000000000000000001",
        app_skey: "00000000000000000000000000000001",
        sequence_no: 1,
        tag: "PYCOM01",
    },
    RegistryEntry {
        unique_id: "70B3D5499A3C1F22",
        dev_addr: "00000002",
        nwk_skey: "00000000000000000000000000000002",
        app_skey: "00000000000000000000000000000002",
        sequence_no: 2,
        tag: "PYCOM02",
    },
    RegistryEntry {
        unique_id: "70B3D549917B0A6E",
        dev_addr: "00000003",
        nwk_skey: "00000000000000000000000000000003",
        app_skey: "00000000000000000000000000000003",
        sequence_no: 3,
        tag: "PYCOM03",
    },
    RegistryEntry {
        unique_id: "70B3D5499E45D3B1",
        dev_addr: "00000004",
        nwk_skey: "00000000000000000000000000000004",
        app_skey: "00000000000000000000000000000004",
        sequence_no: 4,
        tag: "PYCOM04",
    },
];
