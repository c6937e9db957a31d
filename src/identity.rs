//! Identity resolution: radio DevEUI → provisioning record.

use log::{info, warn};

use crate::credentials::{Eui64, HexId};
use crate::error::IdentityError;
use crate::registry::{DeviceRegistry, ProvisioningRecord};

/// Format a raw hardware identifier as a registry key (uppercase hex).
pub fn registry_key(hardware_id: &[u8]) -> Result<HexId, IdentityError> {
    let id: [u8; 8] = hardware_id
        .try_into()
        .map_err(|_| IdentityError::InvalidLength(hardware_id.len()))?;
    Ok(Eui64(id).to_hex())
}

/// Resolve the local radio's unique id to its provisioning record.
///
/// An unknown id is a configuration fault and is never retried.
pub fn resolve<'r>(
    registry: &'r DeviceRegistry,
    hardware_id: &[u8],
) -> Result<&'r ProvisioningRecord, IdentityError> {
    let key = registry_key(hardware_id)?;
    match registry.lookup(&key) {
        Some(record) => {
            info!(
                "Identity: {} -> {} (DevAddr {}, seq {})",
                key, record.tag, record.dev_addr, record.sequence_no
            );
            Ok(record)
        }
        None => {
            warn!("Identity: {} not in registry", key);
            Err(IdentityError::NotProvisioned)
        }
    }
}
