//! LoRa DevEUI for this board.
//!
//! Boards whose LoRa module carries a factory DevEUI get it written into the
//! node config at provisioning time; that id is the key the device registry
//! is indexed by.  Without one, the 6-byte eFuse MAC is expanded to an
//! EUI-64 by inserting `FF FE` between the OUI and the NIC-specific half.
//! A derived id is stable across reboots but only resolves once the fleet
//! table carries an entry for it.

use log::info;

use crate::credentials::Eui64;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a fixed, locally administered MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x02, 0x00, 0x00, 0xDE, 0x96, 0x8F]
}

/// Expand a MAC-48 to EUI-64: `AA:BB:CC:DD:EE:FF` → `AABBCCFFFEDDEEFF`.
pub fn eui64_from_mac(mac: &MacAddress) -> Eui64 {
    Eui64([mac[0], mac[1], mac[2], 0xFF, 0xFE, mac[3], mac[4], mac[5]])
}

/// DevEUI the radio reports for this board: the provisioned id when there
/// is one, otherwise the MAC-derived EUI-64.
pub fn read_dev_eui(provisioned: Option<Eui64>) -> Eui64 {
    match provisioned {
        Some(eui) => {
            info!("DevEUI {} (provisioned)", eui);
            eui
        }
        None => {
            let eui = eui64_from_mac(&read_mac());
            info!("DevEUI {} (derived from MAC)", eui);
            eui
        }
    }
}
