//! Device discovery for the side panel: kernel neighbour table plus the host's
//! own interfaces. Informational only; never feeds the scorer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use sysinfo::Networks;

const ARP_TABLE: &str = "/proc/net/arp";
/// ATF_COM: neighbour entry is complete
const ARP_FLAG_COMPLETE: u32 = 0x2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub address: String,
    pub hardware_id: String,
    pub status: String,
    pub device_type: String,
}

impl DiscoveredDevice {
    fn new(address: &str, hardware_id: &str, status: &str, device_type: &str) -> Self {
        Self {
            address: address.to_string(),
            hardware_id: hardware_id.to_string(),
            status: status.to_string(),
            device_type: device_type.to_string(),
        }
    }
}

fn guess_type(address: &str) -> &'static str {
    if address.ends_with(".1") || address.ends_with(".254") {
        "Router / Gateway"
    } else {
        "Unknown Device"
    }
}

/// Parse `/proc/net/arp` content. Header line and malformed rows are skipped.
pub fn parse_arp_table(table: &str) -> Vec<DiscoveredDevice> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            let flags = u32::from_str_radix(cols[2].trim_start_matches("0x"), 16).ok()?;
            let status = if flags & ARP_FLAG_COMPLETE != 0 { "Online" } else { "Stale" };
            Some(DiscoveredDevice::new(cols[0], cols[3], status, guess_type(cols[0])))
        })
        .collect()
}

/// Fixed roster shown when nothing can be scanned.
pub fn synthetic_devices() -> Vec<DiscoveredDevice> {
    vec![
        DiscoveredDevice::new("192.168.1.1", "a4:2b:b0:11:02:01", "Online", "Router / Gateway"),
        DiscoveredDevice::new("192.168.1.5", "3c:22:fb:8e:41:9a", "Online", "My Laptop"),
        DiscoveredDevice::new("192.168.1.12", "f4:f5:d8:20:7c:33", "Online", "Smart TV"),
        DiscoveredDevice::new("192.168.1.23", "d8:f1:5b:9e:00:17", "Online", "Smart Bulb (IoT)"),
        DiscoveredDevice::new("192.168.1.40", "ac:37:43:5d:a2:e8", "Idle", "Phone"),
    ]
}

fn local_interfaces() -> Vec<DiscoveredDevice> {
    let networks = Networks::new_with_refreshed_list();
    networks
        .iter()
        .filter(|(_, data)| data.mac_address().0 != [0u8; 6])
        .map(|(name, data)| {
            DiscoveredDevice::new(name, &data.mac_address().to_string(), "Self", "This Device")
        })
        .collect()
}

fn scan(arp_path: &Path) -> std::io::Result<Vec<DiscoveredDevice>> {
    let table = std::fs::read_to_string(arp_path)?;
    let mut devices = parse_arp_table(&table);
    devices.extend(local_interfaces());
    Ok(devices)
}

/// Discover neighbours; falls back to [`synthetic_devices`] on error or an empty table.
pub fn discover_devices() -> Vec<DiscoveredDevice> {
    discover_from(Path::new(ARP_TABLE))
}

pub(crate) fn discover_from(arp_path: &Path) -> Vec<DiscoveredDevice> {
    match scan(arp_path) {
        Ok(devices) if !devices.is_empty() => {
            tracing::info!(count = devices.len(), "network scan complete");
            devices
        }
        Ok(_) => {
            tracing::info!("network scan found nothing; showing simulated devices");
            synthetic_devices()
        }
        Err(e) => {
            tracing::warn!(error = %e, "network scan unavailable; showing simulated devices");
            synthetic_devices()
        }
    }
}
