//! NTP/DNS configuration via metalbox-subnet discovery, ported from
//! `_load_metalbox_devices_cache` / `_get_metalbox_ip_for_device` in
//! `config_generator.py`. The metalbox IP whose subnet contains a device's
//! OOB address is used as both its NTP server and DNS nameserver.

use std::collections::HashMap;
use std::net::IpAddr;

use serde_json::{Map, Value};

use core_model::{DeviceId, DeviceRole, InventorySnapshot};

/// Bulk-loaded once per sweep: every metalbox device's non-mgmt interface
/// addresses, flattened for subnet-containment lookup. Mirrors the
/// original's thread-local interface cache (`cache.py`) scoped to one
/// `generate_sonic_config` run instead of one process lifetime, since a
/// sweep's snapshot is already a fixed point-in-time view.
#[derive(Debug, Default, Clone)]
pub struct SonicSweepCache {
    metalbox_ips: Vec<IpAddr>,
}

impl SonicSweepCache {
    pub fn build(snapshot: &InventorySnapshot) -> Self {
        let mut metalbox_ips = Vec::new();
        let mut metalbox_devices: Vec<DeviceId> = snapshot
            .devices
            .values()
            .filter(|d| d.role == DeviceRole::Metalbox)
            .map(|d| d.id)
            .collect();
        metalbox_devices.sort();

        for device_id in metalbox_devices {
            let mut interfaces = snapshot.interfaces_of(device_id);
            interfaces.retain(|i| !i.mgmt_only);
            for iface in interfaces {
                for ip in snapshot.ips_of(iface.id) {
                    if let Ok(host) = ip.host() {
                        metalbox_ips.push(host);
                    }
                }
            }
        }
        Self { metalbox_ips }
    }

    /// The first metalbox IP whose subnet contains `device_oob_ip`, if any.
    pub fn metalbox_ip_for(
        &self,
        device_oob_ip: IpAddr,
        snapshot: &InventorySnapshot,
    ) -> Option<IpAddr> {
        self.metalbox_ips
            .iter()
            .find(|ip| {
                snapshot
                    .prefix_containing(**ip)
                    .map(|prefix| prefix.contains(device_oob_ip))
                    .unwrap_or(false)
            })
            .copied()
    }
}

/// `NTP_SERVER["<ip>"]` fields: always the same fixed profile, only the key
/// (the metalbox IP) varies per device.
pub fn ntp_server_fields() -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("maxpoll".to_string(), Value::from("10"));
    m.insert("minpoll".to_string(), Value::from("6"));
    m.insert("prefer".to_string(), Value::from("false"));
    m
}

/// `DNS_NAMESERVER["<ip>"]` has no fields of its own.
pub fn dns_nameserver_fields() -> Map<String, Value> {
    Map::new()
}
