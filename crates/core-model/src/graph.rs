use std::collections::HashMap;

use crate::cable::Cable;
use crate::device::Device;
use crate::ids::{CableId, DeviceId, InterfaceId, IpAddressId, PrefixId, VrfId};
use crate::interface::Interface;
use crate::ip::{IpAddress, Prefix};
use crate::vrf::Vrf;

/// A read-only snapshot of the Inventory graph for one sweep / one
/// `generate()` call. All cross-references are by id; traversals go
/// through these maps rather than embedded pointers (spec.md §9).
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    pub devices: HashMap<DeviceId, Device>,
    pub interfaces: HashMap<InterfaceId, Interface>,
    pub cables: HashMap<CableId, Cable>,
    pub ip_addresses: HashMap<IpAddressId, IpAddress>,
    pub prefixes: HashMap<PrefixId, Prefix>,
    pub vrfs: HashMap<VrfId, Vrf>,
}

impl InventorySnapshot {
    pub fn interfaces_of(&self, device_id: DeviceId) -> Vec<&Interface> {
        let mut v: Vec<&Interface> = self
            .interfaces
            .values()
            .filter(|i| i.device_id == device_id)
            .collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    pub fn ips_of(&self, interface_id: InterfaceId) -> Vec<&IpAddress> {
        self.ip_addresses
            .values()
            .filter(|ip| ip.interface_id == Some(interface_id))
            .collect()
    }

    pub fn cable_peer(&self, interface_id: InterfaceId) -> Option<InterfaceId> {
        self.cables.values().find_map(|c| c.peer_of(interface_id))
    }

    pub fn device_of_interface(&self, interface_id: InterfaceId) -> Option<&Device> {
        let iface = self.interfaces.get(&interface_id)?;
        self.devices.get(&iface.device_id)
    }

    pub fn find_device_by_name(&self, name: &str) -> Option<&Device> {
        self.devices.values().find(|d| d.name == name)
    }

    pub fn prefix_for_ip(&self, ip: &IpAddress) -> Option<&Prefix> {
        let host = ip.host().ok()?;
        self.prefixes.values().find(|p| p.contains(host))
    }

    pub fn prefix_containing(&self, addr: std::net::IpAddr) -> Option<&Prefix> {
        self.prefixes.values().find(|p| p.contains(addr))
    }

    pub fn vrf_name(&self, vrf_id: VrfId) -> Option<&str> {
        self.vrfs.get(&vrf_id).map(|v| v.name.as_str())
    }

    pub fn lag_members(&self, lag_id: InterfaceId) -> Vec<&Interface> {
        let mut v: Vec<&Interface> = self
            .interfaces
            .values()
            .filter(|i| i.lag_parent == Some(lag_id))
            .collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }
}
