//! BFD eligibility and fixed profile fields, ported from `bfd.py`.

use serde_json::{Map, Value};

use core_model::{Device, Interface};

/// `should_interface_have_bfd`: all four conditions must hold.
pub fn should_interface_have_bfd(
    has_bgp_neighbor: bool,
    is_portchannel_member: bool,
    connected_device: &Device,
    has_transfer_ipv4_or_no_direct_ipv4: bool,
) -> bool {
    has_bgp_neighbor
        && !is_portchannel_member
        && connected_device.role.is_bfd_enabled()
        && has_transfer_ipv4_or_no_direct_ipv4
}

/// Whether `interface` carries a directly-assigned IPv4 address — used by
/// both the BGP and BFD eligibility checks for the "transfer IPv4 or no
/// direct IPv4" condition.
pub fn has_direct_ipv4(interface: &Interface, addresses: &[&core_model::IpAddress]) -> bool {
    addresses
        .iter()
        .any(|ip| ip.interface_id == Some(interface.id) && ip.family == core_model::AddressFamily::V4)
}

/// `BFD_PROFILE["default"]`: fixed values, never derived from inventory
/// data.
pub fn default_bfd_profile() -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("detect_multiplier".to_string(), Value::from("3"));
    m.insert("desired_min_tx".to_string(), Value::from("300"));
    m.insert("required_min_rx".to_string(), Value::from("300"));
    m.insert("passive_mode".to_string(), Value::from("false"));
    m
}

/// `BFD_PEER["default|<interface>"]` row fields.
pub fn bfd_peer_fields() -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("profile".to_string(), Value::from("default"));
    m.insert("multihop".to_string(), Value::from("false"));
    m
}

pub fn bfd_peer_key(interface_name: &str) -> String {
    format!("default|{interface_name}")
}
