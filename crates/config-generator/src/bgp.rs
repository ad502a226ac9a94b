//! Local AS derivation, spine/superspine AS sharing, and BGP neighbor/peer
//! construction, ported from the original's `bgp.py` and the BGP-related
//! helpers in `config_generator.py` (`_determine_peer_type`,
//! `_add_bgp_configurations`).

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use serde_json::{Map, Value};

use core_model::{Device, DeviceId, InventorySnapshot};

use crate::connections::find_interconnected_devices;
use crate::constants::DEFAULT_LOCAL_AS_PREFIX;
use crate::error::ConfigGeneratorError;

/// `calculate_local_asn_from_ipv4`: AS = prefix*10^6 + third_octet*10^3 +
/// fourth_octet, built the same way the original does — decimal-string
/// concatenation of zero-padded octets — so a malformed address fails the
/// same way (parse error) rather than producing a silently-wrong number.
pub fn local_asn_from_ipv4(addr: IpAddr) -> Result<u64, ConfigGeneratorError> {
    local_asn_from_ipv4_with_prefix(addr, DEFAULT_LOCAL_AS_PREFIX)
}

pub fn local_asn_from_ipv4_with_prefix(
    addr: IpAddr,
    prefix: u64,
) -> Result<u64, ConfigGeneratorError> {
    let IpAddr::V4(v4) = addr else {
        return Err(ConfigGeneratorError::InvalidAsnSource(addr.to_string()));
    };
    let octets = v4.octets();
    let encoded = format!("{prefix}{:03}{:03}", octets[2], octets[3]);
    encoded
        .parse()
        .map_err(|_| ConfigGeneratorError::InvalidAsnSource(addr.to_string()))
}

fn primary_ipv4_of(device: &Device) -> Option<Ipv4Addr> {
    match device.primary_ipv4 {
        Some(IpAddr::V4(v4)) => Some(v4),
        _ => None,
    }
}

/// `calculate_minimum_as_for_group`: the lowest AS among devices in the
/// group that have a usable IPv4 primary address. Devices without one, or
/// whose address somehow fails to encode, are skipped rather than failing
/// the whole group.
pub fn minimum_as_for_group(devices: &[&Device]) -> Option<u64> {
    devices
        .iter()
        .filter_map(|d| primary_ipv4_of(d))
        .filter_map(|v4| local_asn_from_ipv4(IpAddr::V4(v4)).ok())
        .min()
}

/// Builds the shared AS map for spine/superspine devices: every device in
/// an interconnected component gets the minimum AS found across that
/// component (`find_interconnected_spine_groups` + per-group
/// `calculate_minimum_as_for_group` in the original, now routed through the
/// shared `find_interconnected_devices`).
pub fn compute_spine_as_mapping(
    devices: &[&Device],
    snapshot: &InventorySnapshot,
) -> HashMap<DeviceId, u64> {
    let spine_devices: Vec<&Device> =
        devices.iter().copied().filter(|d| d.role.is_spine_family()).collect();
    let groups = find_interconnected_devices(&spine_devices, snapshot);

    let mut mapping = HashMap::new();
    for group in groups {
        let group_devices: Vec<&Device> =
            group.iter().filter_map(|id| snapshot.devices.get(id)).collect();
        if let Some(as_number) = minimum_as_for_group(&group_devices) {
            for id in group {
                mapping.insert(id, as_number);
            }
        }
    }
    mapping
}

/// A device's effective AS: the shared spine/superspine override if
/// present, else derived from its own primary IPv4.
pub fn resolve_as(device: &Device, device_as_mapping: &HashMap<DeviceId, u64>) -> Option<u64> {
    if let Some(&as_number) = device_as_mapping.get(&device.id) {
        return Some(as_number);
    }
    primary_ipv4_of(device).and_then(|v4| local_asn_from_ipv4(IpAddr::V4(v4)).ok())
}

/// `_determine_peer_type`: "internal" iff both ends resolve to the same AS;
/// "external" (the safe default) whenever either side's AS can't be
/// determined.
pub fn peer_type(
    local: &Device,
    peer: &Device,
    device_as_mapping: &HashMap<DeviceId, u64>,
) -> &'static str {
    match (resolve_as(local, device_as_mapping), resolve_as(peer, device_as_mapping)) {
        (Some(a), Some(b)) if a == b => "internal",
        _ => "external",
    }
}

/// The `BGP_NEIGHBOR_AF` suffixes to add for one neighbor: IPv4 unicast
/// always, IPv6 unicast only when the link is not carrying a
/// transfer-role IPv4 (i.e. it's the dual-stack/v6-link-local case).
pub fn neighbor_address_families(has_transfer_ipv4: bool) -> &'static [&'static str] {
    if has_transfer_ipv4 {
        &["ipv4_unicast"]
    } else {
        &["ipv4_unicast", "ipv6_unicast"]
    }
}

/// `BGP_NEIGHBOR` row fields for one neighbor keyed by `peer_key` (an IPv4
/// address when discoverable, else the local interface/port-channel name).
pub fn neighbor_fields(
    peer_type: &str,
    has_transfer_ipv4: bool,
    local_addr: Option<&str>,
) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("peer_type".to_string(), Value::from(peer_type));
    fields.insert("v6only".to_string(), Value::from(if has_transfer_ipv4 { "false" } else { "true" }));
    if let Some(addr) = local_addr {
        fields.insert("local_addr".to_string(), Value::from(addr));
    }
    fields
}
