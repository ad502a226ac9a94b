//! Cable-peer resolution shared by the BGP and BFD passes, grounded on the
//! original's `connections.py` (`get_interconnected_devices`,
//! `is_interface_connected`, and the SONiC-name variant of
//! `get_connected_device_and_interface`).

use std::collections::{HashMap, HashSet, VecDeque};

use core_model::{Device, DeviceId, Interface, InterfaceId, InventorySnapshot};

/// An interface counts as connected iff it has a cable peer recorded in
/// the graph (spec.md §9 — no separate `is_connected` flag to drift out
/// of sync with the cable table).
pub fn is_interface_connected(interface: &Interface) -> bool {
    interface.is_connected()
}

/// The device and interface on the other end of the cable attached to
/// `sonic_name` on `device`, if any. `interfaces_by_sonic_name` maps the
/// already-converted SONiC port name back to the NetBox-side interface id
/// for this device (built once per device by the caller).
pub fn get_connected_device_for_sonic_interface<'a>(
    device: &Device,
    sonic_name: &str,
    snapshot: &'a InventorySnapshot,
    interfaces_by_sonic_name: &HashMap<String, InterfaceId>,
) -> Option<&'a Device> {
    let _ = device;
    let iface_id = *interfaces_by_sonic_name.get(sonic_name)?;
    let peer_id = snapshot.cable_peer(iface_id)?;
    snapshot.device_of_interface(peer_id)
}

/// The connected peer interface itself, used to read the peer's IPv4
/// address for BGP neighbor keying (and FHRP VIP discovery at the SVI
/// layer, done one level up in `bgp.rs`).
pub fn get_connected_interface<'a>(
    sonic_name: &str,
    snapshot: &'a InventorySnapshot,
    interfaces_by_sonic_name: &HashMap<String, InterfaceId>,
) -> Option<&'a Interface> {
    let iface_id = *interfaces_by_sonic_name.get(sonic_name)?;
    let peer_id = snapshot.cable_peer(iface_id)?;
    snapshot.interfaces.get(&peer_id)
}

/// Groups of devices connected to each other (directly or transitively)
/// within `devices`, via any cable. Connected components of size 1 are
/// dropped — only groups with more than one device are returned (spine/
/// superspine AS-sharing needs at least a pair to mean anything).
pub fn find_interconnected_devices(
    devices: &[&Device],
    snapshot: &InventorySnapshot,
) -> Vec<Vec<DeviceId>> {
    let ids: HashSet<DeviceId> = devices.iter().map(|d| d.id).collect();
    let mut graph: HashMap<DeviceId, HashSet<DeviceId>> = HashMap::new();

    for device in devices {
        for iface in snapshot.interfaces_of(device.id) {
            let Some(peer_id) = snapshot.cable_peer(iface.id) else { continue };
            let Some(peer_device) = snapshot.device_of_interface(peer_id) else { continue };
            if peer_device.id == device.id || !ids.contains(&peer_device.id) {
                continue;
            }
            graph.entry(device.id).or_default().insert(peer_device.id);
            graph.entry(peer_device.id).or_default().insert(device.id);
        }
    }

    let mut visited: HashSet<DeviceId> = HashSet::new();
    let mut groups = Vec::new();
    let mut keys: Vec<DeviceId> = graph.keys().copied().collect();
    keys.sort();

    for start in keys {
        if visited.contains(&start) {
            continue;
        }
        let mut group = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(current) = queue.pop_front() {
            group.push(current);
            if let Some(neighbors) = graph.get(&current) {
                let mut sorted_neighbors: Vec<DeviceId> = neighbors.iter().copied().collect();
                sorted_neighbors.sort();
                for n in sorted_neighbors {
                    if visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        if group.len() > 1 {
            groups.push(group);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{Cable, CustomFields, DeviceRole, InterfaceType, VlanMembership};

    fn snapshot_with_cable() -> (InventorySnapshot, Device, Device) {
        let mut snap = InventorySnapshot::default();
        let d1 = Device {
            id: DeviceId::default(),
            name: "spine-01".into(),
            role: DeviceRole::Spine,
            primary_ipv4: None,
            primary_ipv6: None,
            tags: Default::default(),
            oob_ip: None,
            serial: None,
            custom_fields: CustomFields::default(),
        };
        let d2 = Device { id: DeviceId::default(), name: "spine-02".into(), ..d1.clone() };

        let if1 = Interface {
            id: InterfaceId::default(),
            device_id: d1.id,
            name: "Ethernet0".into(),
            interface_type: InterfaceType::Physical100G,
            speed_kbps: None,
            mac_address: None,
            mgmt_only: false,
            lag_parent: None,
            vrf: None,
            vlans: VlanMembership { untagged: None, tagged: vec![] },
            enabled: true,
            cable_id: None,
        };
        let if2 = Interface { id: InterfaceId::default(), device_id: d2.id, name: "Ethernet0".into(), ..if1.clone() };

        let cable = Cable { id: Default::default(), a: if1.id, b: if2.id };
        let mut if1c = if1.clone();
        if1c.cable_id = Some(cable.id);
        let mut if2c = if2.clone();
        if2c.cable_id = Some(cable.id);

        snap.devices.insert(d1.id, d1.clone());
        snap.devices.insert(d2.id, d2.clone());
        snap.interfaces.insert(if1c.id, if1c);
        snap.interfaces.insert(if2c.id, if2c);
        snap.cables.insert(cable.id, cable);
        (snap, d1, d2)
    }

    #[test]
    fn two_cabled_spines_form_one_group() {
        let (snap, d1, d2) = snapshot_with_cable();
        let devices = vec![&d1, &d2];
        let groups = find_interconnected_devices(&devices, &snap);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn lone_device_forms_no_group() {
        let (snap, d1, _) = snapshot_with_cable();
        let devices = vec![&d1];
        let groups = find_interconnected_devices(&devices, &snap);
        assert!(groups.is_empty());
    }
}
