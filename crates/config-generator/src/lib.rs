//! Switch Configuration Generator: turns an `InventorySnapshot` view of one
//! switch into a deterministic SONiC `config_db.json` document. Ported from
//! `config_generator.py` and its `sonic/` helper modules — each module here
//! corresponds to one or two of the original's functions, reassembled by
//! `document::generate`.

pub mod bfd;
pub mod bgp;
pub mod breakout;
pub mod connections;
pub mod constants;
pub mod device_meta;
pub mod document;
pub mod error;
pub mod hwsku;
pub mod interface_name;
pub mod model;
pub mod ports;
pub mod publish;
pub mod services;
pub mod vrf;

pub use document::{generate, GenerateInput};
pub use error::{ConfigGeneratorError, ErrorKind};
pub use model::SonicConfigDocument;
pub use publish::{publish, ExportIdentifier, PublishOptions};
pub use services::SonicSweepCache;

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::net::IpAddr;

    use core_model::{
        AddressFamily, Cable, CableId, CustomFields, Device, DeviceId, DeviceRole, Interface,
        InterfaceId, InterfaceType, InventorySnapshot, IpAddress, IpAddressId, Prefix, PrefixId,
        VlanMembership,
    };

    use crate::hwsku::{PortConfigEntry, PortConfigTable};
    use crate::{bgp, connections, document, services::SonicSweepCache, GenerateInput};

    const HWSKU: &str = "Accton-AS7326-56X";

    fn device(name: &str, role: DeviceRole, primary_ipv4: Option<&str>, oob_ip: &str) -> Device {
        Device {
            id: DeviceId::default(),
            name: name.to_string(),
            role,
            primary_ipv4: primary_ipv4.map(|s| s.parse().unwrap()),
            primary_ipv6: None,
            tags: BTreeSet::new(),
            oob_ip: Some(oob_ip.parse().unwrap()),
            serial: None,
            custom_fields: CustomFields::default(),
        }
    }

    fn physical_iface(device_id: DeviceId, name: &str) -> Interface {
        Interface {
            id: InterfaceId::default(),
            device_id,
            name: name.to_string(),
            interface_type: InterfaceType::Physical100G,
            speed_kbps: None,
            mac_address: None,
            mgmt_only: false,
            lag_parent: None,
            vrf: None,
            vlans: VlanMembership { untagged: None, tagged: vec![] },
            enabled: true,
            cable_id: None,
        }
    }

    fn assign_ip(snapshot: &mut InventorySnapshot, interface_id: InterfaceId, cidr: &str, family: AddressFamily) {
        let addr = IpAddress { id: IpAddressId::default(), interface_id: Some(interface_id), address: cidr.to_string(), family };
        snapshot.ip_addresses.insert(addr.id, addr);
    }

    fn port_config() -> PortConfigTable {
        let mut table = PortConfigTable::new();
        for (i, name) in ["Ethernet0", "Ethernet4", "Ethernet8", "Ethernet12"].iter().enumerate() {
            table.insert(
                name.to_string(),
                PortConfigEntry {
                    lanes: format!("{},{},{},{}", i * 4 + 1, i * 4 + 2, i * 4 + 3, i * 4 + 4),
                    alias: format!("Eth1/{}", i + 1),
                    index: (i + 1).to_string(),
                    speed: 100_000,
                    valid_speeds: None,
                },
            );
        }
        table
    }

    /// Two leafs cabled back to back over a transfer-role /31, each also
    /// carrying an out-of-band management address — the minimal topology
    /// `generate()` needs to produce PORT, INTERFACE, and BGP_NEIGHBOR rows.
    fn two_leaf_snapshot() -> (InventorySnapshot, Device, Device, InterfaceId) {
        let leaf1 = device("leaf-01", DeviceRole::Leaf, Some("10.255.0.1"), "192.0.2.1");
        let leaf2 = device("leaf-02", DeviceRole::Leaf, Some("10.255.0.2"), "192.0.2.2");

        let if1 = physical_iface(leaf1.id, "Ethernet0");
        let if2 = physical_iface(leaf2.id, "Ethernet0");
        let cable = Cable { id: CableId::default(), a: if1.id, b: if2.id };
        let mut if1 = if1;
        let mut if2 = if2;
        if1.cable_id = Some(cable.id);
        if2.cable_id = Some(cable.id);

        let mut snapshot = InventorySnapshot::default();
        snapshot.devices.insert(leaf1.id, leaf1.clone());
        snapshot.devices.insert(leaf2.id, leaf2.clone());
        snapshot.interfaces.insert(if1.id, if1.clone());
        snapshot.interfaces.insert(if2.id, if2.clone());
        snapshot.cables.insert(cable.id, cable);

        assign_ip(&mut snapshot, if1.id, "100.64.0.0/31", AddressFamily::V4);
        assign_ip(&mut snapshot, if2.id, "100.64.0.1/31", AddressFamily::V4);
        let transfer = Prefix { id: PrefixId::default(), cidr: "100.64.0.0/31".to_string(), role: Some(Prefix::ROLE_TRANSFER.to_string()) };
        snapshot.prefixes.insert(transfer.id, transfer);

        (snapshot, leaf1, leaf2, if1.id)
    }

    #[test]
    fn two_connected_leafs_produce_port_interface_and_bgp_rows() {
        let (snapshot, leaf1, _leaf2, _if1) = two_leaf_snapshot();
        let input = GenerateInput {
            device: &leaf1,
            hwsku: HWSKU,
            port_config: &port_config(),
            snapshot: &snapshot,
            sweep_cache: &SonicSweepCache::default(),
            device_as_mapping: &HashMap::new(),
        };
        let doc = document::generate(&input).unwrap();

        assert!(doc.0["PORT"].contains_key("Ethernet0"));
        assert_eq!(doc.0["PORT"]["Ethernet0"]["admin_status"], serde_json::Value::from("up"));
        assert!(doc.0["INTERFACE"].keys().any(|k| k.starts_with("Ethernet0|100.64.0.0")));
        assert_eq!(doc.0["DEVICE_METADATA"]["localhost"]["hostname"], serde_json::Value::from("leaf-01"));

        // a transfer-role /31 link is eligible for BGP and BFD; the peer
        // key resolves to the other leaf's own address on the link.
        assert!(doc.0["BGP_NEIGHBOR"].contains_key("default|100.64.0.1"));
        assert_eq!(doc.0["BGP_NEIGHBOR"]["default|100.64.0.1"]["v6only"], serde_json::Value::from("false"));
        assert!(doc.0["BFD_PEER"].contains_key("default|Ethernet0"));
        assert!(doc.0["BFD_PROFILE"].contains_key("default"));
    }

    #[test]
    fn two_consecutive_generate_calls_are_byte_identical() {
        let (snapshot, leaf1, _leaf2, _if1) = two_leaf_snapshot();
        let input = GenerateInput {
            device: &leaf1,
            hwsku: HWSKU,
            port_config: &port_config(),
            snapshot: &snapshot,
            sweep_cache: &SonicSweepCache::default(),
            device_as_mapping: &HashMap::new(),
        };
        let first = document::generate(&input).unwrap().to_pretty_json();
        let second = document::generate(&input).unwrap().to_pretty_json();
        assert_eq!(first, second);
    }

    #[test]
    fn unsupported_hwsku_fails_before_touching_the_snapshot() {
        let (snapshot, leaf1, ..) = two_leaf_snapshot();
        let input = GenerateInput {
            device: &leaf1,
            hwsku: "Not-A-Real-Hwsku",
            port_config: &port_config(),
            snapshot: &snapshot,
            sweep_cache: &SonicSweepCache::default(),
            device_as_mapping: &HashMap::new(),
        };
        let err = document::generate(&input).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    /// Two spines cabled to each other both derive their AS from the same
    /// interconnected component, so `compute_spine_as_mapping` gives them
    /// the same value even though their own addresses differ (spec.md §8).
    #[test]
    fn interconnected_spines_share_one_as_number() {
        let spine1 = device("spine-01", DeviceRole::Spine, Some("10.255.1.10"), "192.0.2.10");
        let spine2 = device("spine-02", DeviceRole::Spine, Some("10.255.1.20"), "192.0.2.11");

        let if1 = physical_iface(spine1.id, "Ethernet0");
        let if2 = physical_iface(spine2.id, "Ethernet0");
        let cable = Cable { id: CableId::default(), a: if1.id, b: if2.id };
        let mut if1 = if1;
        let mut if2 = if2;
        if1.cable_id = Some(cable.id);
        if2.cable_id = Some(cable.id);

        let mut snapshot = InventorySnapshot::default();
        snapshot.devices.insert(spine1.id, spine1.clone());
        snapshot.devices.insert(spine2.id, spine2.clone());
        snapshot.interfaces.insert(if1.id, if1);
        snapshot.interfaces.insert(if2.id, if2);
        snapshot.cables.insert(cable.id, cable);

        let devices = vec![&spine1, &spine2];
        let mapping = bgp::compute_spine_as_mapping(&devices, &snapshot);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&spine1.id], mapping[&spine2.id]);

        let expected = bgp::local_asn_from_ipv4("10.255.1.10".parse().unwrap()).unwrap();
        assert_eq!(mapping[&spine1.id], expected);
    }

    /// A device with four consecutively-numbered high-speed ports breaks
    /// out into one `4x25G` group — `generate()` should skip the master's
    /// own PORT row and instead emit synthesized rows plus BREAKOUT_CFG /
    /// BREAKOUT_PORTS for the whole group (spec.md §4.4.1, §8).
    #[test]
    fn breakout_group_produces_breakout_tables_and_member_ports() {
        let leaf = device("leaf-03", DeviceRole::Leaf, None, "192.0.2.3");
        let mut snapshot = InventorySnapshot::default();
        snapshot.devices.insert(leaf.id, leaf.clone());

        for name in ["Ethernet0", "Ethernet1", "Ethernet2", "Ethernet3"] {
            let iface = physical_iface(leaf.id, name);
            snapshot.interfaces.insert(iface.id, iface);
        }

        let mut port_config = PortConfigTable::new();
        port_config.insert(
            "Ethernet0".to_string(),
            PortConfigEntry { lanes: "1,2,3,4".to_string(), alias: "Eth1/1".to_string(), index: "1".to_string(), speed: 100_000, valid_speeds: None },
        );

        let input = GenerateInput {
            device: &leaf,
            hwsku: HWSKU,
            port_config: &port_config,
            snapshot: &snapshot,
            sweep_cache: &SonicSweepCache::default(),
            device_as_mapping: &HashMap::new(),
        };
        let doc = document::generate(&input).unwrap();

        assert!(doc.0["BREAKOUT_CFG"].contains_key("Ethernet0"));
        assert_eq!(doc.0["BREAKOUT_CFG"]["Ethernet0"]["brkout_mode"], serde_json::Value::from("4x25G"));
        assert!(!doc.0["PORT"].contains_key("Ethernet0"), "breakout master has no row of its own");
        for member in ["Ethernet1", "Ethernet2", "Ethernet3"] {
            assert!(doc.0["PORT"].contains_key(member), "member {member} should have a synthesized row");
            assert!(doc.0["BREAKOUT_PORTS"].contains_key(member));
        }
    }

    #[test]
    fn is_interface_connected_matches_cable_presence() {
        let (snapshot, leaf1, _leaf2, if1) = two_leaf_snapshot();
        let iface = &snapshot.interfaces[&if1];
        assert!(connections::is_interface_connected(iface));
        let _ = leaf1;
    }

    #[test]
    fn disconnected_device_has_no_bgp_neighbors() {
        let leaf = device("leaf-04", DeviceRole::Leaf, Some("10.255.0.4"), "192.0.2.4");
        let mut snapshot = InventorySnapshot::default();
        let iface = physical_iface(leaf.id, "Ethernet0");
        snapshot.devices.insert(leaf.id, leaf.clone());
        snapshot.interfaces.insert(iface.id, iface);

        let input = GenerateInput {
            device: &leaf,
            hwsku: HWSKU,
            port_config: &port_config(),
            snapshot: &snapshot,
            sweep_cache: &SonicSweepCache::default(),
            device_as_mapping: &HashMap::new(),
        };
        let doc = document::generate(&input).unwrap();
        assert!(!doc.0.contains_key("BGP_NEIGHBOR") || doc.0["BGP_NEIGHBOR"].is_empty());
        assert!(!doc.0.contains_key("BFD_PEER") || doc.0["BFD_PEER"].is_empty());
    }
}
