//! Breakout-port detection (spec.md §4.4.2), ported from the original's
//! `detect_breakout_ports`: two independent passes over the interface list,
//! one matching already-canonical SONiC names (`Ethernet0..3`) and one
//! matching NetBox alias names with a subport (`Eth1/1/1..4`).
//!
//! The original never cross-checks the two passes against each other. We
//! add that check here: if a physical port has a complete breakout group
//! under both namings, the interface inventory is contradictory and we
//! reject it rather than silently picking one (last-write-wins on a
//! `HashMap` would make the result depend on iteration order).

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use core_model::Interface;

use crate::constants::HIGH_SPEED_PORTS;
use crate::error::ConfigGeneratorError;

fn sonic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Ethernet(\d+)$").unwrap())
}

fn netbox_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Eth(\d+)/(\d+)/(\d+)$").unwrap())
}

/// `speed_kbps` is stored in kbps; breakout detection and the interface-name
/// conversion functions both work in the original's units, Mbps.
pub fn speed_mbps(interface: &Interface) -> Option<u32> {
    interface.effective_speed_kbps().map(|kbps| (kbps / 1000) as u32)
}

/// The canonical SONiC port name for an interface as the Inventory names
/// it: already-canonical names and plain `Eth<module>/<port>` aliases go
/// through `alias_to_sonic`, while a breakout subport alias
/// (`Eth<module>/<port>/<subport>`) is resolved with the same formula
/// `detect_breakout_ports` uses for its NetBox-format groups.
pub fn canonical_sonic_name(name: &str, speed_mbps: Option<u32>) -> String {
    if let Some(caps) = netbox_re().captures(name) {
        if let (Ok(port), Ok(subport)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) {
            let base_sonic_port = (port - 1) * 4;
            return format!("Ethernet{}", base_sonic_port + (subport - 1));
        }
    }
    crate::interface_name::alias_to_sonic(name, speed_mbps)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakoutCfg {
    pub breakout_owner: &'static str,
    pub brkout_mode: String,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakoutPort {
    pub master: String,
}

#[derive(Debug, Clone, Default)]
pub struct BreakoutInfo {
    pub breakout_cfgs: BTreeMap<String, BreakoutCfg>,
    pub breakout_ports: BTreeMap<String, BreakoutPort>,
}

fn brkout_mode_for_speed(speed_mbps: u32) -> Option<&'static str> {
    match speed_mbps {
        100_000 => Some("4x25G"),
        200_000 => Some("4x50G"),
        400_000 => Some("4x100G"),
        800_000 => Some("4x200G"),
        _ => None,
    }
}

pub fn detect_breakout_ports(
    interfaces: &[&Interface],
) -> Result<BreakoutInfo, ConfigGeneratorError> {
    let mut sonic_groups: HashMap<u32, Vec<(u32, &Interface)>> = HashMap::new();
    let mut netbox_groups: HashMap<(u32, u32), Vec<(u32, &Interface)>> = HashMap::new();

    for iface in interfaces {
        let Some(speed) = speed_mbps(iface) else { continue };
        if !HIGH_SPEED_PORTS.contains(&speed) {
            continue;
        }

        if let Some(caps) = sonic_re().captures(&iface.name) {
            if let Ok(port_num) = caps[1].parse::<u32>() {
                let base = (port_num / 4) * 4;
                sonic_groups.entry(base).or_default().push((port_num, iface));
            }
        }
        if let Some(caps) = netbox_re().captures(&iface.name) {
            if let (Ok(module), Ok(port), Ok(subport)) =
                (caps[1].parse::<u32>(), caps[2].parse::<u32>(), caps[3].parse::<u32>())
            {
                netbox_groups.entry((module, port)).or_default().push((subport, iface));
            }
        }
    }

    let mut breakout_cfgs = BTreeMap::new();
    let mut breakout_ports = BTreeMap::new();
    // physical_port_num -> base SONiC port, used only to detect a NetBox-format
    // group landing on a physical port already claimed by a SONiC-format group.
    let mut sonic_physical_ports: HashMap<u32, u32> = HashMap::new();

    for (base_port, mut ports) in sonic_groups {
        if ports.len() != 4 {
            continue;
        }
        ports.sort_by_key(|(n, _)| *n);
        let expected: Vec<u32> = (0..4).map(|i| base_port + i).collect();
        let actual: Vec<u32> = ports.iter().map(|(n, _)| *n).collect();
        if actual != expected {
            continue;
        }
        let Some(speed) = speed_mbps(ports[0].1) else { continue };
        let Some(mode) = brkout_mode_for_speed(speed) else { continue };

        let master_port = format!("Ethernet{base_port}");
        let physical_port_num = base_port / 4 + 1;
        breakout_cfgs.insert(
            master_port.clone(),
            BreakoutCfg {
                breakout_owner: "MANUAL",
                brkout_mode: mode.to_string(),
                port: format!("1/{physical_port_num}"),
            },
        );
        for (port_num, _) in &ports {
            breakout_ports
                .insert(format!("Ethernet{port_num}"), BreakoutPort { master: master_port.clone() });
        }
        sonic_physical_ports.insert(physical_port_num, base_port);
    }

    for ((module, port), mut subports) in netbox_groups {
        if subports.len() != 4 {
            continue;
        }
        subports.sort_by_key(|(n, _)| *n);
        let actual: Vec<u32> = subports.iter().map(|(n, _)| *n).collect();
        if actual != [1, 2, 3, 4] {
            continue;
        }
        let Some(speed) = speed_mbps(subports[0].1) else { continue };
        let Some(mode) = brkout_mode_for_speed(speed) else { continue };

        if sonic_physical_ports.contains_key(&port) {
            return Err(ConfigGeneratorError::AmbiguousBreakout(format!(
                "physical port {module}/{port} has both a SONiC-format (Ethernet*) and \
                 an alias-format (Eth{module}/{port}/*) breakout group"
            )));
        }

        let base_sonic_port = (port - 1) * 4;
        let master_port = format!("Ethernet{base_sonic_port}");
        breakout_cfgs.insert(
            master_port.clone(),
            BreakoutCfg {
                breakout_owner: "MANUAL",
                brkout_mode: mode.to_string(),
                port: format!("{module}/{port}"),
            },
        );
        for (subport, _) in &subports {
            let sonic_port_num = base_sonic_port + (subport - 1);
            breakout_ports.insert(
                format!("Ethernet{sonic_port_num}"),
                BreakoutPort { master: master_port.clone() },
            );
        }
    }

    Ok(BreakoutInfo { breakout_cfgs, breakout_ports })
}

/// Selects the lanes a breakout member port owns out of its master port's
/// full lane list, ported from `_calculate_breakout_port_lane`. Falls back
/// to lane `"1"` on any parse or bounds failure, matching the original.
pub fn breakout_port_lanes(master_lanes: &str, master_port_num: u32, sonic_port_num: u32) -> String {
    let lanes: Vec<String> = if let Some((start, end)) = master_lanes.split_once('-') {
        match (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
            (Ok(s), Ok(e)) if e >= s => (s..=e).map(|n| n.to_string()).collect(),
            _ => return "1".to_string(),
        }
    } else {
        master_lanes.split(',').map(|s| s.trim().to_string()).collect()
    };

    let lanes_per_port = match lanes.len() as u32 {
        8 => 2,
        4 => 1,
        _ => return "1".to_string(),
    };
    let port_increment = sonic_port_num.wrapping_sub(master_port_num);
    let subport_index = port_increment / lanes_per_port;
    let start = (subport_index * lanes_per_port) as usize;
    let end = start + lanes_per_port as usize;
    match lanes.get(start..end) {
        Some(slice) if !slice.is_empty() => slice.join(","),
        _ => "1".to_string(),
    }
}

/// `_get_breakout_port_valid_speeds`: the list of speeds a breakout member
/// port may legally negotiate down to, keyed off its own breakout speed.
pub fn breakout_valid_speeds(speed_mbps: u32) -> String {
    match speed_mbps {
        25_000 => "25000,10000,1000".to_string(),
        50_000 => "50000,25000,10000,1000".to_string(),
        100_000 => "100000,50000,25000,10000,1000".to_string(),
        200_000 => "200000,100000,50000,25000,10000,1000".to_string(),
        other => format!("{other},10000,1000"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{DeviceId, InterfaceId, InterfaceType, VlanMembership};

    fn iface(name: &str, interface_type: InterfaceType) -> Interface {
        Interface {
            id: InterfaceId::default(),
            device_id: DeviceId::default(),
            name: name.to_string(),
            interface_type,
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

    #[test]
    fn four_consecutive_sonic_ports_form_a_breakout_group() {
        let ifaces: Vec<Interface> = (0..4)
            .map(|n| iface(&format!("Ethernet{n}"), InterfaceType::Physical100G))
            .collect();
        let refs: Vec<&Interface> = ifaces.iter().collect();
        let info = detect_breakout_ports(&refs).unwrap();
        assert_eq!(info.breakout_cfgs["Ethernet0"].brkout_mode, "4x25G");
        assert_eq!(info.breakout_cfgs["Ethernet0"].port, "1/1");
        assert_eq!(info.breakout_ports.len(), 4);
        assert_eq!(info.breakout_ports["Ethernet3"].master, "Ethernet0");
    }

    #[test]
    fn four_netbox_subports_form_a_breakout_group() {
        let ifaces: Vec<Interface> = (1..=4)
            .map(|s| iface(&format!("Eth1/2/{s}"), InterfaceType::Physical100G))
            .collect();
        let refs: Vec<&Interface> = ifaces.iter().collect();
        let info = detect_breakout_ports(&refs).unwrap();
        assert_eq!(info.breakout_cfgs["Ethernet4"].port, "1/2");
        assert_eq!(info.breakout_ports["Ethernet7"].master, "Ethernet4");
    }

    #[test]
    fn incomplete_group_is_ignored() {
        let ifaces: Vec<Interface> = (0..3)
            .map(|n| iface(&format!("Ethernet{n}"), InterfaceType::Physical100G))
            .collect();
        let refs: Vec<&Interface> = ifaces.iter().collect();
        let info = detect_breakout_ports(&refs).unwrap();
        assert!(info.breakout_cfgs.is_empty());
    }

    #[test]
    fn conflicting_namings_on_the_same_physical_port_is_rejected() {
        let mut ifaces: Vec<Interface> = (0..4)
            .map(|n| iface(&format!("Ethernet{n}"), InterfaceType::Physical100G))
            .collect();
        ifaces.extend((1..=4).map(|s| iface(&format!("Eth1/1/{s}"), InterfaceType::Physical100G)));
        let refs: Vec<&Interface> = ifaces.iter().collect();
        let err = detect_breakout_ports(&refs).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn lane_slicing_picks_the_right_subset() {
        assert_eq!(breakout_port_lanes("1,2,3,4,5,6,7,8", 0, 0), "1,2");
        assert_eq!(breakout_port_lanes("1,2,3,4,5,6,7,8", 0, 2), "5,6");
        assert_eq!(breakout_port_lanes("1-4", 0, 1), "2");
    }

    #[test]
    fn valid_speeds_table_matches_breakout_speed() {
        assert_eq!(breakout_valid_speeds(25_000), "25000,10000,1000");
        assert_eq!(breakout_valid_speeds(100_000), "100000,50000,25000,10000,1000");
    }

    #[test]
    fn canonical_name_resolves_breakout_subport_alias() {
        assert_eq!(canonical_sonic_name("Eth1/2/1", Some(25_000)), "Ethernet4");
        assert_eq!(canonical_sonic_name("Eth1/2/4", Some(25_000)), "Ethernet7");
    }

    #[test]
    fn canonical_name_falls_back_to_plain_alias_conversion() {
        assert_eq!(canonical_sonic_name("Eth1/2", Some(100_000)), "Ethernet4");
        assert_eq!(canonical_sonic_name("Ethernet9", Some(100_000)), "Ethernet9");
    }
}
