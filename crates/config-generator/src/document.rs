//! Assembles a full `SonicConfigDocument` for one device, ported from
//! `generate_sonic_config` and the private `_add_*_configuration` helpers
//! in `config_generator.py`. Pure and deterministic: the same snapshot,
//! sweep cache, and AS mapping always produce byte-identical output
//! (spec.md §4.4.7) — the document serializes through sorted `BTreeMap`s
//! end to end.

use std::collections::HashMap;

use core_model::{Device, DeviceId, Interface, InterfaceType, InventorySnapshot, VirtualKind};

use crate::bfd;
use crate::bgp;
use crate::breakout::{self, BreakoutInfo};
use crate::connections;
use crate::device_meta;
use crate::error::ConfigGeneratorError;
use crate::hwsku::{self, PortConfigEntry, PortConfigTable};
use crate::model::SonicConfigDocument;
use crate::ports;
use crate::services::{self, SonicSweepCache};
use crate::vrf;

pub struct GenerateInput<'a> {
    pub device: &'a Device,
    pub hwsku: &'a str,
    pub port_config: &'a PortConfigTable,
    pub snapshot: &'a InventorySnapshot,
    pub sweep_cache: &'a SonicSweepCache,
    pub device_as_mapping: &'a HashMap<DeviceId, u64>,
}

pub fn generate(input: &GenerateInput) -> Result<SonicConfigDocument, ConfigGeneratorError> {
    hwsku::ensure_supported(input.hwsku)?;

    let device = input.device;
    let snapshot = input.snapshot;
    let all_interfaces = snapshot.interfaces_of(device.id);

    let physical: Vec<&Interface> = all_interfaces
        .iter()
        .copied()
        .filter(|i| !matches!(i.interface_type, InterfaceType::Virtual | InterfaceType::Lag))
        .collect();
    let virtuals: Vec<&Interface> =
        all_interfaces.iter().copied().filter(|i| matches!(i.interface_type, InterfaceType::Virtual)).collect();
    let lag_masters: Vec<&Interface> =
        all_interfaces.iter().copied().filter(|i| matches!(i.interface_type, InterfaceType::Lag)).collect();

    let breakout_info = breakout::detect_breakout_ports(&physical)?;

    // canonical SONiC name for every physical interface, and the reverse
    // lookup `connections.rs` needs to resolve cable peers by that name.
    let mut sonic_name_of: HashMap<core_model::InterfaceId, String> = HashMap::new();
    let mut interfaces_by_sonic_name: HashMap<String, core_model::InterfaceId> = HashMap::new();
    for iface in &physical {
        let name = breakout::canonical_sonic_name(&iface.name, breakout::speed_mbps(iface));
        interfaces_by_sonic_name.insert(name.clone(), iface.id);
        sonic_name_of.insert(iface.id, name);
    }

    let mut doc = SonicConfigDocument::default();

    add_device_metadata(&mut doc, device, input.hwsku, snapshot);
    add_version(&mut doc, device);
    add_ports(&mut doc, &physical, input.port_config, &breakout_info, &sonic_name_of)?;
    add_breakout_tables(&mut doc, &breakout_info);
    add_interfaces(&mut doc, &physical, snapshot, &sonic_name_of);
    add_vlans(&mut doc, &virtuals, &physical, snapshot, &sonic_name_of);
    add_loopbacks(&mut doc, &virtuals, snapshot);
    add_portchannels(&mut doc, &lag_masters, snapshot, &sonic_name_of);
    add_vrfs(&mut doc, &physical, &lag_masters, snapshot, &sonic_name_of);
    add_mgmt_interface(&mut doc, device, &all_interfaces);
    add_services(&mut doc, device, input.sweep_cache, snapshot);
    add_bgp_and_bfd(&mut doc, device, &physical, &virtuals, &lag_masters, snapshot, &interfaces_by_sonic_name, &sonic_name_of, input.device_as_mapping);

    Ok(doc)
}

fn add_device_metadata(doc: &mut SonicConfigDocument, device: &Device, hwsku: &str, snapshot: &InventorySnapshot) {
    let mut fields = serde_json::Map::new();
    fields.insert("hostname".to_string(), device_meta::hostname(device).into());
    fields.insert("hwsku".to_string(), hwsku.into());
    fields.insert("platform".to_string(), device_meta::platform(device, hwsku).into());
    fields.insert("mac".to_string(), device_meta::mac_address(device, snapshot).into());
    doc.insert("DEVICE_METADATA", "localhost", fields);
}

fn add_version(doc: &mut SonicConfigDocument, device: &Device) {
    let mut fields = serde_json::Map::new();
    fields.insert("VERSION".to_string(), device_meta::database_version(device).into());
    doc.insert("VERSION", "DATABASE", fields);
}

fn add_ports(
    doc: &mut SonicConfigDocument,
    physical: &[&Interface],
    port_config: &PortConfigTable,
    breakout_info: &BreakoutInfo,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
) -> Result<(), ConfigGeneratorError> {
    for iface in physical {
        let sonic_name = &sonic_name_of[&iface.id];
        if ports::is_breakout_master(sonic_name, breakout_info) {
            continue;
        }

        let entry = match port_config.get(sonic_name) {
            Some(entry) => entry.clone(),
            None => match synthesize_breakout_port_config(sonic_name, breakout_info, port_config) {
                Some(entry) => entry,
                None => continue,
            },
        };

        let is_portchannel_member = iface.lag_parent.is_some();
        let fields = ports::build_port_fields(iface, &entry, iface.is_connected(), is_portchannel_member, breakout_info)?;
        doc.insert("PORT", sonic_name.clone(), fields);
    }
    Ok(())
}

/// A breakout member port has no row of its own in the static port-config
/// table — only its master does. This reconstructs a synthetic entry from
/// the master's, slicing out the member's own lanes, mirroring
/// `_add_missing_breakout_ports`.
fn synthesize_breakout_port_config(
    sonic_name: &str,
    breakout_info: &BreakoutInfo,
    port_config: &PortConfigTable,
) -> Option<PortConfigEntry> {
    let master_name = &breakout_info.breakout_ports.get(sonic_name)?.master;
    let master_entry = port_config.get(master_name)?;

    let member_num: u32 = sonic_name.strip_prefix("Ethernet")?.parse().ok()?;
    let master_num: u32 = master_name.strip_prefix("Ethernet")?.parse().ok()?;
    let lanes = breakout::breakout_port_lanes(&master_entry.lanes, master_num, member_num);

    Some(PortConfigEntry {
        lanes,
        alias: sonic_name.to_string(),
        index: master_entry.index.clone(),
        speed: master_entry.speed,
        valid_speeds: None,
    })
}

fn add_breakout_tables(doc: &mut SonicConfigDocument, breakout_info: &BreakoutInfo) {
    for (master, cfg) in &breakout_info.breakout_cfgs {
        let mut fields = serde_json::Map::new();
        fields.insert("breakout_owner".to_string(), cfg.breakout_owner.into());
        fields.insert("brkout_mode".to_string(), cfg.brkout_mode.clone().into());
        fields.insert("port".to_string(), cfg.port.clone().into());
        doc.insert("BREAKOUT_CFG", master.clone(), fields);
    }
    for (member, port) in &breakout_info.breakout_ports {
        let mut fields = serde_json::Map::new();
        fields.insert("master".to_string(), port.master.clone().into());
        doc.insert("BREAKOUT_PORTS", member.clone(), fields);
    }
}

fn add_interfaces(
    doc: &mut SonicConfigDocument,
    physical: &[&Interface],
    snapshot: &InventorySnapshot,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
) {
    for iface in physical {
        if iface.lag_parent.is_some() || !iface.is_connected() {
            continue;
        }
        let sonic_name = &sonic_name_of[&iface.id];
        let addresses = snapshot.ips_of(iface.id);

        if addresses.is_empty() {
            let mut fields = serde_json::Map::new();
            fields.insert("ipv6_use_link_local_only".to_string(), "enable".into());
            doc.insert("INTERFACE", sonic_name.clone(), fields);
            continue;
        }

        doc.insert("INTERFACE", sonic_name.clone(), serde_json::Map::new());
        for addr in addresses {
            let family = match addr.family {
                core_model::AddressFamily::V4 => "IPv4",
                core_model::AddressFamily::V6 => "IPv6",
            };
            let mut fields = serde_json::Map::new();
            fields.insert("scope".to_string(), "global".into());
            fields.insert("family".to_string(), family.into());
            doc.insert("INTERFACE", format!("{sonic_name}|{}", addr.address), fields);
        }
    }
}

fn add_vlans(
    doc: &mut SonicConfigDocument,
    virtuals: &[&Interface],
    physical: &[&Interface],
    snapshot: &InventorySnapshot,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
) {
    for svi in virtuals {
        let Some(VirtualKind::Svi(vid)) = svi.virtual_kind() else { continue };
        let vlan_name = format!("Vlan{vid}");

        let mut members = Vec::new();
        for member in physical {
            let sonic_name = &sonic_name_of[&member.id];
            if member.vlans.untagged == Some(vid) {
                members.push(sonic_name.clone());
                let mut fields = serde_json::Map::new();
                fields.insert("tagging_mode".to_string(), "untagged".into());
                doc.insert("VLAN_MEMBER", format!("{vlan_name}|{sonic_name}"), fields);
            } else if member.vlans.tagged.contains(&vid) {
                members.push(sonic_name.clone());
                let mut fields = serde_json::Map::new();
                fields.insert("tagging_mode".to_string(), "tagged".into());
                doc.insert("VLAN_MEMBER", format!("{vlan_name}|{sonic_name}"), fields);
            }
        }

        let mut vlan_fields = serde_json::Map::new();
        vlan_fields.insert("admin_status".to_string(), "up".into());
        vlan_fields.insert("autostate".to_string(), "enable".into());
        vlan_fields.insert("members".to_string(), serde_json::Value::from(members));
        vlan_fields.insert("vlanid".to_string(), vid.to_string().into());
        doc.insert("VLAN", vlan_name.clone(), vlan_fields);

        let addresses = snapshot.ips_of(svi.id);
        if !addresses.is_empty() {
            let mut fields = serde_json::Map::new();
            fields.insert("admin_status".to_string(), "up".into());
            doc.insert("VLAN_INTERFACE", vlan_name.clone(), fields);
            for addr in addresses {
                doc.insert("VLAN_INTERFACE", format!("{vlan_name}|{}", addr.address), serde_json::Map::new());
            }
        }
    }
}

fn add_loopbacks(doc: &mut SonicConfigDocument, virtuals: &[&Interface], snapshot: &InventorySnapshot) {
    for lo in virtuals {
        let Some(VirtualKind::Loopback(n)) = lo.virtual_kind() else { continue };
        let name = format!("Loopback{n}");

        let mut fields = serde_json::Map::new();
        fields.insert("admin_status".to_string(), "up".into());
        doc.insert("LOOPBACK", name.clone(), fields);
        doc.insert("LOOPBACK_INTERFACE", name.clone(), serde_json::Map::new());

        for addr in snapshot.ips_of(lo.id) {
            doc.insert("LOOPBACK_INTERFACE", format!("{name}|{}", addr.address), serde_json::Map::new());
            if n == 0 {
                let af_key = match addr.family {
                    core_model::AddressFamily::V4 => format!("default|ipv4_unicast|{}", addr.address),
                    core_model::AddressFamily::V6 => format!("default|ipv6_unicast|{}", addr.address),
                };
                doc.insert("BGP_GLOBALS_AF_NETWORK", af_key, serde_json::Map::new());
            }
        }
    }
}

/// Extracts a port-channel number from a LAG interface's name, trying the
/// common naming patterns in order before falling back to any digits in
/// the name, matching `detect_port_channels`.
fn portchannel_number(lag_name: &str, fallback_index: usize) -> String {
    use std::sync::OnceLock;
    static PATTERNS: OnceLock<Vec<regex::Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        ["(?i)^portchannel(\\d+)$", "(?i)^port-channel(\\d+)$", "(?i)^lag(\\d+)$", "(?i)^ae(\\d+)$", "(?i)^bond(\\d+)$"]
            .iter()
            .map(|p| regex::Regex::new(p).unwrap())
            .collect()
    });
    for re in patterns {
        if let Some(caps) = re.captures(lag_name) {
            return caps[1].to_string();
        }
    }
    static DIGITS: OnceLock<regex::Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| regex::Regex::new(r"\d+").unwrap());
    if let Some(m) = digits.find(lag_name) {
        return m.as_str().to_string();
    }
    (fallback_index + 1).to_string()
}

fn add_portchannels(
    doc: &mut SonicConfigDocument,
    lag_masters: &[&Interface],
    snapshot: &InventorySnapshot,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
) {
    for (index, lag) in lag_masters.iter().enumerate() {
        let number = portchannel_number(&lag.name, index);
        let pc_name = format!("PortChannel{number}");

        let mut fields = serde_json::Map::new();
        fields.insert("admin_status".to_string(), "up".into());
        fields.insert("fast_rate".to_string(), "false".into());
        fields.insert("min_links".to_string(), "1".into());
        fields.insert("mtu".to_string(), "9100".into());
        doc.insert("PORTCHANNEL", pc_name.clone(), fields);

        let mut iface_fields = serde_json::Map::new();
        iface_fields.insert("ipv6_use_link_local_only".to_string(), "enable".into());
        doc.insert("PORTCHANNEL_INTERFACE", pc_name.clone(), iface_fields);

        for member in snapshot.lag_members(lag.id) {
            let Some(sonic_name) = sonic_name_of.get(&member.id) else { continue };
            doc.insert("PORTCHANNEL_MEMBER", format!("{pc_name}|{sonic_name}"), serde_json::Map::new());
        }
    }
}

fn add_vrfs(
    doc: &mut SonicConfigDocument,
    physical: &[&Interface],
    lag_masters: &[&Interface],
    snapshot: &InventorySnapshot,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
) {
    let mut assign = |vrf_id, section: &str, key: String| {
        let Some(name) = snapshot.vrf_name(vrf_id) else { return };
        let Some(table_id) = vrf::table_id(name) else {
            tracing::warn!(vrf = %name, "vrf name does not match the ^vrf(\\d+)$ convention, skipping");
            return;
        };
        let sonic_vrf = vrf::sonic_vrf_name(table_id);
        doc.insert("VRF", sonic_vrf.clone(), serde_json::Map::new());
        doc.table(section).entry(key).or_default().insert("vrf_name".to_string(), sonic_vrf.into());
    };

    for iface in physical {
        if let Some(vrf_id) = iface.vrf {
            let sonic_name = sonic_name_of[&iface.id].clone();
            assign(vrf_id, "INTERFACE", sonic_name);
        }
    }
    for (index, lag) in lag_masters.iter().enumerate() {
        if let Some(vrf_id) = lag.vrf {
            let pc_name = format!("PortChannel{}", portchannel_number(&lag.name, index));
            assign(vrf_id, "PORTCHANNEL_INTERFACE", pc_name);
        }
    }
}

fn add_mgmt_interface(doc: &mut SonicConfigDocument, device: &Device, all_interfaces: &[&Interface]) {
    let Some(mgmt) = all_interfaces.iter().find(|i| i.mgmt_only) else { return };
    let Some(oob) = device.oob_ip else { return };

    doc.insert("MGMT_INTERFACE", mgmt.name.clone(), serde_json::Map::new());
    doc.insert("MGMT_INTERFACE", format!("{}|{}/32", mgmt.name, oob), serde_json::Map::new());
}

fn add_services(doc: &mut SonicConfigDocument, device: &Device, sweep_cache: &SonicSweepCache, snapshot: &InventorySnapshot) {
    let Some(oob) = device.oob_ip else { return };
    let Some(metalbox_ip) = sweep_cache.metalbox_ip_for(oob, snapshot) else { return };

    doc.insert("NTP_SERVER", metalbox_ip.to_string(), services::ntp_server_fields());
    doc.insert("DNS_NAMESERVER", metalbox_ip.to_string(), services::dns_nameserver_fields());
}

#[allow(clippy::too_many_arguments)]
fn add_bgp_and_bfd(
    doc: &mut SonicConfigDocument,
    device: &Device,
    physical: &[&Interface],
    virtuals: &[&Interface],
    lag_masters: &[&Interface],
    snapshot: &InventorySnapshot,
    interfaces_by_sonic_name: &HashMap<String, core_model::InterfaceId>,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
    device_as_mapping: &HashMap<DeviceId, u64>,
) {
    let router_id = device
        .primary_ipv4
        .or(device.primary_ipv6)
        .map(|a| a.to_string());
    let local_asn = device.primary_ipv4.and_then(|a| bgp::local_asn_from_ipv4(a).ok());

    let mut globals = serde_json::Map::new();
    if let Some(rid) = router_id {
        globals.insert("router_id".to_string(), rid.into());
    }
    if let Some(asn) = device_as_mapping.get(&device.id).copied().or(local_asn) {
        globals.insert("local_asn".to_string(), asn.to_string().into());
    }
    if !globals.is_empty() {
        doc.insert("BGP_GLOBALS", "default", globals);
    }

    doc.insert("BFD_PROFILE", "default", bfd::default_bfd_profile());

    for iface in physical {
        if iface.lag_parent.is_some() || !iface.is_connected() {
            continue;
        }
        let Some(peer_device) = connections::get_connected_device_for_sonic_interface(
            device,
            &sonic_name_of[&iface.id],
            snapshot,
            interfaces_by_sonic_name,
        ) else {
            continue;
        };

        let addresses = snapshot.ips_of(iface.id);
        let has_direct_ipv4 = addresses.iter().copied().any(|ip| ip.family == core_model::AddressFamily::V4);
        let has_transfer_ipv4 = addresses.iter().copied().any(|ip| {
            ip.family == core_model::AddressFamily::V4
                && snapshot.prefix_for_ip(ip).map(|p| p.is_transfer()).unwrap_or(false)
        });
        let bgp_eligible = has_transfer_ipv4 || !has_direct_ipv4;
        if !bgp_eligible {
            continue;
        }

        let sonic_name = &sonic_name_of[&iface.id];
        let ptype = bgp::peer_type(device, peer_device, device_as_mapping);
        let peer_key = connections::get_connected_interface(sonic_name, snapshot, interfaces_by_sonic_name)
            .and_then(|peer_iface| snapshot.ips_of(peer_iface.id).into_iter().find(|ip| ip.family == core_model::AddressFamily::V4))
            .and_then(|ip| ip.host().ok())
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| sonic_name.clone());

        for af in bgp::neighbor_address_families(has_transfer_ipv4) {
            doc.insert("BGP_NEIGHBOR_AF", format!("default|{peer_key}|{af}"), serde_json::Map::new());
        }
        doc.insert("BGP_NEIGHBOR", format!("default|{peer_key}"), bgp::neighbor_fields(ptype, has_transfer_ipv4, None));

        if bfd::should_interface_have_bfd(true, false, peer_device, bgp_eligible) {
            doc.insert("BFD_PEER", bfd::bfd_peer_key(sonic_name), bfd::bfd_peer_fields());
        }
    }

    for (index, lag) in lag_masters.iter().enumerate() {
        let pc_name = format!("PortChannel{}", portchannel_number(&lag.name, index));
        let Some(peer_device) = connections::get_connected_device_for_sonic_interface(device, &pc_name, snapshot, interfaces_by_sonic_name)
            .or_else(|| snapshot.lag_members(lag.id).first().and_then(|m| snapshot.cable_peer(m.id)).and_then(|p| snapshot.device_of_interface(p)))
        else {
            continue;
        };
        let ptype = bgp::peer_type(device, peer_device, device_as_mapping);
        let has_ipv4 = peer_device.primary_ipv4.is_some();
        doc.insert("BGP_NEIGHBOR_AF", format!("default|{pc_name}|ipv4_unicast"), serde_json::Map::new());
        if !has_ipv4 {
            doc.insert("BGP_NEIGHBOR_AF", format!("default|{pc_name}|ipv6_unicast"), serde_json::Map::new());
        }
        doc.insert("BGP_NEIGHBOR", format!("default|{pc_name}"), bgp::neighbor_fields(ptype, has_ipv4, None));
    }

    add_svi_bgp_neighbors(doc, device, virtuals, physical, snapshot, interfaces_by_sonic_name, sonic_name_of, device_as_mapping);
}

/// Per SVI whose VLAN has at least one untagged member: one `BGP_NEIGHBOR`
/// per distinct peer IPv4 discoverable from an untagged member's cable
/// peer, keyed by that IPv4 with `v6only=false` (spec.md §4.4.3). No FHRP
/// VIP model exists in the inventory graph yet, so the peer interface's
/// own address stands in for its VIP, the same simplification the
/// physical-interface pass above already makes.
#[allow(clippy::too_many_arguments)]
fn add_svi_bgp_neighbors(
    doc: &mut SonicConfigDocument,
    device: &Device,
    virtuals: &[&Interface],
    physical: &[&Interface],
    snapshot: &InventorySnapshot,
    interfaces_by_sonic_name: &HashMap<String, core_model::InterfaceId>,
    sonic_name_of: &HashMap<core_model::InterfaceId, String>,
    device_as_mapping: &HashMap<DeviceId, u64>,
) {
    use std::collections::BTreeSet;

    for svi in virtuals {
        let Some(VirtualKind::Svi(vid)) = svi.virtual_kind() else { continue };

        let mut seen_peers: BTreeSet<String> = BTreeSet::new();
        for member in physical {
            if member.vlans.untagged != Some(vid) {
                continue;
            }
            let sonic_name = &sonic_name_of[&member.id];
            let Some(peer_device) = connections::get_connected_device_for_sonic_interface(
                device,
                sonic_name,
                snapshot,
                interfaces_by_sonic_name,
            ) else {
                continue;
            };
            let Some(peer_iface) = connections::get_connected_interface(sonic_name, snapshot, interfaces_by_sonic_name) else {
                continue;
            };

            for ip in snapshot.ips_of(peer_iface.id) {
                if ip.family != core_model::AddressFamily::V4 {
                    continue;
                }
                let Ok(peer_addr) = ip.host() else { continue };
                let peer_key = peer_addr.to_string();
                if !seen_peers.insert(peer_key.clone()) {
                    continue;
                }
                let ptype = bgp::peer_type(device, peer_device, device_as_mapping);
                doc.insert("BGP_NEIGHBOR_AF", format!("default|{peer_key}|ipv4_unicast"), serde_json::Map::new());
                doc.insert("BGP_NEIGHBOR", format!("default|{peer_key}"), bgp::neighbor_fields(ptype, true, None));
            }
        }
    }
}
