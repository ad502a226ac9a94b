//! `PORT` table population, ported from `_add_port_configurations` /
//! `_add_missing_breakout_ports`.

use serde_json::{Map, Value};

use core_model::Interface;

use crate::breakout::{breakout_valid_speeds, speed_mbps, BreakoutInfo};
use crate::error::ConfigGeneratorError;
use crate::hwsku::PortConfigEntry;
use crate::interface_name::sonic_to_alias;

/// Parses a breakout mode string (`"4x25G"`) down to its per-lane speed in
/// Mbps, the fallback source when NetBox doesn't carry an explicit speed
/// for a breakout member port.
pub fn breakout_mode_lane_speed_mbps(brkout_mode: &str) -> Option<u32> {
    let suffix = brkout_mode.split('x').nth(1)?;
    let digits: String = suffix.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().map(|g| g * 1000)
}

/// `admin_status`: up iff the port is connected to a cable, or is itself a
/// port-channel member — down otherwise.
pub fn admin_status(is_connected: bool, is_portchannel_member: bool) -> &'static str {
    if is_connected || is_portchannel_member {
        "up"
    } else {
        "down"
    }
}

/// Resolves the port's effective speed: NetBox's own speed (explicit
/// override or implied by port type) always wins over the port-config
/// table's static speed.
pub fn resolve_speed_mbps(interface: &Interface, port_config: &PortConfigEntry) -> u32 {
    speed_mbps(interface).unwrap_or(port_config.speed)
}

/// Resolves a breakout member port's speed: NetBox's explicit speed first,
/// else the speed implied by its breakout mode.
pub fn resolve_breakout_speed_mbps(
    interface: &Interface,
    brkout_mode: &str,
) -> Option<u32> {
    interface.speed_kbps.map(|kbps| (kbps / 1000) as u32).or_else(|| breakout_mode_lane_speed_mbps(brkout_mode))
}

#[allow(clippy::too_many_arguments)]
pub fn build_port_fields(
    interface: &Interface,
    port_config: &PortConfigEntry,
    is_connected: bool,
    is_portchannel_member: bool,
    breakout_info: &BreakoutInfo,
) -> Result<Map<String, Value>, ConfigGeneratorError> {
    let sonic_name = &interface.name;
    let is_breakout = breakout_info.breakout_ports.contains_key(sonic_name);

    let (speed, valid_speeds) = if is_breakout {
        let master = &breakout_info.breakout_ports[sonic_name].master;
        let mode = breakout_info
            .breakout_cfgs
            .get(master)
            .map(|cfg| cfg.brkout_mode.as_str())
            .unwrap_or("");
        let speed = resolve_breakout_speed_mbps(interface, mode).unwrap_or(port_config.speed);
        (speed, breakout_valid_speeds(speed))
    } else {
        let speed = resolve_speed_mbps(interface, port_config);
        let valid_speeds = port_config
            .valid_speeds
            .clone()
            .unwrap_or_else(|| format!("{speed},10000,1000"));
        (speed, valid_speeds)
    };

    let alias = sonic_to_alias(sonic_name, Some(speed), is_breakout)?;

    let mut fields = Map::new();
    fields.insert("admin_status".to_string(), Value::from(admin_status(is_connected, is_portchannel_member)));
    fields.insert("alias".to_string(), Value::from(alias));
    fields.insert("speed".to_string(), Value::from(speed.to_string()));
    fields.insert("valid_speeds".to_string(), Value::from(valid_speeds));
    fields.insert("lanes".to_string(), Value::from(port_config.lanes.clone()));
    fields.insert("index".to_string(), Value::from(port_config.index.clone()));
    fields.insert("mtu".to_string(), Value::from("9100"));
    fields.insert("adv_speeds".to_string(), Value::from("all"));
    fields.insert("autoneg".to_string(), Value::from("off"));
    fields.insert("link_training".to_string(), Value::from("off"));
    fields.insert("unreliable_los".to_string(), Value::from("auto"));
    Ok(fields)
}

/// Whether this sonic port name is a breakout master that the main PORT
/// loop should skip — it has been replaced by its individual breakout
/// member ports.
pub fn is_breakout_master(sonic_name: &str, breakout_info: &BreakoutInfo) -> bool {
    breakout_info.breakout_cfgs.contains_key(sonic_name)
}
