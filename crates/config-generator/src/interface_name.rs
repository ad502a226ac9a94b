//! Alias <-> canonical SONiC interface-name conversion (spec.md §4.4.1),
//! ported from the original's `convert_netbox_interface_to_sonic` /
//! `convert_sonic_interface_to_alias`.

use regex::Regex;
use std::sync::OnceLock;

use crate::constants::HIGH_SPEED_PORTS;
use crate::error::ConfigGeneratorError;

fn alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Eth(\d+)/(\d+)$").unwrap())
}

fn sonic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Ethernet(\d+)$").unwrap())
}

fn is_high_speed(speed_mbps: Option<u32>) -> bool {
    speed_mbps.is_some_and(|s| HIGH_SPEED_PORTS.contains(&s))
}

/// `Eth<module>/<port>` -> `Ethernet<k>`. Already-canonical names pass
/// through unchanged; unrecognized names are returned as-is, matching the
/// original's permissive fallback.
pub fn alias_to_sonic(alias: &str, speed_mbps: Option<u32>) -> String {
    if alias.starts_with("Ethernet") {
        return alias.to_string();
    }
    let Some(caps) = alias_re().captures(alias) else {
        return alias.to_string();
    };
    let port: u32 = caps[2].parse().unwrap_or(1);
    let port_number = port.saturating_sub(1);
    let multiplier = if is_high_speed(speed_mbps) { 4 } else { 1 };
    format!("Ethernet{}", port_number * multiplier)
}

/// `Ethernet<k>` -> `Eth<module>/<port>` (or `Eth1/<port>/<subport>` when
/// `is_breakout` is set). Module is always `1` — this generator targets
/// single-module fixed switches only.
pub fn sonic_to_alias(
    sonic_name: &str,
    speed_mbps: Option<u32>,
    is_breakout: bool,
) -> Result<String, ConfigGeneratorError> {
    let Some(caps) = sonic_re().captures(sonic_name) else {
        return Ok(sonic_name.to_string());
    };
    let sonic_port_number: u32 = caps[1]
        .parse()
        .map_err(|_| ConfigGeneratorError::InvalidInterfaceName(sonic_name.to_string()))?;

    if is_breakout {
        let base_port = (sonic_port_number / 4) * 4;
        let subport = (sonic_port_number % 4) + 1;
        let physical_port = (base_port / 4) + 1;
        return Ok(format!("Eth1/{physical_port}/{subport}"));
    }

    let multiplier = if is_high_speed(speed_mbps) { 4 } else { 1 };
    let physical_port = (sonic_port_number / multiplier) + 1;
    Ok(format!("Eth1/{physical_port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_speed_ports_use_4x_numbering() {
        assert_eq!(alias_to_sonic("Eth1/1", Some(100_000)), "Ethernet0");
        assert_eq!(alias_to_sonic("Eth1/2", Some(100_000)), "Ethernet4");
        assert_eq!(alias_to_sonic("Eth1/3", Some(100_000)), "Ethernet8");
    }

    #[test]
    fn non_high_speed_ports_use_sequential_numbering() {
        assert_eq!(alias_to_sonic("Eth1/1", Some(10_000)), "Ethernet0");
        assert_eq!(alias_to_sonic("Eth1/2", Some(10_000)), "Ethernet1");
        assert_eq!(alias_to_sonic("Eth1/3", Some(10_000)), "Ethernet2");
    }

    #[test]
    fn already_canonical_names_pass_through() {
        assert_eq!(alias_to_sonic("Ethernet12", Some(100_000)), "Ethernet12");
    }

    #[test]
    fn round_trips_through_alias_and_back() {
        for (alias, speed) in [("Eth1/1", 100_000u32), ("Eth1/2", 10_000), ("Eth1/5", 25_000)] {
            let sonic = alias_to_sonic(alias, Some(speed));
            let back = sonic_to_alias(&sonic, Some(speed), false).unwrap();
            assert_eq!(back, alias, "round trip for {alias}@{speed}");
        }
    }

    #[test]
    fn breakout_alias_uses_subport_notation() {
        assert_eq!(sonic_to_alias("Ethernet0", Some(25_000), true).unwrap(), "Eth1/1/1");
        assert_eq!(sonic_to_alias("Ethernet1", Some(25_000), true).unwrap(), "Eth1/1/2");
        assert_eq!(sonic_to_alias("Ethernet2", Some(25_000), true).unwrap(), "Eth1/1/3");
        assert_eq!(sonic_to_alias("Ethernet3", Some(25_000), true).unwrap(), "Eth1/1/4");
        assert_eq!(sonic_to_alias("Ethernet4", Some(25_000), true).unwrap(), "Eth1/2/1");
    }
}
