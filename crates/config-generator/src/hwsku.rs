//! Port-config (`/etc/sonic/port_config/<hwsku>.ini`) loading, grounded on
//! the original's `interface.get_port_config`, plus the closed-list HWSKU
//! validation spec.md §4.4/§7 require instead of the original's silent
//! empty-map fallback.

use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::SUPPORTED_HWSKUS;
use crate::error::ConfigGeneratorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfigEntry {
    pub lanes: String,
    pub alias: String,
    pub index: String,
    pub speed: u32,
    pub valid_speeds: Option<String>,
}

/// Port name -> static hardware properties for one HWSKU, indexed by the
/// canonical SONiC port name (e.g. `Ethernet0`).
pub type PortConfigTable = BTreeMap<String, PortConfigEntry>;

/// Rejects any HWSKU outside the closed support list before ever touching
/// the filesystem (spec.md §7: unsupported HWSKU is a Validation error).
pub fn ensure_supported(hwsku: &str) -> Result<(), ConfigGeneratorError> {
    if SUPPORTED_HWSKUS.contains(&hwsku) {
        Ok(())
    } else {
        Err(ConfigGeneratorError::UnsupportedHwsku(hwsku.to_string()))
    }
}

/// Loads and parses `<port_config_dir>/<hwsku>.ini`. Each non-comment,
/// non-blank line is `port_name lanes alias index speed [valid_speeds]`
/// (space-separated, 5 required columns + 1 optional).
pub fn load_port_config(
    port_config_dir: &Path,
    hwsku: &str,
) -> Result<PortConfigTable, ConfigGeneratorError> {
    ensure_supported(hwsku)?;

    let path = port_config_dir.join(format!("{hwsku}.ini"));
    let raw = std::fs::read_to_string(&path)?;
    parse_port_config(hwsku, &raw)
}

pub fn parse_port_config(
    hwsku: &str,
    raw: &str,
) -> Result<PortConfigTable, ConfigGeneratorError> {
    let mut table = PortConfigTable::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            continue;
        }
        let speed: u32 = parts[4].parse().map_err(|_| ConfigGeneratorError::InvalidPortConfig {
            hwsku: hwsku.to_string(),
            reason: format!("non-numeric speed column in line {line:?}"),
        })?;
        table.insert(
            parts[0].to_string(),
            PortConfigEntry {
                lanes: parts[1].to_string(),
                alias: parts[2].to_string(),
                index: parts[3].to_string(),
                speed,
                valid_speeds: parts.get(5).map(|s| s.to_string()),
            },
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# name lanes alias index speed valid_speeds
Ethernet0   1,2,3,4   Eth1/1   1   100000   100000,50000,25000,10000,1000
Ethernet4   5,6,7,8   Eth1/2   2   100000   100000,50000,25000,10000,1000

Ethernet8 9 Eth1/3 3 10000
";

    #[test]
    fn unsupported_hwsku_is_rejected_before_touching_disk() {
        let err = load_port_config(Path::new("/nonexistent"), "Totally-Made-Up").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn parses_required_and_optional_columns() {
        let table = parse_port_config("Accton-AS7326-56X", SAMPLE).unwrap();
        assert_eq!(table.len(), 3);
        let e0 = &table["Ethernet0"];
        assert_eq!(e0.lanes, "1,2,3,4");
        assert_eq!(e0.speed, 100_000);
        assert_eq!(e0.valid_speeds.as_deref(), Some("100000,50000,25000,10000,1000"));
        let e8 = &table["Ethernet8"];
        assert!(e8.valid_speeds.is_none());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let table = parse_port_config("Accton-AS7326-56X", SAMPLE).unwrap();
        assert!(!table.contains_key("#"));
    }
}
