//! VRF name validation and SONiC table-id mapping, ported from
//! `_get_vrf_info` / `_add_vrf_configuration`.

use std::sync::OnceLock;

use regex::Regex;

fn vrf_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^vrf(\d+)$").unwrap())
}

/// Extracts the numeric table id from a VRF name matching `^vrf(\d+)$`
/// (case-insensitive); any other name is not a SONiC-manageable VRF and is
/// skipped by the caller with a warning, not an error — an Inventory VRF
/// the generator doesn't recognize isn't this device's problem to fail on.
pub fn table_id(vrf_name: &str) -> Option<u32> {
    vrf_name_re().captures(vrf_name)?.get(1)?.as_str().parse().ok()
}

/// The SONiC VRF name for a given table id, e.g. `Vrf42`.
pub fn sonic_vrf_name(table_id: u32) -> String {
    format!("Vrf{table_id}")
}
