//! `DEVICE_METADATA` / `VERSION` field derivation, ported from `device.py`
//! (`get_device_platform`, `get_device_hostname`, `get_device_mac_address`).

use core_model::{Device, InventorySnapshot};

use crate::constants::DEFAULT_SONIC_VERSION;

/// `inventory_hostname` custom field, falling back to the device's own
/// name.
pub fn hostname(device: &Device) -> String {
    device
        .custom_fields
        .inventory_hostname
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| device.name.clone())
}

/// `sonic_parameters.platform`, falling back to a generated
/// `x86_64-<hwsku_lower_underscored>-r0` string.
pub fn platform(device: &Device, hwsku: &str) -> String {
    let from_params = device
        .custom_fields
        .sonic_parameters
        .as_ref()
        .and_then(|v| v.get("platform"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty());

    if let Some(p) = from_params {
        return p.to_string();
    }
    format!("x86_64-{}-r0", hwsku.to_lowercase().replace('-', "_"))
}

/// MAC address of the device's management-only interface, else the fixed
/// zero address.
pub fn mac_address(device: &Device, snapshot: &InventorySnapshot) -> String {
    snapshot
        .interfaces_of(device.id)
        .into_iter()
        .find(|i| i.mgmt_only)
        .and_then(|i| i.mac_address.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "00:00:00:00:00:00".to_string())
}

/// `VERSION.DATABASE.VERSION`: a normalized custom `config_version` (given
/// the `version_` prefix if it doesn't already carry one), else the fixed
/// default.
pub fn database_version(device: &Device) -> String {
    let custom = device
        .custom_fields
        .extra
        .get("config_version")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty());

    match custom {
        Some(v) if v.starts_with("version_") => v.to_string(),
        Some(v) => format!("version_{v}"),
        None => format!("version_{}", DEFAULT_SONIC_VERSION.replace('.', "_")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{CustomFields, DeviceId, DeviceRole};
    use std::collections::BTreeSet;

    fn device(custom_fields: CustomFields) -> Device {
        Device {
            id: DeviceId::default(),
            name: "leaf-01".to_string(),
            role: DeviceRole::Leaf,
            primary_ipv4: None,
            primary_ipv6: None,
            tags: BTreeSet::new(),
            oob_ip: None,
            serial: None,
            custom_fields,
        }
    }

    #[test]
    fn hostname_falls_back_to_device_name() {
        let d = device(CustomFields::default());
        assert_eq!(hostname(&d), "leaf-01");
    }

    #[test]
    fn hostname_prefers_inventory_hostname() {
        let mut cf = CustomFields::default();
        cf.inventory_hostname = Some("sw-leaf-01".to_string());
        let d = device(cf);
        assert_eq!(hostname(&d), "sw-leaf-01");
    }

    #[test]
    fn platform_generated_from_hwsku_when_absent() {
        let d = device(CustomFields::default());
        assert_eq!(platform(&d, "Accton-AS7326-56X"), "x86_64-accton_as7326_56x-r0");
    }

    #[test]
    fn platform_prefers_sonic_parameters() {
        let mut cf = CustomFields::default();
        cf.sonic_parameters = Some(serde_json::json!({"platform": "custom-platform"}));
        let d = device(cf);
        assert_eq!(platform(&d, "Accton-AS7326-56X"), "custom-platform");
    }

    #[test]
    fn mac_address_defaults_to_zero() {
        let d = device(CustomFields::default());
        let snap = InventorySnapshot::default();
        assert_eq!(mac_address(&d, &snap), "00:00:00:00:00:00");
    }

    #[test]
    fn database_version_normalizes_missing_prefix() {
        let mut cf = CustomFields::default();
        cf.extra.insert("config_version".to_string(), serde_json::Value::from("7_0_1"));
        let d = device(cf);
        assert_eq!(database_version(&d), "version_7_0_1");
    }

    #[test]
    fn database_version_defaults_when_absent() {
        let d = device(CustomFields::default());
        assert_eq!(database_version(&d), "version_4_5_0");
    }
}
