use handlebars::Handlebars;
use serde_json::{json, Map, Value};
use vault::Vault;

use core_model::node::DriverKind;
use core_model::Device;

use crate::util::{deep_decrypt, deep_merge};

struct DriverParams {
    address: &'static str,
    username: &'static str,
    password: &'static str,
}

fn driver_params(driver: DriverKind) -> DriverParams {
    match driver {
        DriverKind::Ipmi => DriverParams {
            address: "ipmi_address",
            username: "ipmi_username",
            password: "ipmi_password",
        },
        DriverKind::Redfish => DriverParams {
            address: "redfish_address",
            username: "redfish_username",
            password: "redfish_password",
        },
    }
}

fn render(template: &str, vars: &Value) -> String {
    let hb = Handlebars::new();
    hb.render_template(template, vars).unwrap_or_else(|_| template.to_string())
}

/// Composes the attributes handed to the BMC on node create/update
/// (spec.md §4.2 step 1): deep-merges base ironic parameters with the
/// Device's decrypted `ironic_parameters`, strips driver-info keys
/// belonging to non-selected drivers, template-renders address/username/
/// password, sets `resource_class`, and folds `netplan_parameters` /
/// `frr_parameters` into `extra` as JSON strings.
pub fn prepare_node_attributes(
    device: &Device,
    base_ironic_parameters: Map<String, Value>,
    vault: &dyn Vault,
) -> Map<String, Value> {
    let mut node_attributes = base_ironic_parameters;

    if let Some(Value::Object(ironic_params)) = &device.custom_fields.ironic_parameters {
        let mut as_value = Value::Object(ironic_params.clone());
        deep_decrypt(&mut as_value, vault);
        if let Value::Object(decrypted) = as_value {
            deep_merge(&mut node_attributes, &decrypted);
        }
    }

    let mut secrets = match &device.custom_fields.secrets {
        Some(Value::Object(m)) => m.clone(),
        _ => Map::new(),
    };
    let mut secrets_value = Value::Object(secrets.clone());
    deep_decrypt(&mut secrets_value, vault);
    if let Value::Object(m) = secrets_value {
        secrets = m;
    }

    let driver = node_attributes
        .get("driver")
        .and_then(Value::as_str)
        .and_then(|s| match s {
            "ipmi" => Some(DriverKind::Ipmi),
            "redfish" => Some(DriverKind::Redfish),
            _ => None,
        });

    if let Some(driver) = driver {
        let params = driver_params(driver);
        let other = match driver {
            DriverKind::Ipmi => driver_params(DriverKind::Redfish),
            DriverKind::Redfish => driver_params(DriverKind::Ipmi),
        };

        if let Some(Value::Object(driver_info)) = node_attributes.get_mut("driver_info") {
            for key in [other.address, other.username, other.password] {
                let prefix = key.split('_').next().unwrap_or(key);
                driver_info.retain(|k, _| !k.starts_with(&format!("{prefix}_")));
            }

            if let Some(Value::String(template)) = driver_info.get(params.username).cloned() {
                let username = secrets
                    .get("remote_board_username")
                    .and_then(Value::as_str)
                    .unwrap_or("admin")
                    .to_string();
                driver_info.insert(
                    params.username.to_string(),
                    Value::String(render(&template, &json!({ "remote_board_username": username }))),
                );
            }

            if let Some(Value::String(template)) = driver_info.get(params.password).cloned() {
                let password = secrets
                    .get("remote_board_password")
                    .and_then(Value::as_str)
                    .unwrap_or("password")
                    .to_string();
                driver_info.insert(
                    params.password.to_string(),
                    Value::String(render(&template, &json!({ "remote_board_password": password }))),
                );
            }

            if let Some(Value::String(template)) = driver_info.get(params.address).cloned() {
                if let Some(oob_ip) = device.oob_ip {
                    driver_info.insert(
                        params.address.to_string(),
                        Value::String(render(&template, &json!({ "remote_board_address": oob_ip.to_string() }))),
                    );
                }
            }
        }
    }

    node_attributes.insert("resource_class".to_string(), Value::String(device.name.clone()));

    let extra = node_attributes
        .entry("extra")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(extra) = extra {
        if let Some(instance_info) = node_attributes_instance_info(&node_attributes) {
            extra.insert("instance_info".to_string(), Value::String(instance_info));
        }
        if let Some(Value::Object(netplan)) = &device.custom_fields.netplan_parameters {
            extra.insert(
                "netplan_parameters".to_string(),
                Value::String(serde_json::to_string(netplan).unwrap_or_default()),
            );
        }
        if let Some(Value::Object(frr)) = &device.custom_fields.frr_parameters {
            extra.insert(
                "frr_parameters".to_string(),
                Value::String(serde_json::to_string(frr).unwrap_or_default()),
            );
        }
    }

    node_attributes
}

fn node_attributes_instance_info(node_attributes: &Map<String, Value>) -> Option<String> {
    let instance_info = node_attributes.get("instance_info")?;
    if instance_info.is_null() {
        return None;
    }
    serde_json::to_string(instance_info).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{DeviceId, DeviceRole};
    use std::collections::BTreeSet;
    use vault::NoopVault;

    fn device() -> Device {
        Device {
            id: DeviceId::new(),
            name: "leaf-01".into(),
            role: DeviceRole::Leaf,
            primary_ipv4: None,
            primary_ipv6: None,
            tags: BTreeSet::new(),
            oob_ip: Some("10.0.0.5".parse().unwrap()),
            serial: None,
            custom_fields: Default::default(),
        }
    }

    #[test]
    fn renders_oob_address_and_sets_resource_class() {
        let base = json!({
            "driver": "redfish",
            "driver_info": { "redfish_address": "https://{{remote_board_address}}" }
        })
        .as_object()
        .unwrap()
        .clone();
        let attrs = prepare_node_attributes(&device(), base, &NoopVault);
        assert_eq!(attrs["resource_class"], "leaf-01");
        assert_eq!(attrs["driver_info"]["redfish_address"], "https://10.0.0.5");
    }

    #[test]
    fn strips_unused_driver_keys() {
        let base = json!({
            "driver": "redfish",
            "driver_info": {
                "redfish_address": "https://{{remote_board_address}}",
                "ipmi_address": "should be stripped",
                "ipmi_username": "should be stripped"
            }
        })
        .as_object()
        .unwrap()
        .clone();
        let attrs = prepare_node_attributes(&device(), base, &NoopVault);
        assert!(attrs["driver_info"].get("ipmi_address").is_none());
        assert!(attrs["driver_info"].get("ipmi_username").is_none());
    }
}
