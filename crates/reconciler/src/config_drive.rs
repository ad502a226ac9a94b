use serde_json::{Map, Value};

use core_model::node::Node;

use crate::error::ReconcilerError;

/// Builds the `config drive` payload handed to `set_provision_state` on
/// `active`/`rebuild` (spec.md §4.5): reads the network-rendering
/// parameters `prepare_node_attributes` folded into the node's `extra`
/// bag and assembles the `meta_data`/`network_data`/`user_data` triple
/// ironic's config-drive builder expects. A pure function — failure to
/// build one node's config drive is isolated from the rest of a deploy
/// sweep by the caller, never fatal to it.
pub fn build_config_drive(node: &Node) -> Result<Value, ReconcilerError> {
    let netplan = extra_json(node, "netplan_parameters")?;
    let frr = extra_json(node, "frr_parameters")?;

    let mut network_data = Map::new();
    if let Some(netplan) = netplan {
        network_data.insert("netplan".to_string(), netplan);
    }
    if let Some(frr) = frr {
        network_data.insert("frr".to_string(), frr);
    }

    let meta_data = serde_json::json!({
        "uuid": node.uuid,
        "hostname": node.name,
    });

    Ok(serde_json::json!({
        "meta_data": meta_data,
        "network_data": network_data,
        "user_data": "",
    }))
}

fn extra_json(node: &Node, key: &str) -> Result<Option<Value>, ReconcilerError> {
    match node.extra.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| ReconcilerError::Validation(format!("extra.{key} is not valid json: {e}"))),
        Some(other) => Ok(Some(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::node::{DriverKind, PowerState, ProvisionState};

    fn node_with_extra(extra: Map<String, Value>) -> Node {
        Node {
            uuid: Some("abc-123".into()),
            name: "leaf-01".into(),
            provision_state: ProvisionState::Available,
            power_state: PowerState::PowerOff,
            maintenance: false,
            driver: DriverKind::Redfish,
            driver_info: Map::new(),
            instance_info: Map::new(),
            instance_uuid: None,
            extra,
            resource_class: None,
        }
    }

    #[test]
    fn assembles_network_data_from_extra() {
        let extra = serde_json::json!({
            "netplan_parameters": "{\"version\": 2}",
            "frr_parameters": "{\"router_id\": \"10.0.0.1\"}"
        })
        .as_object()
        .unwrap()
        .clone();
        let drive = build_config_drive(&node_with_extra(extra)).unwrap();
        assert_eq!(drive["network_data"]["netplan"]["version"], 2);
        assert_eq!(drive["network_data"]["frr"]["router_id"], "10.0.0.1");
        assert_eq!(drive["meta_data"]["hostname"], "leaf-01");
    }

    #[test]
    fn missing_extra_keys_yield_empty_network_data() {
        let drive = build_config_drive(&node_with_extra(Map::new())).unwrap();
        assert!(drive["network_data"].as_object().unwrap().is_empty());
    }

    #[test]
    fn malformed_extra_json_is_a_validation_error() {
        let extra = serde_json::json!({ "netplan_parameters": "not json" })
            .as_object()
            .unwrap()
            .clone();
        let err = build_config_drive(&node_with_extra(extra)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
