use std::time::Duration;

use async_trait::async_trait;
use core_model::node::{Node, NodePort, ProvisionState};
use serde_json::Value;
use tracing::warn;

use crate::error::BmcError;
use crate::port::{
    BmcClient, CreateNodeInput, InterfaceValidation, NodeValidation, ProvisionVerb, Result, UpdateNodeInput,
};

/// REST client against an Ironic-shaped baremetal API, bearer-token
/// authenticated.
pub struct HttpBmcClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
    poll_interval: Duration,
}

impl HttpBmcClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
            poll_interval: Duration::from_secs(5),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn handle_error_response(&self, resp: reqwest::Response) -> BmcError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        match status {
            404 => BmcError::NotFound(body),
            409 => BmcError::Conflict(body),
            _ => BmcError::Http { status, body },
        }
    }
}

#[async_trait]
impl BmcClient for HttpBmcClient {
    async fn find_node(&self, name: &str) -> Result<Option<Node>> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/nodes/{name}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;

        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        let node = resp
            .json::<Node>()
            .await
            .map_err(|e| BmcError::Decode(e.to_string()))?;
        Ok(Some(node))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let resp = self
            .client
            .get(self.url("/v1/nodes"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        resp.json::<Vec<Node>>().await.map_err(|e| BmcError::Decode(e.to_string()))
    }

    async fn create_node(&self, input: CreateNodeInput) -> Result<Node> {
        let body = serde_json::json!({
            "name": input.name,
            "driver": input.driver.as_str(),
            "driver_info": input.driver_info,
            "resource_class": input.resource_class,
            "extra": input.extra,
        });
        let resp = self
            .client
            .post(self.url("/v1/nodes"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        resp.json::<Node>().await.map_err(|e| BmcError::Decode(e.to_string()))
    }

    async fn update_node(&self, uuid: &str, input: UpdateNodeInput) -> Result<Node> {
        let mut patches = Vec::new();
        if let Some(v) = input.driver_info {
            patches.push(serde_json::json!({"op": "replace", "path": "/driver_info", "value": v}));
        }
        if let Some(v) = input.instance_info {
            patches.push(serde_json::json!({"op": "replace", "path": "/instance_info", "value": v}));
        }
        if let Some(v) = input.extra {
            patches.push(serde_json::json!({"op": "replace", "path": "/extra", "value": v}));
        }
        if let Some(v) = input.maintenance {
            patches.push(serde_json::json!({"op": "replace", "path": "/maintenance", "value": v}));
        }
        if let Some(v) = input.maintenance_reason {
            patches.push(serde_json::json!({"op": "replace", "path": "/maintenance_reason", "value": v}));
        }
        let resp = self
            .client
            .patch(self.url(&format!("/v1/nodes/{uuid}")))
            .bearer_auth(&self.token)
            .json(&patches)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        resp.json::<Node>().await.map_err(|e| BmcError::Decode(e.to_string()))
    }

    async fn delete_node(&self, uuid: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/v1/nodes/{uuid}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }

    async fn validate_node(&self, uuid: &str) -> Result<NodeValidation> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/nodes/{uuid}/validate")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        let body: Value = resp.json().await.map_err(|e| BmcError::Decode(e.to_string()))?;
        let check = |iface: &str| {
            if body.get(iface).and_then(|v| v.get("result")).and_then(Value::as_bool) == Some(false) {
                InterfaceValidation::Failed
            } else {
                InterfaceValidation::Ok
            }
        };
        Ok(NodeValidation { management: check("management"), boot: check("boot") })
    }

    async fn set_provision_state(
        &self,
        uuid: &str,
        verb: ProvisionVerb,
        config_drive: Option<Value>,
    ) -> Result<()> {
        let mut body = serde_json::json!({ "target": verb.as_str() });
        if let Some(cd) = config_drive {
            body["configdrive"] = cd;
        }
        let resp = self
            .client
            .put(self.url(&format!("/v1/nodes/{uuid}/states/provision")))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }

    async fn wait_for_provision_state(
        &self,
        uuid: &str,
        target: ProvisionState,
        timeout: Duration,
    ) -> Result<ProvisionState> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let node = self.find_node(uuid).await?;
            if let Some(node) = node {
                if node.provision_state == target {
                    return Ok(node.provision_state);
                }
                if matches!(
                    node.provision_state,
                    ProvisionState::DeployFailed | ProvisionState::CleanFailed | ProvisionState::Error
                ) {
                    warn!(uuid, state = node.provision_state.as_str(), "bmc reached a failure state while waiting");
                    return Ok(node.provision_state);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BmcError::WaitTimeout(timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn set_power_state(&self, uuid: &str, on: bool) -> Result<()> {
        let body = serde_json::json!({ "target": if on { "power on" } else { "power off" } });
        let resp = self
            .client
            .put(self.url(&format!("/v1/nodes/{uuid}/states/power")))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }

    async fn list_ports(&self, node_uuid: &str) -> Result<Vec<NodePort>> {
        let resp = self
            .client
            .get(self.url("/v1/ports"))
            .bearer_auth(&self.token)
            .query(&[("node_uuid", node_uuid)])
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        resp.json::<Vec<NodePort>>()
            .await
            .map_err(|e| BmcError::Decode(e.to_string()))
    }

    async fn create_port(&self, node_uuid: &str, mac_address: &str) -> Result<NodePort> {
        let body = serde_json::json!({ "node_uuid": node_uuid, "address": mac_address });
        let resp = self
            .client
            .post(self.url("/v1/ports"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        resp.json::<NodePort>().await.map_err(|e| BmcError::Decode(e.to_string()))
    }

    async fn delete_port(&self, port_uuid: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/v1/ports/{port_uuid}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BmcError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }
}
