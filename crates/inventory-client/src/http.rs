use async_trait::async_trait;
use core_model::{Cable, Device, DeviceId, Interface, IpAddress, Prefix};
use serde_json::Value;

use crate::error::InventoryError;
use crate::port::{DeviceFilter, InventoryClient, JournalEntryKind, Result};

/// REST client against a NetBox-shaped DCIM API, bearer-token
/// authenticated. One instance per Inventory replica.
pub struct HttpInventoryClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpInventoryClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn handle_error_response(&self, resp: reqwest::Response) -> InventoryError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        match status {
            404 => InventoryError::NotFound(body),
            _ => InventoryError::Http { status, body },
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| InventoryError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }

        resp.json::<T>()
            .await
            .map_err(|e| InventoryError::Decode(e.to_string()))
    }

    /// Resolves a location/rack name to its id before it's used in a
    /// device query (spec.md §4.2: "`location` and `rack` names are
    /// resolved to ids before querying").
    async fn resolve_id(&self, path: &str, name: &str) -> Result<Option<String>> {
        #[derive(serde::Deserialize)]
        struct IdOnly {
            id: u64,
        }
        let results: Vec<IdOnly> = self.get_json(path, &[("name", name)]).await?;
        Ok(results.into_iter().next().map(|r| r.id.to_string()))
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn status(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.url("/api/status/"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| InventoryError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }

    async fn get_device(&self, name: &str) -> Result<Device> {
        self.get_json("/api/dcim/devices/", &[("name", name)])
            .await
            .and_then(|mut v: Vec<Device>| {
                v.pop().ok_or_else(|| InventoryError::NotFound(name.to_string()))
            })
    }

    async fn filter_devices(&self, filter: &DeviceFilter) -> Result<Vec<Device>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(tag) = &filter.tag {
            query.push(("tag", tag.as_str()));
        }
        if let Some(role) = &filter.role {
            query.push(("role", role.as_str()));
        }
        if let Some(site) = &filter.site {
            query.push(("site", site.as_str()));
        }
        if let Some(region) = &filter.region {
            query.push(("region", region.as_str()));
        }

        let location_id = match &filter.location {
            Some(name) => self.resolve_id("/api/dcim/locations/", name).await?,
            None => None,
        };
        if let Some(id) = &location_id {
            query.push(("location_id", id.as_str()));
        }
        let rack_id = match &filter.rack {
            Some(name) => self.resolve_id("/api/dcim/racks/", name).await?,
            None => None,
        };
        if let Some(id) = &rack_id {
            query.push(("rack_id", id.as_str()));
        }

        self.get_json("/api/dcim/devices/", &query).await
    }

    async fn list_interfaces(&self, device_id: DeviceId) -> Result<Vec<Interface>> {
        let id = device_id.to_string();
        self.get_json("/api/dcim/interfaces/", &[("device_id", id.as_str())])
            .await
    }

    async fn list_ip_addresses(&self, device_id: DeviceId) -> Result<Vec<IpAddress>> {
        let id = device_id.to_string();
        self.get_json("/api/ipam/ip-addresses/", &[("device_id", id.as_str())])
            .await
    }

    async fn list_cables(&self, device_id: DeviceId) -> Result<Vec<Cable>> {
        let id = device_id.to_string();
        self.get_json("/api/dcim/cables/", &[("device_id", id.as_str())])
            .await
    }

    async fn list_prefixes(&self, role: Option<&str>) -> Result<Vec<Prefix>> {
        let query: Vec<(&str, &str)> = role.map(|r| vec![("role", r)]).unwrap_or_default();
        self.get_json("/api/ipam/prefixes/", &query).await
    }

    async fn update_custom_fields(&self, device_id: DeviceId, patch: Value) -> Result<()> {
        let body = serde_json::json!({ "custom_fields": patch });
        let resp = self
            .client
            .patch(self.url(&format!("/api/dcim/devices/{device_id}/")))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| InventoryError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }

    async fn create_journal_entry(
        &self,
        device_id: DeviceId,
        kind: JournalEntryKind,
        message: &str,
    ) -> Result<()> {
        let body = serde_json::json!({
            "assigned_object_type": "dcim.device",
            "assigned_object_id": device_id.to_string(),
            "kind": kind.as_str(),
            "comments": message,
        });
        let resp = self
            .client
            .post(self.url("/api/extras/journal-entries/"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| InventoryError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.handle_error_response(resp).await);
        }
        Ok(())
    }
}
