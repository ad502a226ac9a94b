use std::collections::HashSet;

use core_model::{CustomFields, Device};
use inventory_client::{DeviceFilter, InventoryClient};

use crate::error::ReconcilerError;

/// One Inventory query: a predicate mapping forwarded to `filter_devices`
/// (`tag`/`role`/`site`/`region`/`location`/`rack`), refined client-side
/// by role slug and the mirrored `device_state` custom field (spec.md
/// §4.2 supplement, grounded in the original's
/// `devices.filter(tag=..., cf_device_state=...)`).
#[derive(Debug, Clone, Default)]
pub struct ManagedSetQuery {
    pub tag: Option<String>,
    pub role_slug: Option<String>,
    pub site: Option<String>,
    pub region: Option<String>,
    pub location: Option<String>,
    pub rack: Option<String>,
    pub device_state: Option<String>,
}

impl ManagedSetQuery {
    pub fn matches(&self, device: &Device, custom_fields: &CustomFields) -> bool {
        if let Some(tag) = &self.tag {
            if !device.tags.contains(tag) {
                return false;
            }
        }
        if let Some(role_slug) = &self.role_slug {
            if device.role.slug() != role_slug {
                return false;
            }
        }
        if let Some(state) = &self.device_state {
            if custom_fields.device_state.as_deref() != Some(state.as_str()) {
                return false;
            }
        }
        true
    }

    fn as_device_filter(&self) -> DeviceFilter {
        DeviceFilter {
            tag: self.tag.clone(),
            role: self.role_slug.clone(),
            site: self.site.clone(),
            region: self.region.clone(),
            location: self.location.clone(),
            rack: self.rack.clone(),
            device_state: self.device_state.clone(),
        }
    }
}

/// Selects the managed set: "a configurable list of Inventory queries...
/// The union of query results defines the managed set" (spec.md §4.2).
#[derive(Debug, Clone, Default)]
pub struct ManagedSetFilter {
    pub queries: Vec<ManagedSetQuery>,
}

impl ManagedSetFilter {
    /// Convenience for the common case of one query.
    pub fn single(query: ManagedSetQuery) -> Self {
        Self { queries: vec![query] }
    }

    /// Runs every configured query against `inventory` and returns the
    /// de-duplicated union of matching devices.
    pub async fn resolve(&self, inventory: &dyn InventoryClient) -> Result<Vec<Device>, ReconcilerError> {
        let mut seen = HashSet::new();
        let mut union = Vec::new();
        for query in &self.queries {
            let devices = inventory.filter_devices(&query.as_device_filter()).await?;
            for device in devices {
                if query.matches(&device, &device.custom_fields) && seen.insert(device.id) {
                    union.push(device);
                }
            }
        }
        Ok(union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::DeviceId;
    use std::collections::BTreeSet;

    fn device(tags: &[&str]) -> Device {
        Device {
            id: DeviceId::new(),
            name: "leaf-01".into(),
            role: core_model::DeviceRole::Leaf,
            primary_ipv4: None,
            primary_ipv6: None,
            tags: tags.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            oob_ip: None,
            serial: None,
            custom_fields: Default::default(),
        }
    }

    #[test]
    fn requires_managed_tag() {
        let query = ManagedSetQuery {
            tag: Some("managed-by-bmc".into()),
            ..Default::default()
        };
        assert!(query.matches(&device(&["managed-by-bmc"]), &CustomFields::default()));
        assert!(!query.matches(&device(&["other"]), &CustomFields::default()));
    }
}
