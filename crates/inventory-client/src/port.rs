use async_trait::async_trait;
use core_model::{Cable, Device, DeviceId, Interface, IpAddress, Prefix};
use serde_json::Value;

use crate::error::InventoryError;

pub type Result<T> = std::result::Result<T, InventoryError>;

/// Matches devices the way `devices.filter(...)` does in the original:
/// `tag` by set membership, `role`/`site`/`region` by slug equality,
/// `location`/`rack` by name (resolved to ids before querying), `state`
/// against the mirrored `device_state` custom field.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub tag: Option<String>,
    pub role: Option<String>,
    pub site: Option<String>,
    pub region: Option<String>,
    pub location: Option<String>,
    pub rack: Option<String>,
    pub device_state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEntryKind {
    Info,
    Success,
    Warning,
    Danger,
}

impl JournalEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// Read/write access to the DCIM graph (spec.md §6's Inventory API).
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn status(&self) -> Result<()>;

    async fn get_device(&self, name: &str) -> Result<Device>;

    async fn filter_devices(&self, filter: &DeviceFilter) -> Result<Vec<Device>>;

    async fn list_interfaces(&self, device_id: DeviceId) -> Result<Vec<Interface>>;

    async fn list_ip_addresses(&self, device_id: DeviceId) -> Result<Vec<IpAddress>>;

    async fn list_cables(&self, device_id: DeviceId) -> Result<Vec<Cable>>;

    async fn list_prefixes(&self, role: Option<&str>) -> Result<Vec<Prefix>>;

    /// Merges `patch` into the device's custom fields (full-value
    /// replacement for nested maps, per `deep_merge`'s rule).
    async fn update_custom_fields(&self, device_id: DeviceId, patch: Value) -> Result<()>;

    async fn create_journal_entry(
        &self,
        device_id: DeviceId,
        kind: JournalEntryKind,
        message: &str,
    ) -> Result<()>;
}
