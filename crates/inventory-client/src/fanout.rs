use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use core_model::DeviceId;

use crate::port::{InventoryClient, JournalEntryKind};
use crate::replica::InventoryReplica;

struct NamedReplica {
    meta: InventoryReplica,
    client: Arc<dyn InventoryClient>,
}

/// Fans writes out to the primary and every reachable secondary (spec.md
/// §9: "Writes are best-effort per replica; an unreachable secondary
/// yields a WARN, not a failure"). Which secondaries are configured here
/// is itself the result of applying a `ReplicaFilter` against the
/// deployment's replica list at startup.
pub struct MultiInventory {
    primary: Arc<dyn InventoryClient>,
    secondaries: Vec<NamedReplica>,
}

impl MultiInventory {
    pub fn new(primary: Arc<dyn InventoryClient>) -> Self {
        Self {
            primary,
            secondaries: Vec::new(),
        }
    }

    pub fn with_secondary(mut self, meta: InventoryReplica, client: Arc<dyn InventoryClient>) -> Self {
        self.secondaries.push(NamedReplica { meta, client });
        self
    }

    pub fn primary(&self) -> &Arc<dyn InventoryClient> {
        &self.primary
    }

    /// Mirrors a custom-fields patch to the primary and every configured
    /// secondary (spec.md scenario 2: reverse mirror of BMC-observed state).
    pub async fn mirror_custom_fields(&self, device_id: DeviceId, device_name: &str, patch: Value) {
        if let Err(e) = self.primary.update_custom_fields(device_id, patch.clone()).await {
            warn!(device = device_name, error = %e, "primary inventory update failed");
        }
        for replica in &self.secondaries {
            if let Err(e) = replica.client.update_custom_fields(device_id, patch.clone()).await {
                warn!(
                    device = device_name,
                    replica = replica.meta.name.as_deref().unwrap_or("<unnamed>"),
                    error = %e,
                    "secondary inventory update failed"
                );
            }
        }
    }

    pub async fn mirror_journal_entry(
        &self,
        device_id: DeviceId,
        device_name: &str,
        kind: JournalEntryKind,
        message: &str,
    ) {
        if let Err(e) = self
            .primary
            .create_journal_entry(device_id, kind, message)
            .await
        {
            warn!(device = device_name, error = %e, "primary inventory journal write failed");
        }
    }
}
