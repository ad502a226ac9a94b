use serde_json::{json, Value};
use tracing::{info, warn};

use bmc_client::{BmcEventType, NotificationEnvelope};
use inventory_client::{JournalEntryKind, MultiInventory};

use crate::error::ReconcilerError;

/// Name of the follow-up task the caller should enqueue on the Task
/// Fabric after handling a notification, if any (spec.md §4.2: "a single
/// event MUST NOT directly trigger a configuration deployment; it may
/// only update Inventory state and enqueue further reconciler work").
pub type FollowUpTask = &'static str;

/// Applies one BMC notification to Inventory custom fields. Idempotent:
/// replaying the same event re-applies the same patch. Never calls back
/// into the BMC and never triggers a deploy directly.
pub async fn handle_notification(
    inventory: &MultiInventory,
    envelope: &NotificationEnvelope,
) -> Result<Option<FollowUpTask>, ReconcilerError> {
    let Some(kind) = envelope.kind() else {
        return Ok(None);
    };
    let Some(name) = envelope.field_str("name") else {
        warn!(event_type = %envelope.event_type, "notification payload carries no node name, dropping");
        return Ok(None);
    };

    let device = inventory.primary().get_device(name).await?;

    let (patch, follow_up): (Option<Value>, Option<FollowUpTask>) = match kind {
        BmcEventType::PowerSetEnd | BmcEventType::PowerStateCorrectedSuccess => {
            let power_state = envelope.field_str("power_state").unwrap_or("unknown");
            (Some(json!({ "power_state": power_state })), None)
        }
        BmcEventType::MaintenanceSetEnd => {
            let maintenance = envelope
                .payload
                .data
                .get("maintenance")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            (Some(json!({ "maintenance": maintenance })), None)
        }
        BmcEventType::ProvisionSetStart => {
            let provision_state = envelope.field_str("provision_state").unwrap_or("unknown");
            (Some(json!({ "provision_state": provision_state, "ironic_state": provision_state })), None)
        }
        BmcEventType::ProvisionSetSuccess | BmcEventType::ProvisionSetEnd => {
            let provision_state = envelope.field_str("provision_state").unwrap_or("unknown");
            (
                Some(json!({ "provision_state": provision_state, "ironic_state": provision_state })),
                Some("reconciler.sync_netbox_from_ironic"),
            )
        }
        BmcEventType::PortCreateEnd | BmcEventType::PortUpdateEnd => {
            inventory
                .mirror_journal_entry(device.id, name, JournalEntryKind::Info, "bmc port topology changed")
                .await;
            (None, None)
        }
        BmcEventType::NodeDeleteEnd => (Some(json!({ "device_state": "deleted" })), None),
    };

    if let Some(patch) = patch {
        inventory.mirror_custom_fields(device.id, name, patch).await;
        info!(device = name, event_type = %envelope.event_type, "applied bmc notification to inventory");
    }

    Ok(follow_up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_event_type_yields_no_follow_up() {
        let envelope = NotificationEnvelope {
            event_type: "baremetal.node.something_else".to_string(),
            payload: bmc_client::NotificationPayload { data: json!({}) },
        };
        assert!(envelope.kind().is_none());
    }
}
