//! BMC notification consumer loop (spec.md §4.2's event-driven path).
//!
//! The original subscribes directly to the `ironic` AMQP exchange. No
//! crate in this workspace's dependency stack speaks AMQP, so the broker
//! bridge is treated as out of scope the same way the HTTP/WebSocket
//! façade is (§1's Non-goals): whatever process terminates the AMQP
//! subscription is expected to republish each envelope verbatim onto the
//! Store's `bmc.notifications` pub/sub channel, which this loop consumes
//! through the same `Store::subscribe` primitive the queue workers use.
//! At-most-once processing is fine because `handle_notification` is
//! idempotent (spec.md §4.2 supplement).

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;
use tracing::{error, warn};

use bmc_client::NotificationEnvelope;
use inventory_client::MultiInventory;
use store::Store;
use task_fabric::TaskFabric;

pub const NOTIFICATION_CHANNEL: &str = "bmc.notifications";

pub async fn run(
    store: Arc<dyn Store>,
    inventory: Arc<MultiInventory>,
    fabric: Arc<TaskFabric>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut rx = match store.subscribe(NOTIFICATION_CHANNEL).await {
        Ok(rx) => rx,
        Err(e) => {
            error!(error = %e, "failed to subscribe to bmc notification channel");
            return;
        }
    };

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                handle_one(&inventory, &fabric, &msg.payload).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn handle_one(inventory: &MultiInventory, fabric: &TaskFabric, payload: &str) {
    let envelope: NotificationEnvelope = match serde_json::from_str(payload) {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "dropping malformed bmc notification envelope");
            return;
        }
    };

    let follow_up = match reconciler::notifications::handle_notification(inventory, &envelope).await {
        Ok(follow_up) => follow_up,
        Err(e) => {
            warn!(event_type = %envelope.event_type, error = %e, "failed to apply bmc notification");
            return;
        }
    };

    let Some(func_name) = follow_up else { return };
    let device_name = envelope.field_str("name").unwrap_or_default().to_string();
    if let Err(e) = fabric.enqueue(func_name, json!({ "device": device_name })).await {
        warn!(func = func_name, error = %e, "failed to enqueue notification follow-up task");
    }
}
