use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use bmc_client::BmcClient;
use core_model::Device;
use inventory_client::{JournalEntryKind, MultiInventory};
use store::{per_entity_lock_name, Store};

use crate::error::ReconcilerError;
use crate::filter::ManagedSetFilter;

const LOCK_AUTO_RELEASE: Duration = Duration::from_secs(600);
const LOCK_WAIT: Duration = Duration::from_secs(0);

#[derive(Debug, Default)]
pub struct MirrorReport {
    pub mirrored: Vec<String>,
    pub unreachable: Vec<String>,
    pub skipped_locked: Vec<String>,
}

/// BMC -> Inventory sweep (spec.md §4.2 scenario 2, "reverse mirror"):
/// reads each managed device's current BMC state and mirrors
/// `provision_state` / `power_state` / `maintenance` back into the
/// device's custom fields on the primary and every reachable secondary.
/// A device whose BMC node cannot be found is reported, not fatal — it
/// likely hasn't been created by the inbound sweep yet. Each device's
/// mirror is serialized under the same per-entity lock the inbound sweep
/// uses (spec.md §8's "Per-entity serialization" property covers both
/// directions of sync).
pub async fn sweep_outbound(
    inventory: &MultiInventory,
    bmc: &dyn BmcClient,
    store: &dyn Store,
    filter: &ManagedSetFilter,
) -> Result<MirrorReport, ReconcilerError> {
    let mut report = MirrorReport::default();

    let devices = filter.resolve(inventory.primary().as_ref()).await?;

    for device in devices {
        match mirror_one(inventory, bmc, store, &device).await {
            Ok(MirrorOutcome::Mirrored) => report.mirrored.push(device.name.clone()),
            Ok(MirrorOutcome::Unreachable) => report.unreachable.push(device.name.clone()),
            Ok(MirrorOutcome::Skipped) => report.skipped_locked.push(device.name.clone()),
            Err(e) => {
                warn!(device = %device.name, error = %e, "outbound mirror failed");
                report.unreachable.push(device.name.clone());
            }
        }
    }

    Ok(report)
}

enum MirrorOutcome {
    Mirrored,
    Unreachable,
    Skipped,
}

async fn mirror_one(
    inventory: &MultiInventory,
    bmc: &dyn BmcClient,
    store: &dyn Store,
    device: &Device,
) -> Result<MirrorOutcome, ReconcilerError> {
    let lock_name = per_entity_lock_name("reconciler", &device.name);
    let handle = match store.acquire(&lock_name, LOCK_AUTO_RELEASE, LOCK_WAIT).await {
        Ok(h) => h,
        Err(e) if e.kind() == store::error::ErrorKind::Conflict => {
            info!(device = %device.name, "per-entity lock busy, skipping this mirror");
            return Ok(MirrorOutcome::Skipped);
        }
        Err(e) => return Err(e.into()),
    };

    let result = mirror_locked(inventory, bmc, device).await;
    if let Err(e) = store.release(&handle).await {
        warn!(device = %device.name, error = %e, "failed to release per-entity lock");
    }
    result
}

async fn mirror_locked(
    inventory: &MultiInventory,
    bmc: &dyn BmcClient,
    device: &Device,
) -> Result<MirrorOutcome, ReconcilerError> {
    let node = match bmc.find_node(&device.name).await {
        Ok(Some(n)) => n,
        Ok(None) => return Ok(MirrorOutcome::Unreachable),
        Err(e) => {
            warn!(device = %device.name, error = %e, "bmc unreachable during outbound mirror");
            return Ok(MirrorOutcome::Unreachable);
        }
    };

    let patch = json!({
        "provision_state": node.provision_state.as_str(),
        "power_state": node.power_state.as_str(),
        "maintenance": node.maintenance,
        "ironic_state": node.provision_state.as_str(),
    });

    inventory
        .mirror_custom_fields(device.id, &device.name, patch)
        .await;

    if node.provision_state.as_str() == "deploy failed" || node.provision_state.as_str() == "error" {
        inventory
            .mirror_journal_entry(
                device.id,
                &device.name,
                JournalEntryKind::Danger,
                &format!("bmc reports provision state {}", node.provision_state.as_str()),
            )
            .await;
    }

    Ok(MirrorOutcome::Mirrored)
}
