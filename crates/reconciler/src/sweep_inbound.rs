use std::collections::HashSet;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, warn};

use bmc_client::{BmcClient, CreateNodeInput, InterfaceValidation, UpdateNodeInput};
use core_model::Device;
use inventory_client::InventoryClient;
use store::{per_entity_lock_name, Store};
use vault::Vault;

use crate::error::ReconcilerError;
use crate::filter::ManagedSetFilter;
use crate::node_attrs::prepare_node_attributes;
use crate::state_machine::{self, Validation, ValidationOutcome};
use crate::util::deep_compare;

const LOCK_AUTO_RELEASE: Duration = Duration::from_secs(600);
const LOCK_WAIT: Duration = Duration::from_secs(0);
const VALIDATE_WAIT: Duration = Duration::from_secs(300);

/// Write fields ironic never echoes back, so a diff against them would
/// never converge (ported from the original's `ignore_keys`).
const IGNORED_COMPARE_KEYS: &[&str] = &["redfish_password", "ipmi_password"];

#[derive(Debug, Default)]
pub struct SweepReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
    pub skipped_locked: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Inventory -> BMC sweep (spec.md §4.2): create/update BMC nodes for the
/// managed set, sync ports, advance provision state, and delete BMC nodes
/// that fell out of the managed set when it is safe to do so. Mirrors the
/// original's `sync_ironic`.
pub async fn sweep_inbound(
    inventory: &dyn InventoryClient,
    bmc: &dyn BmcClient,
    store: &dyn Store,
    vault: &dyn Vault,
    filter: &ManagedSetFilter,
    base_ironic_parameters: &Map<String, Value>,
) -> Result<SweepReport, ReconcilerError> {
    let mut report = SweepReport::default();

    let devices: Vec<Device> = filter.resolve(inventory).await?;
    let managed_names: HashSet<String> = devices.iter().map(|d| d.name.clone()).collect();

    for device in &devices {
        match reconcile_one(inventory, bmc, store, vault, device, base_ironic_parameters).await {
            Ok(outcome) => match outcome {
                ReconcileOutcome::Created => report.created.push(device.name.clone()),
                ReconcileOutcome::Updated => report.updated.push(device.name.clone()),
                ReconcileOutcome::Unchanged => report.unchanged.push(device.name.clone()),
                ReconcileOutcome::Skipped => report.skipped_locked.push(device.name.clone()),
            },
            Err(e) => {
                warn!(device = %device.name, error = %e, "inbound reconcile failed");
                report.failed.push((device.name.clone(), e.to_string()));
            }
        }
    }

    for node in bmc.list_nodes().await? {
        if managed_names.contains(&node.name) {
            continue;
        }
        let Some(uuid) = node.uuid.clone() else { continue };
        if !node.provision_state.is_safe_for_deletion() {
            warn!(
                node = %node.name,
                state = node.provision_state.as_str(),
                "cannot remove baremetal node because it is still provisioned"
            );
            report
                .failed
                .push((node.name.clone(), "still provisioned, deletion skipped".to_string()));
            continue;
        }
        if let Err(e) = bmc.delete_node(&uuid).await {
            warn!(node = %node.name, error = %e, "failed to delete orphaned bmc node");
            report.failed.push((node.name.clone(), e.to_string()));
            continue;
        }
        info!(node = %node.name, "deleted bmc node no longer in managed set");
        report.deleted.push(node.name.clone());
    }

    // Per-entity failures are reported, not raised: one bad device must
    // not block reconciliation of the rest of the managed set.
    Ok(report)
}

fn map_validation(outcome: InterfaceValidation) -> Validation {
    match outcome {
        InterfaceValidation::Ok => Validation::Ok,
        InterfaceValidation::Failed => Validation::Failed,
    }
}

enum ReconcileOutcome {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

async fn reconcile_one(
    inventory: &dyn InventoryClient,
    bmc: &dyn BmcClient,
    store: &dyn Store,
    vault: &dyn Vault,
    device: &Device,
    base_ironic_parameters: &Map<String, Value>,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let lock_name = per_entity_lock_name("reconciler", &device.name);
    let handle = match store.acquire(&lock_name, LOCK_AUTO_RELEASE, LOCK_WAIT).await {
        Ok(h) => h,
        Err(e) if e.kind() == store::error::ErrorKind::Conflict => {
            info!(device = %device.name, "per-entity lock busy, skipping this sweep");
            return Ok(ReconcileOutcome::Skipped);
        }
        Err(e) => return Err(e.into()),
    };

    let result = reconcile_locked(inventory, bmc, vault, device, base_ironic_parameters).await;
    if let Err(e) = store.release(&handle).await {
        warn!(device = %device.name, error = %e, "failed to release per-entity lock");
    }
    result
}

async fn reconcile_locked(
    inventory: &dyn InventoryClient,
    bmc: &dyn BmcClient,
    vault: &dyn Vault,
    device: &Device,
    base_ironic_parameters: &Map<String, Value>,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let desired = prepare_node_attributes(device, base_ironic_parameters.clone(), vault);

    let existing = bmc.find_node(&device.name).await?;
    let (uuid, outcome) = match existing {
        None => {
            let driver = desired
                .get("driver")
                .and_then(Value::as_str)
                .and_then(|s| match s {
                    "ipmi" => Some(core_model::node::DriverKind::Ipmi),
                    _ => Some(core_model::node::DriverKind::Redfish),
                })
                .unwrap_or(core_model::node::DriverKind::Redfish);
            let node = bmc
                .create_node(CreateNodeInput {
                    name: device.name.clone(),
                    driver,
                    driver_info: desired.get("driver_info").cloned().unwrap_or(Value::Null),
                    resource_class: device.name.clone(),
                    extra: desired.get("extra").cloned().unwrap_or(Value::Null),
                })
                .await?;
            info!(device = %device.name, "created bmc node");
            (node.uuid.unwrap_or_default(), ReconcileOutcome::Created)
        }
        Some(node) => {
            // Only the fields ironic actually echoes back are compared;
            // `driver` and `resource_class` are set once at create time.
            let mut desired_echoed = Map::new();
            for key in ["driver_info", "instance_info", "extra"] {
                if let Some(v) = desired.get(key) {
                    desired_echoed.insert(key.to_string(), v.clone());
                }
            }
            let actual = serde_json::json!({
                "driver_info": node.driver_info,
                "instance_info": node.instance_info,
                "extra": node.extra,
            });
            let actual_map = actual.as_object().cloned().unwrap_or_default();
            let diff = deep_compare(&desired_echoed, &actual_map, IGNORED_COMPARE_KEYS);
            if diff.is_empty() {
                (node.uuid.unwrap_or_default(), ReconcileOutcome::Unchanged)
            } else {
                let uuid = node.uuid.clone().unwrap_or_default();
                bmc.update_node(
                    &uuid,
                    UpdateNodeInput {
                        driver_info: diff.get("driver_info").cloned(),
                        instance_info: diff.get("instance_info").cloned(),
                        extra: diff.get("extra").cloned(),
                        ..Default::default()
                    },
                )
                .await?;
                info!(device = %device.name, "updated bmc node attributes");
                (uuid, ReconcileOutcome::Updated)
            }
        }
    };

    sync_ports(inventory, bmc, device, &uuid).await?;

    let validation = match bmc.validate_node(&uuid).await {
        Ok(outcome) => ValidationOutcome {
            management: map_validation(outcome.management),
            boot: map_validation(outcome.boot),
        },
        Err(_) => ValidationOutcome { management: Validation::Failed, boot: Validation::Failed },
    };
    if let Some(node) = bmc.find_node(&device.name).await? {
        let _ = state_machine::advance(bmc, &uuid, node.provision_state, validation, VALIDATE_WAIT).await?;
    }

    Ok(outcome)
}

/// Creates/deletes BMC ports to match the device's physical interfaces by
/// MAC address (spec.md §4.2 step 2).
async fn sync_ports(
    inventory: &dyn InventoryClient,
    bmc: &dyn BmcClient,
    device: &Device,
    node_uuid: &str,
) -> Result<(), ReconcilerError> {
    let interfaces = inventory.list_interfaces(device.id).await?;
    let desired_macs: HashSet<String> = interfaces
        .iter()
        .filter(|i| i.enabled && !i.mgmt_only)
        .filter_map(|i| i.mac_address.clone())
        .map(|m| m.to_lowercase())
        .collect();

    let existing_ports = bmc.list_ports(node_uuid).await?;
    let existing_macs: HashSet<String> =
        existing_ports.iter().map(|p| p.address.to_lowercase()).collect();

    for mac in desired_macs.difference(&existing_macs) {
        bmc.create_port(node_uuid, mac).await?;
    }
    for port in &existing_ports {
        if !desired_macs.contains(&port.address.to_lowercase()) {
            if let Some(uuid) = &port.uuid {
                bmc.delete_port(uuid).await?;
            }
        }
    }
    Ok(())
}
