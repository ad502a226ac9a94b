//! Named task-function registry: the Rust analogue of the original's
//! Celery `@app.task`-decorated functions, wired to live ports and handed
//! to `task_fabric::QueueWorker` (spec.md §4.1 supplement).

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use bmc_client::BmcClient;
use config_generator::{self, hwsku, publish, ExportIdentifier, GenerateInput, PublishOptions};
use inventory_client::MultiInventory;
use reconciler::{sweep_inbound, sweep_outbound, ManagedSetFilter, ManagedSetQuery};
use store::Store;
use task_fabric::{TaskFn, TaskRegistry};
use vault::Vault;

use crate::config::OrchestratorConfig;
use crate::snapshot::build_snapshot;

/// Everything a task body needs, Arc-wrapped once at startup and cloned
/// per closure (mirrors the teacher's `CoreServiceImpl`-via-`Arc<dyn ...>`
/// wiring in `sem_os_server::main`).
pub struct TaskDeps {
    pub inventory: Arc<MultiInventory>,
    pub bmc: Arc<dyn BmcClient>,
    pub store: Arc<dyn Store>,
    pub vault: Arc<dyn Vault>,
    pub config: OrchestratorConfig,
}

pub fn build_registry(deps: Arc<TaskDeps>) -> TaskRegistry {
    let mut registry = TaskRegistry::new();

    registry.register("conductor.sync_sonic", sync_sonic_fn(deps.clone()));
    registry.register("reconciler.sweep_inbound", sweep_inbound_fn(deps.clone()));
    registry.register("reconciler.sweep_outbound", sweep_outbound_fn(deps.clone()));
    registry.register(
        "reconciler.sync_netbox_from_ironic",
        sync_netbox_from_ironic_fn(deps),
    );

    registry
}

fn sync_sonic_fn(deps: Arc<TaskDeps>) -> TaskFn {
    Arc::new(move |_args: Value| {
        let deps = deps.clone();
        Box::pin(async move {
            match run_sync_sonic(&deps).await {
                Ok(generated) => {
                    info!(devices = generated, "sonic config sync complete");
                    0
                }
                Err(e) => {
                    warn!(error = %e, "sonic config sync failed");
                    1
                }
            }
        })
    })
}

async fn run_sync_sonic(deps: &TaskDeps) -> anyhow::Result<usize> {
    let snapshot = build_snapshot(deps.inventory.primary().as_ref()).await?;

    let switch_devices: Vec<&core_model::Device> =
        snapshot.devices.values().filter(|d| d.role.is_switch_family()).collect();
    let device_as_mapping = config_generator::bgp::compute_spine_as_mapping(&switch_devices, &snapshot);
    let sweep_cache = config_generator::SonicSweepCache::build(&snapshot);

    let publish_options = PublishOptions {
        export_dir: &deps.config.sonic_export_dir,
        prefix: &deps.config.sonic_export_prefix,
        suffix: &deps.config.sonic_export_suffix,
        identifier: ExportIdentifier::Hostname,
    };

    let mut generated = 0usize;
    for device in switch_devices.iter().copied() {
        let Some(hwsku_name) = device.custom_fields.hwsku() else {
            continue;
        };
        let port_config = match hwsku::load_port_config(&deps.config.sonic_port_config_dir, &hwsku_name) {
            Ok(table) => table,
            Err(e) => {
                warn!(device = %device.name, hwsku = %hwsku_name, error = %e, "skipping device, could not load port config");
                continue;
            }
        };

        let input = GenerateInput {
            device,
            hwsku: &hwsku_name,
            port_config: &port_config,
            snapshot: &snapshot,
            sweep_cache: &sweep_cache,
            device_as_mapping: &device_as_mapping,
        };
        let cfg = match config_generator::generate(&input) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(device = %device.name, error = %e, "config generation failed");
                continue;
            }
        };

        if let Err(e) = publish(device, &cfg, deps.inventory.primary().as_ref(), &publish_options).await {
            warn!(device = %device.name, error = %e, "config publish failed");
            continue;
        }
        generated += 1;
    }

    Ok(generated)
}

fn sweep_inbound_fn(deps: Arc<TaskDeps>) -> TaskFn {
    Arc::new(move |_args: Value| {
        let deps = deps.clone();
        Box::pin(async move {
            let filter = ManagedSetFilter::single(ManagedSetQuery {
                tag: Some(deps.config.managed_set_tag.clone()),
                ..Default::default()
            });
            match sweep_inbound(
                deps.inventory.primary().as_ref(),
                deps.bmc.as_ref(),
                deps.store.as_ref(),
                deps.vault.as_ref(),
                &filter,
                &deps.config.base_ironic_parameters,
            )
            .await
            {
                Ok(report) => {
                    info!(
                        created = report.created.len(),
                        updated = report.updated.len(),
                        deleted = report.deleted.len(),
                        failed = report.failed.len(),
                        "inbound sweep complete"
                    );
                    if report.failed.is_empty() { 0 } else { 1 }
                }
                Err(e) => {
                    warn!(error = %e, "inbound sweep failed");
                    1
                }
            }
        })
    })
}

fn sweep_outbound_fn(deps: Arc<TaskDeps>) -> TaskFn {
    Arc::new(move |_args: Value| {
        let deps = deps.clone();
        Box::pin(async move {
            let filter = ManagedSetFilter::single(ManagedSetQuery {
                tag: Some(deps.config.managed_set_tag.clone()),
                ..Default::default()
            });
            match sweep_outbound(&deps.inventory, deps.bmc.as_ref(), deps.store.as_ref(), &filter).await {
                Ok(report) => {
                    info!(
                        mirrored = report.mirrored.len(),
                        unreachable = report.unreachable.len(),
                        "outbound sweep complete"
                    );
                    0
                }
                Err(e) => {
                    warn!(error = %e, "outbound sweep failed");
                    1
                }
            }
        })
    })
}

/// Follow-up task enqueued by `reconciler::notifications::handle_notification`
/// on a provision-set completion: a full outbound sweep would also catch
/// this, but a dedicated single-device mirror keeps the reaction to one
/// notification from waiting behind the whole managed set.
fn sync_netbox_from_ironic_fn(deps: Arc<TaskDeps>) -> TaskFn {
    Arc::new(move |args: Value| {
        let deps = deps.clone();
        Box::pin(async move {
            let Some(name) = args.get("device").and_then(Value::as_str).map(str::to_string) else {
                warn!("reconciler.sync_netbox_from_ironic invoked without a device name");
                return 1;
            };
            match mirror_one_device(&deps, &name).await {
                Ok(()) => 0,
                Err(e) => {
                    warn!(device = %name, error = %e, "single-device mirror failed");
                    1
                }
            }
        })
    })
}

async fn mirror_one_device(deps: &TaskDeps, device_name: &str) -> anyhow::Result<()> {
    let device = deps.inventory.primary().get_device(device_name).await?;
    let Some(node) = deps.bmc.find_node(device_name).await? else {
        warn!(device = device_name, "bmc node not found during single-device mirror");
        return Ok(());
    };
    deps.inventory
        .mirror_custom_fields(
            device.id,
            device_name,
            json!({
                "provision_state": node.provision_state.as_str(),
                "power_state": node.power_state.as_str(),
                "maintenance": node.maintenance,
                "ironic_state": node.provision_state.as_str(),
            }),
        )
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use core_model::node::{DriverKind, Node, PowerState, ProvisionState};
    use core_model::{Cable, Device, DeviceId, DeviceRole, Interface, IpAddress, Prefix};
    use inventory_client::{DeviceFilter, InventoryClient, InventoryError, JournalEntryKind};
    use store::InMemoryStore;

    use super::*;

    struct FakeInventory {
        devices: Mutex<HashMap<DeviceId, Device>>,
        patches: Mutex<Vec<(DeviceId, Value)>>,
    }

    impl FakeInventory {
        fn new(devices: Vec<Device>) -> Self {
            Self {
                devices: Mutex::new(devices.into_iter().map(|d| (d.id, d)).collect()),
                patches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl InventoryClient for FakeInventory {
        async fn status(&self) -> inventory_client::port::Result<()> {
            Ok(())
        }

        async fn get_device(&self, name: &str) -> inventory_client::port::Result<Device> {
            self.devices
                .lock()
                .unwrap()
                .values()
                .find(|d| d.name == name)
                .cloned()
                .ok_or_else(|| InventoryError::NotFound(name.to_string()))
        }

        async fn filter_devices(&self, _filter: &DeviceFilter) -> inventory_client::port::Result<Vec<Device>> {
            Ok(self.devices.lock().unwrap().values().cloned().collect())
        }

        async fn list_interfaces(&self, _device_id: DeviceId) -> inventory_client::port::Result<Vec<Interface>> {
            Ok(Vec::new())
        }

        async fn list_ip_addresses(&self, _device_id: DeviceId) -> inventory_client::port::Result<Vec<IpAddress>> {
            Ok(Vec::new())
        }

        async fn list_cables(&self, _device_id: DeviceId) -> inventory_client::port::Result<Vec<Cable>> {
            Ok(Vec::new())
        }

        async fn list_prefixes(&self, _role: Option<&str>) -> inventory_client::port::Result<Vec<Prefix>> {
            Ok(Vec::new())
        }

        async fn update_custom_fields(&self, device_id: DeviceId, patch: Value) -> inventory_client::port::Result<()> {
            self.patches.lock().unwrap().push((device_id, patch));
            Ok(())
        }

        async fn create_journal_entry(
            &self,
            _device_id: DeviceId,
            _kind: JournalEntryKind,
            _message: &str,
        ) -> inventory_client::port::Result<()> {
            Ok(())
        }
    }

    struct FakeBmc {
        node: Node,
    }

    #[async_trait]
    impl BmcClient for FakeBmc {
        async fn find_node(&self, _name: &str) -> bmc_client::port::Result<Option<Node>> {
            Ok(Some(self.node.clone()))
        }

        async fn list_nodes(&self) -> bmc_client::port::Result<Vec<Node>> {
            Ok(vec![self.node.clone()])
        }

        async fn create_node(&self, _input: bmc_client::CreateNodeInput) -> bmc_client::port::Result<Node> {
            unimplemented!("not exercised by this test")
        }

        async fn update_node(&self, _uuid: &str, _input: bmc_client::UpdateNodeInput) -> bmc_client::port::Result<Node> {
            unimplemented!("not exercised by this test")
        }

        async fn delete_node(&self, _uuid: &str) -> bmc_client::port::Result<()> {
            unimplemented!("not exercised by this test")
        }

        async fn validate_node(&self, _uuid: &str) -> bmc_client::port::Result<bmc_client::NodeValidation> {
            Ok(bmc_client::NodeValidation {
                management: bmc_client::InterfaceValidation::Ok,
                boot: bmc_client::InterfaceValidation::Ok,
            })
        }

        async fn set_provision_state(
            &self,
            _uuid: &str,
            _verb: bmc_client::ProvisionVerb,
            _config_drive: Option<Value>,
        ) -> bmc_client::port::Result<()> {
            unimplemented!("not exercised by this test")
        }

        async fn wait_for_provision_state(
            &self,
            _uuid: &str,
            _target: ProvisionState,
            _timeout: std::time::Duration,
        ) -> bmc_client::port::Result<ProvisionState> {
            unimplemented!("not exercised by this test")
        }

        async fn set_power_state(&self, _uuid: &str, _on: bool) -> bmc_client::port::Result<()> {
            unimplemented!("not exercised by this test")
        }

        async fn list_ports(&self, _node_uuid: &str) -> bmc_client::port::Result<Vec<core_model::node::NodePort>> {
            Ok(Vec::new())
        }

        async fn create_port(&self, _node_uuid: &str, _mac_address: &str) -> bmc_client::port::Result<core_model::node::NodePort> {
            unimplemented!("not exercised by this test")
        }

        async fn delete_port(&self, _port_uuid: &str) -> bmc_client::port::Result<()> {
            unimplemented!("not exercised by this test")
        }
    }

    fn device(name: &str) -> Device {
        Device {
            id: DeviceId::new(),
            name: name.into(),
            role: DeviceRole::Leaf,
            primary_ipv4: None,
            primary_ipv6: None,
            tags: BTreeSet::new(),
            oob_ip: None,
            serial: None,
            custom_fields: Default::default(),
        }
    }

    fn deps_with(inventory: FakeInventory, bmc: FakeBmc) -> TaskDeps {
        let multi = MultiInventory::new(Arc::new(inventory));
        TaskDeps {
            inventory: Arc::new(multi),
            bmc: Arc::new(bmc),
            store: Arc::new(InMemoryStore::new()),
            vault: Arc::new(vault::NoopVault),
            config: OrchestratorConfig::from_env(),
        }
    }

    #[tokio::test]
    async fn mirror_one_device_patches_provision_and_power_state() {
        let leaf = device("leaf-01");
        let node = Node {
            uuid: Some("abc-123".into()),
            name: "leaf-01".into(),
            provision_state: ProvisionState::Active,
            power_state: PowerState::PowerOn,
            maintenance: false,
            driver: DriverKind::Redfish,
            driver_info: Default::default(),
            instance_info: Default::default(),
            instance_uuid: None,
            extra: Default::default(),
            resource_class: None,
        };
        let deps = deps_with(FakeInventory::new(vec![leaf]), FakeBmc { node });

        mirror_one_device(&deps, "leaf-01").await.unwrap();
    }

    struct NoNodeBmc;

    #[async_trait]
    impl BmcClient for NoNodeBmc {
        async fn find_node(&self, _name: &str) -> bmc_client::port::Result<Option<Node>> {
            Ok(None)
        }
        async fn list_nodes(&self) -> bmc_client::port::Result<Vec<Node>> {
            Ok(Vec::new())
        }
        async fn create_node(&self, _input: bmc_client::CreateNodeInput) -> bmc_client::port::Result<Node> {
            unimplemented!()
        }
        async fn update_node(&self, _uuid: &str, _input: bmc_client::UpdateNodeInput) -> bmc_client::port::Result<Node> {
            unimplemented!()
        }
        async fn delete_node(&self, _uuid: &str) -> bmc_client::port::Result<()> {
            unimplemented!()
        }
        async fn validate_node(&self, _uuid: &str) -> bmc_client::port::Result<bmc_client::NodeValidation> {
            Ok(bmc_client::NodeValidation {
                management: bmc_client::InterfaceValidation::Ok,
                boot: bmc_client::InterfaceValidation::Ok,
            })
        }
        async fn set_provision_state(
            &self,
            _uuid: &str,
            _verb: bmc_client::ProvisionVerb,
            _config_drive: Option<Value>,
        ) -> bmc_client::port::Result<()> {
            unimplemented!()
        }
        async fn wait_for_provision_state(
            &self,
            _uuid: &str,
            _target: ProvisionState,
            _timeout: std::time::Duration,
        ) -> bmc_client::port::Result<ProvisionState> {
            unimplemented!()
        }
        async fn set_power_state(&self, _uuid: &str, _on: bool) -> bmc_client::port::Result<()> {
            unimplemented!()
        }
        async fn list_ports(&self, _node_uuid: &str) -> bmc_client::port::Result<Vec<core_model::node::NodePort>> {
            Ok(Vec::new())
        }
        async fn create_port(&self, _node_uuid: &str, _mac_address: &str) -> bmc_client::port::Result<core_model::node::NodePort> {
            unimplemented!()
        }
        async fn delete_port(&self, _port_uuid: &str) -> bmc_client::port::Result<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn mirror_one_device_is_a_noop_when_bmc_has_no_matching_node() {
        let multi = MultiInventory::new(Arc::new(FakeInventory::new(vec![device("leaf-02")])));
        let deps = TaskDeps {
            inventory: Arc::new(multi),
            bmc: Arc::new(NoNodeBmc),
            store: Arc::new(InMemoryStore::new()),
            vault: Arc::new(vault::NoopVault),
            config: OrchestratorConfig::from_env(),
        };

        let result = mirror_one_device(&deps, "leaf-02").await;
        assert!(result.is_ok());
    }
}
