//! Orchestrator worker process: brings up the Store, Inventory/BMC
//! clients, Vault, and Task Fabric, then runs the queue workers, the
//! periodic scheduler, and the BMC notification listener side by side
//! until asked to shut down (spec.md §5). No HTTP surface is exposed
//! here; the operator CLI and façade are out of scope (spec.md §1).

mod config;
mod notify;
mod snapshot;
mod tasks;

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bmc_client::{BmcClient, HttpBmcClient};
use config::{BmcClientConfig, InventoryClientConfig, OrchestratorConfig, StoreConfig, PERIODIC_EXPIRES};
use inventory_client::{HttpInventoryClient, InventoryClient, InventoryReplica, MultiInventory, ReplicaFilter};
use store::{InMemoryStore, RedisStore, Store};
use task_fabric::{run_scheduler, PeriodicTask, QueueConcurrency, QueueWorker, TaskFabric, TaskRoutes};
use vault::{AesGcmVault, NoopVault, Vault};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orchestratord=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting orchestratord");

    let store: Arc<dyn Store> = build_store(&StoreConfig::from_env()).await?;
    let inventory = Arc::new(build_inventory(&InventoryClientConfig::from_env()));
    let bmc: Arc<dyn BmcClient> = Arc::new(build_bmc(&BmcClientConfig::from_env()));
    let config = OrchestratorConfig::from_env();
    let vault: Arc<dyn Vault> = match &config.vault_key {
        Some(key) => Arc::new(AesGcmVault::new(key)),
        None => Arc::new(NoopVault),
    };

    let routes = TaskRoutes::standard();
    let concurrency = QueueConcurrency::new()
        .with_limit("conductor", config.conductor_concurrency)
        .with_limit("reconciler", config.reconciler_concurrency)
        .with_limit("ansible", config.ansible_concurrency)
        .with_limit("default", config.default_concurrency);

    let fabric = Arc::new(TaskFabric::new(store.clone(), routes));

    let sync_sonic_interval = config.sync_sonic_interval;
    let sweep_inbound_interval = config.sweep_inbound_interval;
    let sweep_outbound_interval = config.sweep_outbound_interval;

    let deps = Arc::new(tasks::TaskDeps {
        inventory: inventory.clone(),
        bmc: bmc.clone(),
        store: store.clone(),
        vault,
        config,
    });
    let registry = Arc::new(tasks::build_registry(deps));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut workers = Vec::new();
    for queue in ["conductor", "reconciler", "ansible", "default"] {
        let worker = QueueWorker::new(queue, fabric.clone(), registry.clone(), &concurrency);
        let rx = shutdown_rx.clone();
        workers.push(tokio::spawn(async move { worker.run(rx).await }));
    }

    let scheduler_fabric = fabric.clone();
    let scheduler_rx = shutdown_rx.clone();
    let scheduler = tokio::spawn(async move {
        run_scheduler(
            scheduler_fabric,
            vec![
                PeriodicTask {
                    func_name: "conductor.sync_sonic".to_string(),
                    args: serde_json::json!({}),
                    every: sync_sonic_interval,
                    expires: PERIODIC_EXPIRES,
                },
                PeriodicTask {
                    func_name: "reconciler.sweep_inbound".to_string(),
                    args: serde_json::json!({}),
                    every: sweep_inbound_interval,
                    expires: PERIODIC_EXPIRES,
                },
                PeriodicTask {
                    func_name: "reconciler.sweep_outbound".to_string(),
                    args: serde_json::json!({}),
                    every: sweep_outbound_interval,
                    expires: PERIODIC_EXPIRES,
                },
            ],
            scheduler_rx,
        )
        .await
    });

    let notify_rx = shutdown_rx.clone();
    let notify_task = tokio::spawn(notify::run(store.clone(), inventory.clone(), fabric.clone(), notify_rx));

    tracing::info!("orchestratord ready, queue workers and scheduler running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    for worker in workers {
        let _ = worker.await;
    }
    let _ = scheduler.await;
    let _ = notify_task.await;

    Ok(())
}

async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn Store>> {
    match &config.redis_url {
        Some(url) => {
            tracing::info!("connecting to redis store");
            Ok(Arc::new(RedisStore::connect(url).await?))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using an in-memory store (single-process only)");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

fn build_inventory(config: &InventoryClientConfig) -> MultiInventory {
    let primary: Arc<dyn InventoryClient> =
        Arc::new(HttpInventoryClient::new(config.base_url.clone(), config.token.clone()));
    let mut multi = MultiInventory::new(primary);
    if let Some(secondary) = &config.secondary {
        let client: Arc<dyn InventoryClient> =
            Arc::new(HttpInventoryClient::new(secondary.base_url.clone(), secondary.token.clone()));
        let meta = InventoryReplica {
            name: secondary.name.clone(),
            site: secondary.site.clone(),
            base_url: secondary.base_url.clone(),
            token: secondary.token.clone(),
        };
        if ReplicaFilter::default().matches(&meta) {
            multi = multi.with_secondary(meta, client);
        }
    }
    multi
}

fn build_bmc(config: &BmcClientConfig) -> HttpBmcClient {
    HttpBmcClient::new(config.base_url.clone(), config.token.clone())
}
