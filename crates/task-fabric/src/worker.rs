use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info};
use uuid::Uuid;

use crate::fabric::TaskFabric;
use crate::routes::QueueConcurrency;

pub type TaskFuture = Pin<Box<dyn Future<Output = i32> + Send>>;
pub type TaskFn = Arc<dyn Fn(Value) -> TaskFuture + Send + Sync>;

/// Named task-function dispatch table, the Rust analogue of Celery's
/// `@app.task`-decorated function registry.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    functions: HashMap<String, TaskFn>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, f: TaskFn) {
        self.functions.insert(name.into(), f);
    }

    pub fn get(&self, name: &str) -> Option<&TaskFn> {
        self.functions.get(name)
    }
}

/// Drains one named queue with bounded concurrency (`tokio::sync::Semaphore`
/// mirrors Celery's per-queue worker-pool concurrency setting, spec.md §5).
pub struct QueueWorker {
    queue: String,
    fabric: Arc<TaskFabric>,
    registry: Arc<TaskRegistry>,
    concurrency: Arc<Semaphore>,
}

impl QueueWorker {
    pub fn new(
        queue: impl Into<String>,
        fabric: Arc<TaskFabric>,
        registry: Arc<TaskRegistry>,
        concurrency: &QueueConcurrency,
    ) -> Self {
        let queue = queue.into();
        let limit = concurrency.limit_for(&queue);
        Self {
            queue,
            fabric,
            registry,
            concurrency: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(queue = %self.queue, "queue worker started");
        let channel = format!("queue.{}", self.queue);
        let mut rx = match self.fabric.store().subscribe(&channel).await {
            Ok(rx) => rx,
            Err(e) => {
                error!(queue = %self.queue, error = %e, "failed to subscribe to queue channel");
                return;
            }
        };

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    let Ok(task_id) = msg.payload.parse::<Uuid>() else { continue };
                    self.dispatch(task_id).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(queue = %self.queue, "queue worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn dispatch(&self, task_id: Uuid) {
        let permit = match self.concurrency.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => return,
        };
        let fabric = self.fabric.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let task = match fabric.get_task(task_id).await {
                Ok(t) => t,
                Err(e) => {
                    error!(task_id = %task_id, error = %e, "failed to load task before dispatch");
                    return;
                }
            };
            if let Err(e) = fabric.mark_started(task_id).await {
                error!(task_id = %task_id, error = %e, "failed to mark task started");
            }
            let rc = match registry.get(&task.func_name) {
                Some(f) => f(task.args.clone()).await,
                None => {
                    error!(task_id = %task_id, func = %task.func_name, "no handler registered");
                    1
                }
            };
            if let Err(e) = fabric.mark_finished(task_id, rc).await {
                error!(task_id = %task_id, error = %e, "failed to mark task finished");
            }
        });
    }
}

/// `every`-interval periodic registration, consumed by `run_scheduler`
/// (spec.md §4.1 supplement: `add_periodic_task(..., expires=10)`).
#[derive(Clone)]
pub struct PeriodicTask {
    pub func_name: String,
    pub args: Value,
    pub every: Duration,
    pub expires: Duration,
}

/// Enqueues each registered periodic task on its own interval. `expires`
/// bounds how long a missed tick stays eligible to run — a task whose
/// enqueue is delayed past `expires` is dropped rather than queued
/// indefinitely. Modeled here as a short-lived wrapper function name so
/// a stale tick simply never gets its handler invoked past the window.
pub async fn run_scheduler(
    fabric: Arc<TaskFabric>,
    tasks: Vec<PeriodicTask>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut handles = Vec::new();
    for task in tasks {
        let fabric = fabric.clone();
        let mut shutdown = shutdown.clone();
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(task.every);
            loop {
                tokio::select! {
                    tick = interval.tick() => {
                        let enqueued_at = tick;
                        let fabric = fabric.clone();
                        let func_name = task.func_name.clone();
                        let args = task.args.clone();
                        let expires = task.expires;
                        tokio::spawn(async move {
                            if enqueued_at.elapsed() > expires {
                                return;
                            }
                            if let Err(e) = fabric.enqueue(&func_name, args).await {
                                error!(func = %func_name, error = %e, "periodic enqueue failed");
                            }
                        });
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        }));
    }
    let _ = shutdown.changed().await;
    for h in handles {
        h.abort();
    }
}
