use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use store::{LockHandle, Store, StoreExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TaskFabricError;
use crate::routes::TaskRoutes;
use crate::task::{Task, TaskState};

pub type Result<T> = std::result::Result<T, TaskFabricError>;

/// Core Task Fabric surface (spec.md §4.1): enqueue, output streaming,
/// per-entity locking, admission lock.
pub struct TaskFabric {
    store: Arc<dyn Store>,
    routes: TaskRoutes,
}

impl TaskFabric {
    pub fn new(store: Arc<dyn Store>, routes: TaskRoutes) -> Self {
        Self { store, routes }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Enqueues durably in the Store and returns immediately. Refuses
    /// while the admission lock is set (spec.md Testable Property:
    /// "Admission lock gates enqueue").
    pub async fn enqueue(&self, func_name: &str, args: Value) -> Result<Uuid> {
        if let Some(info) = self.store.is_admission_locked().await? {
            return Err(TaskFabricError::AdmissionLocked {
                user: info.user,
                reason: info.reason,
            });
        }
        let task_id = Uuid::new_v4();
        let queue = self.routes.route(func_name).to_string();
        let task = Task {
            id: task_id,
            queue: queue.clone(),
            func_name: func_name.to_string(),
            args,
            state: TaskState::Pending,
            parent_id: None,
            created_at: Utc::now(),
            return_code: None,
        };
        self.persist(&task).await?;
        self.store
            .publish(&format!("queue.{queue}"), &task_id.to_string())
            .await?;
        debug!(task_id = %task_id, queue = %queue, func = %func_name, "task enqueued");
        Ok(task_id)
    }

    async fn persist(&self, task: &Task) -> Result<()> {
        let body = serde_json::to_string(task).map_err(store::StoreError::from)?;
        self.store.set(&Task::state_key(task.id), &body, None).await?;
        Ok(())
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<Task> {
        match self.store.get(&Task::state_key(task_id)).await? {
            Some(body) => Ok(serde_json::from_str(&body).map_err(store::StoreError::from)?),
            None => Err(TaskFabricError::NotFound(task_id)),
        }
    }

    pub async fn mark_started(&self, task_id: Uuid) -> Result<()> {
        let mut task = self.get_task(task_id).await?;
        task.state = TaskState::Started;
        self.persist(&task).await
    }

    pub async fn mark_finished(&self, task_id: Uuid, rc: i32) -> Result<()> {
        let mut task = self.get_task(task_id).await?;
        task.state = if rc == 0 { TaskState::Success } else { TaskState::Failure };
        task.return_code = Some(rc);
        self.persist(&task).await?;
        let channel = Task::output_channel(task_id);
        self.store.publish(&channel, &format!("RC: {rc}")).await?;
        self.store.publish(&channel, "QUIT").await?;
        Ok(())
    }

    pub async fn publish_output(&self, task_id: Uuid, line: &str) -> Result<()> {
        self.store.publish(&Task::output_channel(task_id), line).await?;
        Ok(())
    }

    /// Reads the task's channel until `QUIT`, returning every line in
    /// order (spec.md §4.1's `stream`).
    pub async fn stream(&self, task_id: Uuid, idle_timeout: Duration) -> Result<Vec<String>> {
        let mut rx = self.store.subscribe(&Task::output_channel(task_id)).await?;
        let mut lines = Vec::new();
        loop {
            match tokio::time::timeout(idle_timeout, rx.recv()).await {
                Ok(Some(msg)) => {
                    let done = msg.payload == "QUIT";
                    lines.push(msg.payload);
                    if done {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(task_id = %task_id, "stream idle timeout elapsed");
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// Polls task state; returns early if `timeout` elapses in STARTED
    /// with no further progress (spec.md §4.1's `wait`).
    pub async fn wait(
        &self,
        task_id: Uuid,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(TaskState, Option<i32>)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let task = self.get_task(task_id).await?;
            if task.state.is_terminal() {
                return Ok((task.state, task.return_code));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok((task.state, task.return_code));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    pub async fn acquire(
        &self,
        lock_name: &str,
        auto_release: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle> {
        self.store
            .acquire(lock_name, auto_release, wait_timeout)
            .await
            .map_err(|e| match e {
                store::StoreError::LockBusy(name) => TaskFabricError::LockBusy(name),
                other => TaskFabricError::Store(other),
            })
    }

    pub async fn release(&self, handle: &LockHandle) -> Result<()> {
        Ok(self.store.release(handle).await?)
    }

    pub async fn set_admission_lock(&self, user: &str, reason: Option<String>) -> Result<()> {
        Ok(self.store.set_admission_lock(user, reason).await?)
    }

    pub async fn clear_admission_lock(&self) -> Result<()> {
        Ok(self.store.clear_admission_lock().await?)
    }

    pub async fn is_admission_locked(&self) -> Result<Option<store::AdmissionLockInfo>> {
        Ok(self.store.is_admission_locked().await?)
    }
}
