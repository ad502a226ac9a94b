//! Distributed task queue: named queues routed from function name,
//! per-task output streaming, per-entity locking via the Store, and the
//! process-wide admission lock.

pub mod error;
pub mod fabric;
pub mod routes;
pub mod task;
pub mod worker;

pub use error::TaskFabricError;
pub use fabric::TaskFabric;
pub use routes::{QueueConcurrency, TaskRoutes};
pub use task::{Task, TaskState};
pub use worker::{run_scheduler, PeriodicTask, QueueWorker, TaskFn, TaskFuture, TaskRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use store::InMemoryStore;

    fn fabric() -> Arc<TaskFabric> {
        Arc::new(TaskFabric::new(Arc::new(InMemoryStore::new()), TaskRoutes::standard()))
    }

    #[tokio::test]
    async fn enqueue_routes_by_prefix() {
        let f = fabric();
        let id = f.enqueue("conductor.sync_sonic", serde_json::json!({})).await.unwrap();
        let task = f.get_task(id).await.unwrap();
        assert_eq!(task.queue, "conductor");
        assert_eq!(task.state, TaskState::Pending);
    }

    #[tokio::test]
    async fn admission_lock_blocks_enqueue() {
        let f = fabric();
        f.set_admission_lock("alice", None).await.unwrap();
        let err = f.enqueue("conductor.sync_sonic", serde_json::json!({})).await;
        assert!(matches!(err, Err(TaskFabricError::AdmissionLocked { .. })));
        f.clear_admission_lock().await.unwrap();
        assert!(f.enqueue("conductor.sync_sonic", serde_json::json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn stream_reads_until_quit() {
        let f = fabric();
        let id = f.enqueue("conductor.sync_sonic", serde_json::json!({})).await.unwrap();
        let fabric_clone = f.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fabric_clone.publish_output(id, "hello").await.unwrap();
            fabric_clone.mark_finished(id, 0).await.unwrap();
        });
        let lines = f.stream(id, Duration::from_secs(1)).await.unwrap();
        assert_eq!(lines, vec!["hello", "RC: 0", "QUIT"]);
    }

    #[tokio::test]
    async fn wait_reports_terminal_state() {
        let f = fabric();
        let id = f.enqueue("conductor.sync_sonic", serde_json::json!({})).await.unwrap();
        f.mark_started(id).await.unwrap();
        f.mark_finished(id, 2).await.unwrap();
        let (state, rc) = f.wait(id, Duration::from_millis(100), Duration::from_millis(10)).await.unwrap();
        assert_eq!(state, TaskState::Failure);
        assert_eq!(rc, Some(2));
    }
}
