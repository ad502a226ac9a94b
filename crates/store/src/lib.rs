//! Store port: the shared key-value store with expiring locks and pub/sub
//! that every higher layer (Task Fabric, Reconciler, Config Generator)
//! depends on.

pub mod error;
pub mod in_memory;
pub mod lock;
pub mod port;
pub mod redis_store;

pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use lock::{per_entity_lock_name, LockHandle, ADMISSION_LOCK_KEY};
pub use port::{AdmissionLockInfo, ChannelMessage, Store, StoreExt};
pub use redis_store::RedisStore;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn acquire_blocks_concurrent_lock() {
        let store = InMemoryStore::new();
        let h = store
            .acquire("lock_reconciler_sw01", Duration::from_secs(5), Duration::from_millis(50))
            .await
            .unwrap();
        let err = store
            .acquire("lock_reconciler_sw01", Duration::from_secs(5), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LockBusy(_)));
        store.release(&h).await.unwrap();
        store
            .acquire("lock_reconciler_sw01", Duration::from_secs(5), Duration::from_millis(50))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn release_is_compare_and_delete() {
        let store = InMemoryStore::new();
        let h1 = store
            .acquire("lock_x", Duration::from_millis(10), Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let h2 = store
            .acquire("lock_x", Duration::from_secs(5), Duration::from_millis(50))
            .await
            .unwrap();
        store.release(&h1).await.unwrap();
        let err = store
            .acquire("lock_x", Duration::from_secs(5), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LockBusy(_)));
        store.release(&h2).await.unwrap();
    }

    #[tokio::test]
    async fn admission_lock_round_trips() {
        let store = InMemoryStore::new();
        assert!(store.is_admission_locked().await.unwrap().is_none());
        store
            .set_admission_lock("alice", Some("maintenance window".into()))
            .await
            .unwrap();
        let info = store.is_admission_locked().await.unwrap().unwrap();
        assert_eq!(info.user, "alice");
        store.clear_admission_lock().await.unwrap();
        assert!(store.is_admission_locked().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscriber_only_sees_messages_after_subscribe() {
        let store = InMemoryStore::new();
        store.publish("task.1.out", "missed this").await.unwrap();
        let mut rx = store.subscribe("task.1.out").await.unwrap();
        store.publish("task.1.out", "RC: 0").await.unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.payload, "RC: 0");
    }

    #[tokio::test]
    async fn get_set_delete_round_trip() {
        let store = InMemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ttl_expires_key() {
        let store = InMemoryStore::new();
        store.set("k", "v", Some(Duration::from_millis(20))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
