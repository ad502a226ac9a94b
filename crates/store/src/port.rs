use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::lock::LockHandle;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Body of the well-known admission-lock key (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionLockInfo {
    pub locked: bool,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// A message delivered on a subscribed channel.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub channel: String,
    pub payload: String,
}

/// Shared key-value store with expiring locks and pub/sub (spec.md §6:
/// "get, set-with-ttl, delete, publish(channel, message), subscribe(channel)
/// yielding messages, SETNX-with-ttl for locks"). Every method is a single
/// blocking-style round trip modeled as `async`; callers do not see the
/// underlying transport.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Attempts to acquire a named lock via SETNX-with-ttl. Returns a
    /// handle on success, `StoreError::LockBusy` if already held, after
    /// retrying for up to `wait_timeout` (spec.md §4.1's distinct
    /// `auto_release` vs acquisition-timeout parameters).
    async fn acquire(
        &self,
        lock_name: &str,
        auto_release: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle>;

    /// Releases a lock this caller holds. A no-op (not an error) if the
    /// lock already auto-released and was re-acquired by someone else —
    /// release is a compare-and-delete on `owner_token`.
    async fn release(&self, handle: &LockHandle) -> Result<()>;

    async fn publish(&self, channel: &str, message: &str) -> Result<()>;

    /// Subscribes to `channel`, returning a stream of messages. The stream
    /// yields `None` after `idle_timeout` elapses with no message (spec.md
    /// §5: "every streaming `wait` carries an idle timeout").
    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<tokio::sync::mpsc::Receiver<ChannelMessage>>;
}

#[async_trait]
pub trait StoreExt: Store {
    async fn set_admission_lock(&self, user: &str, reason: Option<String>) -> Result<()> {
        let info = AdmissionLockInfo {
            locked: true,
            user: user.to_string(),
            timestamp: Utc::now(),
            reason,
        };
        let body = serde_json::to_string(&info)?;
        self.set(crate::lock::ADMISSION_LOCK_KEY, &body, None).await
    }

    async fn clear_admission_lock(&self) -> Result<()> {
        self.delete(crate::lock::ADMISSION_LOCK_KEY).await
    }

    async fn is_admission_locked(&self) -> Result<Option<AdmissionLockInfo>> {
        match self.get(crate::lock::ADMISSION_LOCK_KEY).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}

impl<T: Store + ?Sized> StoreExt for T {}
