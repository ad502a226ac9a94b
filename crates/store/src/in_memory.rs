use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::lock::LockHandle;
use crate::port::{ChannelMessage, Result, Store};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

struct LockEntry {
    owner_token: String,
    expires_at: Instant,
}

/// Single-process `Store` test double. No real pub/sub fan-out across
/// processes; subscribers only see messages published after they
/// subscribed, same as the Redis binding.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, Entry>>,
    locks: Mutex<HashMap<String, LockEntry>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<ChannelMessage>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn reap_expired_locks(&self) {
        let now = Instant::now();
        self.locks.lock().unwrap().retain(|_, l| l.expires_at > now);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut data = self.data.lock().unwrap();
        if let Some(entry) = data.get(key) {
            if entry.expires_at.map(|e| e > now).unwrap_or(true) {
                return Ok(Some(entry.value.clone()));
            }
            data.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.data.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    async fn acquire(
        &self,
        lock_name: &str,
        auto_release: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle> {
        let handle = LockHandle::new(lock_name, auto_release);
        let deadline = Instant::now() + wait_timeout;
        loop {
            self.reap_expired_locks();
            {
                let mut locks = self.locks.lock().unwrap();
                if !locks.contains_key(lock_name) {
                    locks.insert(
                        lock_name.to_string(),
                        LockEntry {
                            owner_token: handle.owner_token.clone(),
                            expires_at: Instant::now() + auto_release,
                        },
                    );
                    return Ok(handle);
                }
            }
            if Instant::now() >= deadline {
                return Err(StoreError::LockBusy(lock_name.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn release(&self, handle: &LockHandle) -> Result<()> {
        let mut locks = self.locks.lock().unwrap();
        if let Some(entry) = locks.get(&handle.name) {
            if entry.owner_token == handle.owner_token {
                locks.remove(&handle.name);
            }
        }
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let mut subs = self.subscribers.lock().unwrap();
        if let Some(senders) = subs.get_mut(channel) {
            senders.retain(|s| {
                s.try_send(ChannelMessage {
                    channel: channel.to_string(),
                    payload: message.to_string(),
                })
                .is_ok()
            });
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<ChannelMessage>> {
        let (tx, rx) = mpsc::channel(256);
        self.subscribers
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
