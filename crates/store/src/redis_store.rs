use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::StoreError;
use crate::lock::LockHandle;
use crate::port::{ChannelMessage, Result, Store};

/// Redis-backed `Store`: TTL keys for ordinary get/set/locks, `PUBLISH`/
/// `SUBSCRIBE` for channels — the original's `pottery.Redlock` realized as
/// a plain `SET NX PX` plus a Lua-free compare-and-delete on release
/// (acceptable single-instance semantics; true Redlock across a Redis
/// cluster is out of scope, matching the original's single-instance
/// deployment).
pub struct RedisStore {
    client: redis::Client,
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(StoreError::from)?;
        let manager = client.get_connection_manager().await.map_err(StoreError::from)?;
        Ok(Self { client, manager })
    }
}

const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let v: Option<String> = conn.get(key).await.map_err(StoreError::from)?;
        Ok(v)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.manager.clone();
        match ttl {
            Some(d) => {
                let secs = d.as_secs().max(1);
                conn.set_ex::<_, _, ()>(key, value, secs).await.map_err(StoreError::from)?;
            }
            None => {
                conn.set::<_, _, ()>(key, value).await.map_err(StoreError::from)?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn acquire(
        &self,
        lock_name: &str,
        auto_release: Duration,
        wait_timeout: Duration,
    ) -> Result<LockHandle> {
        let handle = LockHandle::new(lock_name, auto_release);
        let deadline = tokio::time::Instant::now() + wait_timeout;
        let mut conn = self.manager.clone();
        loop {
            let secs = auto_release.as_secs().max(1);
            let acquired: bool = redis::cmd("SET")
                .arg(lock_name)
                .arg(&handle.owner_token)
                .arg("NX")
                .arg("EX")
                .arg(secs)
                .query_async(&mut conn)
                .await
                .map_err(StoreError::from)?;
            if acquired {
                return Ok(handle);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(StoreError::LockBusy(lock_name.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn release(&self, handle: &LockHandle) -> Result<()> {
        let mut conn = self.manager.clone();
        let script = redis::Script::new(RELEASE_SCRIPT);
        let _: i64 = script
            .key(&handle.name)
            .arg(&handle.owner_token)
            .invoke_async(&mut conn)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.publish::<_, _, ()>(channel, message).await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<ChannelMessage>> {
        let (tx, rx) = mpsc::channel(256);
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(StoreError::from)?;
        pubsub.subscribe(channel).await.map_err(StoreError::from)?;
        let channel_name = channel.to_string();

        tokio::spawn(async move {
            use futures::StreamExt;
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "failed to decode redis pubsub payload");
                        continue;
                    }
                };
                if tx
                    .send(ChannelMessage {
                        channel: channel_name.clone(),
                        payload,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        Ok(rx)
    }
}
