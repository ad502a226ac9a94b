use std::time::Duration;

use uuid::Uuid;

/// A held lock. The original's `pottery.Redlock` ties auto-release to the
/// lock object itself; here the handle carries the owner token needed for a
/// safe compare-and-delete `release()`.
#[derive(Debug, Clone)]
pub struct LockHandle {
    pub name: String,
    pub owner_token: String,
    pub auto_release: Duration,
}

impl LockHandle {
    pub fn new(name: impl Into<String>, auto_release: Duration) -> Self {
        Self {
            name: name.into(),
            owner_token: Uuid::new_v4().to_string(),
            auto_release,
        }
    }
}

/// Name of the single well-known admission-lock key.
pub const ADMISSION_LOCK_KEY: &str = "task_lock";

pub fn per_entity_lock_name(subsystem: &str, entity: &str) -> String {
    format!("lock_{subsystem}_{entity}")
}
