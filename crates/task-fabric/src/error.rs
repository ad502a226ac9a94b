use thiserror::Error;
use store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Conflict,
    Fatal,
}

#[derive(Debug, Error)]
pub enum TaskFabricError {
    #[error("lock busy: {0}")]
    LockBusy(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("admission lock held by {user}{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    AdmissionLocked { user: String, reason: Option<String> },

    #[error("task {0} not found")]
    NotFound(uuid::Uuid),

    #[error("wait timed out")]
    WaitTimeout,
}

impl TaskFabricError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LockBusy(_) => ErrorKind::Conflict,
            Self::Store(e) => match e.kind() {
                store::error::ErrorKind::Transient => ErrorKind::Transient,
                store::error::ErrorKind::Conflict => ErrorKind::Conflict,
                store::error::ErrorKind::Fatal => ErrorKind::Fatal,
            },
            Self::AdmissionLocked { .. } => ErrorKind::Fatal,
            Self::NotFound(_) => ErrorKind::Fatal,
            Self::WaitTimeout => ErrorKind::Transient,
        }
    }
}
