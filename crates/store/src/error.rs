use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Conflict,
    Fatal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lock busy: {0}")]
    LockBusy(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LockBusy(_) => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::Transient,
            Self::Serialization(_) => ErrorKind::Fatal,
            Self::Backend(_) => ErrorKind::Transient,
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_dropped() || e.is_timeout() || e.is_io_error() {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}
