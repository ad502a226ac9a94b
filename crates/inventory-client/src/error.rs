use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Validation,
    Conflict,
    Fatal,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory unreachable: {0}")]
    Unreachable(String),

    #[error("inventory returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable(_) => ErrorKind::Transient,
            Self::Http { status, .. } if *status >= 500 => ErrorKind::Transient,
            Self::Http { status, .. } if *status == 409 => ErrorKind::Conflict,
            Self::Http { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::Validation,
            Self::Decode(_) => ErrorKind::Fatal,
        }
    }
}
