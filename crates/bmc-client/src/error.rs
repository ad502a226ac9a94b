use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Validation,
    Conflict,
    Fatal,
}

#[derive(Debug, Error)]
pub enum BmcError {
    #[error("bmc unreachable: {0}")]
    Unreachable(String),

    #[error("bmc returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("node not found: {0}")]
    NotFound(String),

    #[error("node already exists with unexpected attributes: {0}")]
    Conflict(String),

    #[error("wait for provision state timed out after {0:?}")]
    WaitTimeout(std::time::Duration),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl BmcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable(_) => ErrorKind::Transient,
            Self::Http { status, .. } if *status >= 500 => ErrorKind::Transient,
            Self::Http { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::WaitTimeout(_) => ErrorKind::Transient,
            Self::Decode(_) => ErrorKind::Fatal,
        }
    }
}
