use thiserror::Error;

/// Abstract error kind per the error-handling taxonomy: callers dispatch
/// retry/skip/abort policy on this rather than matching error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Validation,
    Conflict,
    Fatal,
}

/// Errors that can arise purely from domain-model construction and
/// validation — no I/O involved.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(String),

    #[error("unknown device role: {0}")]
    UnknownDeviceRole(String),

    #[error("invalid custom field {field}: {reason}")]
    InvalidCustomField { field: String, reason: String },

    #[error("ambiguous breakout group on device {device}: both canonical and alias names present for {parent}")]
    AmbiguousBreakoutSource { device: String, parent: String },

    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::AmbiguousBreakoutSource { .. } => ErrorKind::Validation,
            CoreError::InvalidInterfaceName(_) => ErrorKind::Validation,
            CoreError::UnknownDeviceRole(_) => ErrorKind::Validation,
            CoreError::InvalidCustomField { .. } => ErrorKind::Validation,
            CoreError::InvalidCidr(_) => ErrorKind::Validation,
        }
    }
}
