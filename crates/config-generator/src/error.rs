use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Fatal,
}

#[derive(Debug, Error)]
pub enum ConfigGeneratorError {
    #[error("unsupported hwsku {0}: not in the closed support list")]
    UnsupportedHwsku(String),

    #[error("port config for hwsku {hwsku} could not be parsed: {reason}")]
    InvalidPortConfig { hwsku: String, reason: String },

    #[error("port {0} has both a canonical and an alias breakout group: ambiguous")]
    AmbiguousBreakout(String),

    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(String),

    #[error("cannot derive an AS number from {0}: not a valid IPv4 address")]
    InvalidAsnSource(String),

    #[error("failed to publish config for {device}: {reason}")]
    Publish { device: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigGeneratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedHwsku(_) => ErrorKind::Validation,
            Self::InvalidPortConfig { .. } => ErrorKind::Validation,
            Self::AmbiguousBreakout(_) => ErrorKind::Validation,
            Self::InvalidInterfaceName(_) => ErrorKind::Validation,
            Self::InvalidAsnSource(_) => ErrorKind::Validation,
            Self::Publish { .. } => ErrorKind::Fatal,
            Self::Io(_) => ErrorKind::Fatal,
            Self::Json(_) => ErrorKind::Fatal,
        }
    }
}
