use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Validation,
    Conflict,
    Fatal,
    PartialFailure,
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("inventory error: {0}")]
    Inventory(#[from] inventory_client::InventoryError),

    #[error("bmc error: {0}")]
    Bmc(#[from] bmc_client::BmcError),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("{0} of {1} devices failed: {2:?}")]
    PartialFailure(usize, usize, Vec<String>),
}

impl ReconcilerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Inventory(e) => match e.kind() {
                inventory_client::error::ErrorKind::Transient => ErrorKind::Transient,
                inventory_client::error::ErrorKind::Validation => ErrorKind::Validation,
                inventory_client::error::ErrorKind::Conflict => ErrorKind::Conflict,
                inventory_client::error::ErrorKind::Fatal => ErrorKind::Fatal,
            },
            Self::Bmc(e) => match e.kind() {
                bmc_client::error::ErrorKind::Transient => ErrorKind::Transient,
                bmc_client::error::ErrorKind::Validation => ErrorKind::Validation,
                bmc_client::error::ErrorKind::Conflict => ErrorKind::Conflict,
                bmc_client::error::ErrorKind::Fatal => ErrorKind::Fatal,
            },
            Self::Store(_) => ErrorKind::Transient,
            Self::Validation(_) => ErrorKind::Validation,
            Self::PartialFailure(..) => ErrorKind::PartialFailure,
        }
    }
}
