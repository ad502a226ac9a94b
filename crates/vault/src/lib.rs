//! The `Vault` capability: secret decryption consumed as an opaque
//! collaborator by the reconciler. Storage and key management are
//! explicitly out of scope; this crate only defines the interface and one
//! concrete, self-contained implementation for tests and small
//! deployments.

pub mod aes_gcm_vault;
pub mod error;
pub mod port;

pub use aes_gcm_vault::AesGcmVault;
pub use error::VaultError;
pub use port::{NoopVault, Vault};
