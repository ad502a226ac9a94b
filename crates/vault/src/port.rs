use crate::error::VaultError;

/// The core consumes secret decryption as an opaque capability (spec.md §6:
/// "Vault / decryption: accept a `Vault` capability with operations
/// `is_encrypted(bytes) -> bool`, `decrypt(bytes) -> bytes`"). Storage,
/// key management, and rotation live entirely outside this crate.
pub trait Vault: Send + Sync {
    fn is_encrypted(&self, value: &str) -> bool;

    fn decrypt(&self, value: &str) -> Result<String, VaultError>;
}

/// Degrades to "drop encrypted leaves" per spec.md §6 when no real Vault
/// is wired up.
pub struct NoopVault;

impl Vault for NoopVault {
    fn is_encrypted(&self, _value: &str) -> bool {
        false
    }

    fn decrypt(&self, _value: &str) -> Result<String, VaultError> {
        Err(VaultError::DecryptFailed)
    }
}
