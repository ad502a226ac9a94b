use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("decryption failed")]
    DecryptFailed,

    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}
