use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::VaultError;
use crate::port::Vault;

/// Marker prefix for values this capability recognizes as encrypted; any
/// other string is treated as plaintext and passed through unflagged.
pub const ENCRYPTED_PREFIX: &str = "enc:";

/// A concrete `Vault`: AES-256-GCM with a 12-byte random nonce prepended
/// to the ciphertext, base64-encoded, behind the `enc:` marker. Real
/// deployments wire up whatever secret backend they use; this exists so
/// the capability is exercisable in tests without a live backend.
pub struct AesGcmVault {
    cipher: Aes256Gcm,
}

impl AesGcmVault {
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    pub fn encrypt(&self, plaintext: &str, nonce_bytes: &[u8; 12]) -> String {
        let nonce = Nonce::from_slice(nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .expect("encryption does not fail for a well-formed key/nonce");
        let mut buf = nonce_bytes.to_vec();
        buf.extend_from_slice(&ciphertext);
        format!("{ENCRYPTED_PREFIX}{}", BASE64.encode(buf))
    }
}

impl Vault for AesGcmVault {
    fn is_encrypted(&self, value: &str) -> bool {
        value.starts_with(ENCRYPTED_PREFIX)
    }

    fn decrypt(&self, value: &str) -> Result<String, VaultError> {
        let encoded = value
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or_else(|| VaultError::Malformed("missing enc: marker".into()))?;
        let raw = BASE64
            .decode(encoded)
            .map_err(|e| VaultError::Malformed(e.to_string()))?;
        if raw.len() < 12 {
            return Err(VaultError::Malformed("ciphertext shorter than nonce".into()));
        }
        let (nonce_bytes, ciphertext) = raw.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| VaultError::DecryptFailed)?;
        String::from_utf8(plaintext).map_err(|_| VaultError::DecryptFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_secret() {
        let vault = AesGcmVault::new(&[7u8; 32]);
        let ciphertext = vault.encrypt("hunter2", &[1u8; 12]);
        assert!(vault.is_encrypted(&ciphertext));
        assert_eq!(vault.decrypt(&ciphertext).unwrap(), "hunter2");
    }

    #[test]
    fn plaintext_is_not_flagged_encrypted() {
        let vault = AesGcmVault::new(&[7u8; 32]);
        assert!(!vault.is_encrypted("hunter2"));
    }

    #[test]
    fn tampered_ciphertext_fails_decrypt() {
        let vault = AesGcmVault::new(&[7u8; 32]);
        let mut ciphertext = vault.encrypt("hunter2", &[1u8; 12]);
        ciphertext.push('x');
        assert!(vault.decrypt(&ciphertext).is_err());
    }
}
