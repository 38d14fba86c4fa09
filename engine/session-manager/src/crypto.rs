//! At-rest encryption for session tokens.
//!
//! AES-256-GCM with a random nonce per encryption; ciphertexts are stored
//! base64-encoded with the nonce prepended. The key is generated once and
//! persisted with owner-only permissions.

use crate::error::SessionManagerError;
use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::fs;
use std::path::Path;
use tracing::info;

const NONCE_LEN: usize = 12;

/// Symmetric cipher for session and CSRF tokens.
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Build a cipher from raw 32-byte key material.
    pub fn new(key: &[u8]) -> crate::Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| SessionManagerError::Crypto(format!("invalid key length: {e}")))?;
        Ok(Self { cipher })
    }

    /// Load the key from `path`, generating and persisting a fresh one with
    /// mode 0600 when the file does not exist yet.
    pub fn load_or_create(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let encoded = fs::read_to_string(path)?;
            let key = BASE64
                .decode(encoded.trim())
                .map_err(|e| SessionManagerError::Crypto(format!("corrupt key file: {e}")))?;
            return Self::new(&key);
        }

        let key = Aes256Gcm::generate_key(OsRng);
        fs::write(path, BASE64.encode(key))?;
        restrict_permissions(path)?;
        info!(path = %path.display(), "generated new session encryption key");
        Ok(Self { cipher: Aes256Gcm::new(&key) })
    }

    /// Encrypt a token for storage: base64(nonce || ciphertext).
    pub fn encrypt(&self, plaintext: &str) -> crate::Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| SessionManagerError::Crypto(format!("encryption failed: {e}")))?;

        let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        packed.extend_from_slice(&nonce);
        packed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(packed))
    }

    /// Decrypt a token produced by [`Self::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> crate::Result<String> {
        let packed = BASE64
            .decode(encoded)
            .map_err(|e| SessionManagerError::Crypto(format!("corrupt ciphertext: {e}")))?;
        if packed.len() < NONCE_LEN {
            return Err(SessionManagerError::Crypto("ciphertext too short".into()));
        }
        let (nonce, ciphertext) = packed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| SessionManagerError::Crypto(format!("decryption failed: {e}")))?;
        String::from_utf8(plaintext)
            .map_err(|e| SessionManagerError::Crypto(format!("invalid utf-8: {e}")))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = TokenCipher::load_or_create(&dir.path().join("key")).unwrap();
        let encrypted = cipher.encrypt("session-token-value").unwrap();
        assert_ne!(encrypted, "session-token-value");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "session-token-value");
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = TokenCipher::load_or_create(&dir.path().join("key")).unwrap();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), cipher.decrypt(&b).unwrap());
    }

    #[test]
    fn key_is_reloaded_not_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key");
        let first = TokenCipher::load_or_create(&key_path).unwrap();
        let token = first.encrypt("persist-me").unwrap();

        let second = TokenCipher::load_or_create(&key_path).unwrap();
        assert_eq!(second.decrypt(&token).unwrap(), "persist-me");
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key");
        TokenCipher::load_or_create(&key_path).unwrap();
        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = TokenCipher::load_or_create(&dir.path().join("key")).unwrap();
        let encrypted = cipher.encrypt("secret").unwrap();
        let mut bytes = BASE64.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = BASE64.encode(bytes);
        assert!(cipher.decrypt(&tampered).is_err());
    }
}
