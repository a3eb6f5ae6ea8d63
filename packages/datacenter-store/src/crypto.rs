//! Credential codec.
//!
//! Individual credential values are sealed with AES-256-GCM under the
//! process-wide secret. The stored form is `base64(nonce || ciphertext || tag)`.
//! Empty strings pass through both directions untouched so that unset
//! optional secrets stay empty instead of turning into ciphertext.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, generic_array::GenericArray},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKey { expected: usize, actual: usize },

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: {0}")]
    DecryptionFailed(&'static str),
}

/// The process-wide secret. Zeroized on drop and redacted from `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Builds a key from the raw secret as read from configuration.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        let raw = secret.as_bytes();
        if raw.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey {
                expected: KEY_SIZE,
                actual: raw.len(),
            });
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(raw);
        Ok(Self { bytes })
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts and decrypts credential values under one key.
#[derive(Clone)]
pub struct CredentialCodec {
    cipher: Aes256Gcm,
}

impl CredentialCodec {
    pub fn new(key: &EncryptionKey) -> Self {
        // Infallible: the key is always exactly KEY_SIZE bytes.
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&key.bytes));
        Self { cipher }
    }

    /// Validates `secret` and builds a codec. Used once at startup.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(&EncryptionKey::from_secret(secret)?))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend(sealed);

        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }

        let raw = STANDARD
            .decode(ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed("invalid base64"))?;
        if raw.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::DecryptionFailed("ciphertext too short"));
        }

        let (nonce, sealed) = raw.split_at(NONCE_SIZE);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::DecryptionFailed("authentication failed"))?;

        String::from_utf8(plain).map_err(|_| CryptoError::DecryptionFailed("plaintext not utf-8"))
    }
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec").finish_non_exhaustive()
    }
}

/// One-shot encryption with a raw secret.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, CryptoError> {
    CredentialCodec::from_secret(key)?.encrypt(plaintext)
}

/// One-shot decryption with a raw secret.
pub fn decrypt(ciphertext: &str, key: &str) -> Result<String, CryptoError> {
    CredentialCodec::from_secret(key)?.decrypt(ciphertext)
}
