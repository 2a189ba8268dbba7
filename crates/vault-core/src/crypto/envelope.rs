//! Self-contained AES-256-GCM envelopes
//!
//! Wire format: standard base64 of `salt || nonce || ciphertext+tag`
//! - Salt: 16 bytes, fresh per envelope, input to PBKDF2
//! - Nonce: 12 bytes (96 bits) - standard for GCM
//! - Ciphertext: same length as the plaintext, followed by the 16-byte auth tag
//!
//! Decryption needs nothing but the master key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::key_derivation::{derive_key, generate_nonce, generate_salt, NONCE_LEN, SALT_LEN};
use super::MasterKey;
use crate::error::{Result, VaultError};

/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Smallest valid decoded envelope: salt, nonce and the tag of an empty plaintext
pub const MIN_ENVELOPE_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// One encrypted field, as persisted and transmitted
///
/// Immutable: updating a field produces a brand-new envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(String);

impl Envelope {
    /// Wrap an encoded envelope without checking it
    ///
    /// Malformed input is reported by [`decrypt`] as a validation error.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 wire form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode and split into salt, nonce and ciphertext
    pub fn parts(&self) -> Result<EnvelopeParts> {
        EnvelopeParts::decode(&self.0)
    }
}

impl AsRef<str> for Envelope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded envelope components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeParts {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the auth tag appended
    pub ciphertext: Vec<u8>,
}

impl EnvelopeParts {
    /// Parse the base64 wire form
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::Validation(format!("invalid base64: {}", e)))?;

        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(VaultError::Validation(format!(
                "too short: expected at least {} bytes, got {}",
                MIN_ENVELOPE_LEN,
                bytes.len()
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[..SALT_LEN]);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + NONCE_LEN]);

        Ok(Self {
            salt,
            nonce,
            ciphertext: bytes[SALT_LEN + NONCE_LEN..].to_vec(),
        })
    }

    /// Produce the base64 wire form
    pub fn encode(&self) -> Envelope {
        let mut bytes = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        Envelope(STANDARD.encode(bytes))
    }
}

/// Encrypt a string under a freshly derived key
///
/// Every call draws a new salt and nonce, so encrypting the same plaintext
/// twice yields different envelopes.
pub fn encrypt(plaintext: &str, master_key: &MasterKey) -> Result<Envelope> {
    let salt = generate_salt()?;
    let nonce = generate_nonce()?;
    seal(plaintext, master_key, salt, nonce)
}

fn seal(
    plaintext: &str,
    master_key: &MasterKey,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
) -> Result<Envelope> {
    let key = derive_key(master_key, &salt);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::CryptoUnavailable(format!("AES-256-GCM key setup: {}", e)))?;

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| VaultError::CryptoUnavailable(format!("AES-256-GCM encryption: {}", e)))?;

    Ok(EnvelopeParts {
        salt,
        nonce,
        ciphertext,
    }
    .encode())
}

/// Decrypt an envelope produced by [`encrypt`]
///
/// Malformed input fails with [`VaultError::Validation`] before any key is
/// derived. A wrong master key or any modification of the envelope fails
/// with [`VaultError::Integrity`]; there is no partial or corrupted output.
pub fn decrypt(envelope: impl AsRef<str>, master_key: &MasterKey) -> Result<String> {
    let parts = EnvelopeParts::decode(envelope.as_ref())?;

    let key = derive_key(master_key, &parts.salt);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::CryptoUnavailable(format!("AES-256-GCM key setup: {}", e)))?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&parts.nonce), parts.ciphertext.as_slice())
        .map_err(|_| VaultError::Integrity)?;

    String::from_utf8(plaintext)
        .map_err(|e| VaultError::Validation(format!("plaintext is not UTF-8: {}", e)))
}
