//! Secret holders with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a derived AES-256 key in bytes
pub const DERIVED_KEY_LEN: usize = 32;

/// The user's master key - never persisted, zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    secret: String,
}

impl MasterKey {
    /// Wrap a master key string
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Get the secret (use carefully - avoid copying)
    pub fn expose(&self) -> &str {
        &self.secret
    }

    /// Raw UTF-8 bytes of the secret
    pub fn as_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

impl From<&str> for MasterKey {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for MasterKey {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl Clone for MasterKey {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret.clone(),
        }
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Per-operation symmetric key - owned by a single encrypt/decrypt call
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; DERIVED_KEY_LEN],
}

impl DerivedKey {
    pub(crate) fn new(key: [u8; DERIVED_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
