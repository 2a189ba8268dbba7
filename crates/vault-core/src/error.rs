//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    /// The host could not provide randomness or a cipher primitive failed structurally.
    /// Fatal: retrying will not change host capability.
    #[error("Cryptographic primitives unavailable: {0}")]
    CryptoUnavailable(String),

    /// Authenticated decryption failed - wrong master key or tampered envelope
    #[error("Integrity check failed - wrong master key or tampered envelope")]
    Integrity,

    /// Malformed envelope, rejected before any key derivation
    #[error("Invalid envelope: {0}")]
    Validation(String),

    #[error("Vault is locked - log in with the master key first")]
    VaultLocked,

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VaultError {
    /// Whether this failure is confined to a single envelope.
    ///
    /// Record-level failures make one field unreadable without affecting the
    /// rest of the vault.
    pub fn is_record_level(&self) -> bool {
        matches!(self, VaultError::Integrity | VaultError::Validation(_))
    }
}
