//! # vault-core
//!
//! Client-side crypto core for the passvault password manager:
//! - PBKDF2-SHA256 key derivation and AES-256-GCM envelopes per secret field
//! - SHA-256 master key hashes with constant-time verification
//! - Login through an identity provider with local hash fallback
//! - In-memory sessions that end after a period of inactivity

pub mod auth;
pub mod crypto;
pub mod error;
pub mod records;
pub mod session;
pub mod settings;
pub mod storage;
mod vault;

pub use auth::{AuthMethod, AuthOutcome, HttpIdentityProvider, IdentityProvider, Verifier};
pub use crypto::{decrypt, encrypt, hash_master_key, verify_master_key, Envelope, MasterKey};
pub use error::{Result, VaultError};
pub use records::{
    Account, Category, CategoryManager, DecryptedEntry, EntryFailure, EntryManager, EntrySummary,
    EntryUpdate, NewEntry, StoredEntry, VaultContents,
};
pub use session::{SessionEnd, SessionInfo, SessionManager};
pub use settings::{IdentitySettings, Settings, SettingsManager};
pub use storage::{FileStore, MemoryStore, RecordStore};
pub use vault::Vault;
