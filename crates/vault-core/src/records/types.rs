//! Record type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::Envelope;

/// A registered user. Holds the verification hash, never the master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owner identity used to scope every record
    pub user_id: String,
    /// Login name
    pub username: String,
    /// Lowercase hex SHA-256 of the master key
    pub master_key_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create an account with a fresh user ID
    pub fn new(username: &str, master_key_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            master_key_hash,
            created_at: Utc::now(),
        }
    }
}

/// User-defined grouping for entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(owner_id: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Password entry as persisted - secret fields are envelopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: Uuid,
    pub owner_id: String,
    /// None means uncategorized
    pub category_id: Option<Uuid>,
    /// Display title (plaintext, used for listing)
    pub title: String,
    pub username: Envelope,
    pub password: Envelope,
    /// Absent fields are omitted, never encrypted as a sentinel
    pub url: Option<Envelope>,
    pub notes: Option<Envelope>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry metadata (safe to display)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub has_url: bool,
    pub has_notes: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredEntry> for EntrySummary {
    fn from(entry: &StoredEntry) -> Self {
        Self {
            id: entry.id,
            category_id: entry.category_id,
            title: entry.title.clone(),
            has_url: entry.url.is_some(),
            has_notes: entry.notes.is_some(),
            updated_at: entry.updated_at,
        }
    }
}

/// Plaintext input for a new entry
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Field changes for an existing entry; `None` leaves a field untouched
///
/// Optional fields use a nested option: `Some(None)` removes the field.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
}

impl EntryUpdate {
    /// True when applying this update would change nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.url.is_none()
            && self.notes.is_none()
            && self.category_id.is_none()
    }
}

/// Decrypted entry - secret fields are zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DecryptedEntry {
    #[zeroize(skip)]
    pub id: Uuid,
    #[zeroize(skip)]
    pub category_id: Option<Uuid>,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for DecryptedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedEntry")
            .field("id", &self.id)
            .field("category_id", &self.category_id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("notes", &self.notes.as_ref().map(|_| "[REDACTED]"))
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
