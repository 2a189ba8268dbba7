//! Entry manager for CRUD over encrypted password entries

use chrono::Utc;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::run_blocking;
use super::types::{DecryptedEntry, EntrySummary, EntryUpdate, NewEntry, StoredEntry};
use crate::crypto::{decrypt, encrypt, Envelope, MasterKey};
use crate::error::{Result, VaultError};
use crate::session::SessionManager;
use crate::storage::RecordStore;

/// A record that could not be decrypted during a full vault load
#[derive(Debug)]
pub struct EntryFailure {
    pub id: Uuid,
    pub title: String,
    pub error: VaultError,
}

/// Result of decrypting every entry of the logged-in user
#[derive(Debug, Default)]
pub struct VaultContents {
    /// Readable entries, oldest first
    pub entries: Vec<DecryptedEntry>,
    /// Entries that failed integrity or validation checks
    pub failures: Vec<EntryFailure>,
}

/// Encrypt an optional field; absent stays absent
fn encrypt_optional(value: Option<&str>, master_key: &MasterKey) -> Result<Option<Envelope>> {
    value.map(|v| encrypt(v, master_key)).transpose()
}

fn decrypt_optional(envelope: Option<&Envelope>, master_key: &MasterKey) -> Result<Option<String>> {
    envelope.map(|e| decrypt(e, master_key)).transpose()
}

/// Decrypt every secret field of a stored entry
pub fn decrypt_entry(stored: &StoredEntry, master_key: &MasterKey) -> Result<DecryptedEntry> {
    Ok(DecryptedEntry {
        id: stored.id,
        category_id: stored.category_id,
        title: stored.title.clone(),
        username: decrypt(&stored.username, master_key)?,
        password: decrypt(&stored.password, master_key)?,
        url: decrypt_optional(stored.url.as_ref(), master_key)?,
        notes: decrypt_optional(stored.notes.as_ref(), master_key)?,
        updated_at: stored.updated_at,
    })
}

/// Entry manager
pub struct EntryManager {
    /// Persistence collaborator
    store: Arc<dyn RecordStore>,
    /// Holder of the master key
    session: Arc<SessionManager>,
}

impl EntryManager {
    /// Create a new entry manager
    pub fn new(store: Arc<dyn RecordStore>, session: Arc<SessionManager>) -> Self {
        Self { store, session }
    }

    /// Owner and master key of the live session; counts as activity
    async fn authorize(&self) -> Result<(String, MasterKey)> {
        let (owner_id, master_key) = self.session.credentials().await?;
        self.session.record_activity().await;
        Ok((owner_id, master_key))
    }

    async fn ensure_category(&self, owner_id: &str, category_id: Option<Uuid>) -> Result<()> {
        let Some(id) = category_id else {
            return Ok(());
        };

        let categories = self.store.list_categories(owner_id).await?;
        if categories.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(VaultError::CategoryNotFound(id.to_string()))
        }
    }

    async fn fetch(&self, owner_id: &str, id: Uuid) -> Result<StoredEntry> {
        self.store
            .get_entry(owner_id, id)
            .await?
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))
    }

    /// Encrypt and store a new entry
    pub async fn add(&self, entry: NewEntry) -> Result<EntrySummary> {
        let (owner_id, master_key) = self.authorize().await?;

        let title = entry.title.trim().to_string();
        if title.is_empty() {
            return Err(VaultError::InvalidInput("title must not be empty".to_string()));
        }
        self.ensure_category(&owner_id, entry.category_id).await?;

        let owner = owner_id.clone();
        let stored = run_blocking(move || {
            let now = Utc::now();
            Ok(StoredEntry {
                id: Uuid::new_v4(),
                owner_id: owner,
                category_id: entry.category_id,
                title,
                username: encrypt(&entry.username, &master_key)?,
                password: encrypt(&entry.password, &master_key)?,
                url: encrypt_optional(entry.url.as_deref(), &master_key)?,
                notes: encrypt_optional(entry.notes.as_deref(), &master_key)?,
                created_at: now,
                updated_at: now,
            })
        })
        .await?;

        self.store.save_entry(&stored).await?;

        info!("Added entry: {} ({})", stored.title, stored.id);
        Ok(EntrySummary::from(&stored))
    }

    /// Get and decrypt one entry
    pub async fn get_decrypted(&self, id: Uuid) -> Result<DecryptedEntry> {
        let (owner_id, master_key) = self.authorize().await?;
        let stored = self.fetch(&owner_id, id).await?;

        let decrypted = run_blocking(move || decrypt_entry(&stored, &master_key)).await?;

        debug!("Decrypted entry: {}", id);
        Ok(decrypted)
    }

    /// Apply field changes. Changed secret fields get brand-new envelopes.
    pub async fn update(&self, id: Uuid, update: EntryUpdate) -> Result<EntrySummary> {
        let (owner_id, master_key) = self.authorize().await?;
        let mut stored = self.fetch(&owner_id, id).await?;

        if update.is_empty() {
            return Ok(EntrySummary::from(&stored));
        }

        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(VaultError::InvalidInput("title must not be empty".to_string()));
            }
        }
        if let Some(category_id) = update.category_id {
            self.ensure_category(&owner_id, category_id).await?;
        }

        let stored = run_blocking(move || {
            if let Some(title) = update.title {
                stored.title = title.trim().to_string();
            }
            if let Some(username) = update.username {
                stored.username = encrypt(&username, &master_key)?;
            }
            if let Some(password) = update.password {
                stored.password = encrypt(&password, &master_key)?;
            }
            if let Some(url) = update.url {
                stored.url = encrypt_optional(url.as_deref(), &master_key)?;
            }
            if let Some(notes) = update.notes {
                stored.notes = encrypt_optional(notes.as_deref(), &master_key)?;
            }
            if let Some(category_id) = update.category_id {
                stored.category_id = category_id;
            }
            stored.updated_at = Utc::now();
            Ok(stored)
        })
        .await?;

        self.store.save_entry(&stored).await?;

        info!("Updated entry: {}", id);
        Ok(EntrySummary::from(&stored))
    }

    /// Delete an entry
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let owner_id = self.session.user_id().await?;
        self.session.record_activity().await;

        if !self.store.delete_entry(&owner_id, id).await? {
            return Err(VaultError::EntryNotFound(id.to_string()));
        }

        info!("Deleted entry: {}", id);
        Ok(())
    }

    /// List entry metadata, optionally only one category
    pub async fn list(&self, category_id: Option<Uuid>) -> Result<Vec<EntrySummary>> {
        let owner_id = self.session.user_id().await?;
        self.session.record_activity().await;

        let entries = self.store.list_entries(&owner_id).await?;
        Ok(entries
            .iter()
            .filter(|e| category_id.is_none() || e.category_id == category_id)
            .map(EntrySummary::from)
            .collect())
    }

    /// Decrypt every entry in parallel
    ///
    /// An entry whose envelopes fail integrity or validation checks is
    /// reported in [`VaultContents::failures`] and does not block the rest.
    /// Host-level crypto failures abort the load.
    pub async fn load_vault(&self) -> Result<VaultContents> {
        let (owner_id, master_key) = self.authorize().await?;
        let stored = self.store.list_entries(&owner_id).await?;
        let total = stored.len();

        let results = run_blocking(move || {
            Ok(stored
                .into_par_iter()
                .map(|entry| {
                    decrypt_entry(&entry, &master_key).map_err(|error| EntryFailure {
                        id: entry.id,
                        title: entry.title.clone(),
                        error,
                    })
                })
                .collect::<Vec<_>>())
        })
        .await?;

        let mut contents = VaultContents::default();
        for result in results {
            match result {
                Ok(entry) => contents.entries.push(entry),
                Err(failure) if failure.error.is_record_level() => {
                    warn!("Entry {} is unreadable: {}", failure.id, failure.error);
                    contents.failures.push(failure);
                }
                Err(failure) => return Err(failure.error),
            }
        }

        info!(
            "Loaded vault: {} of {} entries readable",
            contents.entries.len(),
            total
        );
        Ok(contents)
    }
}
