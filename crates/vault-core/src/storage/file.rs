//! JSON file record store
//!
//! Keeps every record in a single `records.json` in the data directory.
//! Secret fields are already envelopes when they arrive here, so the file
//! itself is plain JSON.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::memory::RecordTables;
use super::RecordStore;
use crate::error::{Result, VaultError};
use crate::records::{Account, Category, StoredEntry};

/// Current on-disk format version
const FILE_VERSION: u32 = 1;

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    #[serde(default)]
    accounts: HashMap<String, Account>,
    #[serde(default)]
    categories: HashMap<Uuid, Category>,
    #[serde(default)]
    entries: HashMap<Uuid, StoredEntry>,
}

/// File-backed record store
pub struct FileStore {
    /// Directory for storage files
    storage_dir: PathBuf,
    /// In-memory copy of the file
    tables: RwLock<RecordTables>,
}

impl FileStore {
    /// Create a store in the default data directory
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Create with a custom storage directory
    pub fn with_dir(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        debug!("File record store at: {:?}", storage_dir);

        Ok(Self {
            storage_dir,
            tables: RwLock::new(RecordTables::default()),
        })
    }

    /// Get the default data directory
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("org", "passvault", "passvault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::StorageError("Could not determine data directory".to_string())
            })
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn storage_file_path(&self) -> PathBuf {
        self.storage_dir.join("records.json")
    }

    /// Load records from disk, replacing the in-memory copy
    pub async fn load(&self) -> Result<()> {
        let path = self.storage_file_path();

        if !path.exists() {
            debug!("No existing records file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: StorageFile = serde_json::from_str(&contents)?;

        if file.version > FILE_VERSION {
            return Err(VaultError::StorageError(format!(
                "Unsupported records file version {} (newest known is {})",
                file.version, FILE_VERSION
            )));
        }

        let mut tables = self.tables.write().await;
        *tables = RecordTables {
            accounts: file.accounts,
            categories: file.categories,
            entries: file.entries,
        };

        debug!(
            "Loaded {} accounts, {} categories, {} entries",
            tables.accounts.len(),
            tables.categories.len(),
            tables.entries.len()
        );
        Ok(())
    }

    /// Write the tables to disk atomically using a temp file
    async fn persist(&self, tables: &RecordTables) -> Result<()> {
        let file = StorageFile {
            version: FILE_VERSION,
            accounts: tables.accounts.clone(),
            categories: tables.categories.clone(),
            entries: tables.entries.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.storage_file_path();

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved records to {:?}", path);
        Ok(())
    }

    /// Apply `change` to a copy of the tables, write the copy, then swap it in
    ///
    /// The in-memory tables are untouched if the write fails. A `change` that
    /// returns `None` made no modification and nothing is written.
    async fn commit<T, F>(&self, change: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut RecordTables) -> Option<T> + Send,
        T: Send,
    {
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();

        let Some(outcome) = change(&mut next) else {
            return Ok(None);
        };

        self.persist(&next).await?;
        *tables = next;
        Ok(Some(outcome))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn save_account(&self, account: &Account) -> Result<()> {
        self.commit(|tables| {
            tables
                .accounts
                .insert(account.username.clone(), account.clone());
            Some(())
        })
        .await?;
        Ok(())
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(username).cloned())
    }

    async fn save_category(&self, category: &Category) -> Result<()> {
        self.commit(|tables| {
            tables.categories.insert(category.id, category.clone());
            Some(())
        })
        .await?;
        Ok(())
    }

    async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
        Ok(self.tables.read().await.list_categories(owner_id))
    }

    async fn delete_category(&self, owner_id: &str, id: Uuid) -> Result<Option<usize>> {
        self.commit(|tables| tables.delete_category(owner_id, id))
            .await
    }

    async fn save_entry(&self, entry: &StoredEntry) -> Result<()> {
        self.commit(|tables| {
            tables.entries.insert(entry.id, entry.clone());
            Some(())
        })
        .await?;
        Ok(())
    }

    async fn get_entry(&self, owner_id: &str, id: Uuid) -> Result<Option<StoredEntry>> {
        Ok(self.tables.read().await.get_entry(owner_id, id))
    }

    async fn list_entries(&self, owner_id: &str) -> Result<Vec<StoredEntry>> {
        Ok(self.tables.read().await.list_entries(owner_id))
    }

    async fn delete_entry(&self, owner_id: &str, id: Uuid) -> Result<bool> {
        let deleted = self
            .commit(|tables| tables.delete_entry(owner_id, id).then_some(()))
            .await?;
        Ok(deleted.is_some())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Store"
    }
}
