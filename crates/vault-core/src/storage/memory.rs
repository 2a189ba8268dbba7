//! In-memory record store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::RecordStore;
use crate::error::Result;
use crate::records::{Account, Category, StoredEntry};

/// Record tables shared by the in-memory and file backends
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordTables {
    /// Keyed by username
    pub accounts: HashMap<String, Account>,
    pub categories: HashMap<Uuid, Category>,
    pub entries: HashMap<Uuid, StoredEntry>,
}

impl RecordTables {
    pub fn list_categories(&self, owner_id: &str) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .categories
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        categories
    }

    /// Remove a category and uncategorize its entries. Returns how many
    /// entries moved, or `None` if the owner has no such category.
    pub fn delete_category(&mut self, owner_id: &str, id: Uuid) -> Option<usize> {
        match self.categories.get(&id) {
            Some(category) if category.owner_id == owner_id => {
                self.categories.remove(&id);
            }
            _ => return None,
        }

        let mut moved = 0;
        for entry in self.entries.values_mut() {
            if entry.owner_id == owner_id && entry.category_id == Some(id) {
                entry.category_id = None;
                moved += 1;
            }
        }
        Some(moved)
    }

    pub fn get_entry(&self, owner_id: &str, id: Uuid) -> Option<StoredEntry> {
        self.entries
            .get(&id)
            .filter(|e| e.owner_id == owner_id)
            .cloned()
    }

    pub fn list_entries(&self, owner_id: &str) -> Vec<StoredEntry> {
        let mut entries: Vec<StoredEntry> = self
            .entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        entries
    }

    pub fn delete_entry(&mut self, owner_id: &str, id: Uuid) -> bool {
        match self.entries.get(&id) {
            Some(entry) if entry.owner_id == owner_id => {
                self.entries.remove(&id);
                true
            }
            _ => false,
        }
    }
}

/// Volatile record store, useful for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<RecordTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save_account(&self, account: &Account) -> Result<()> {
        self.tables
            .write()
            .await
            .accounts
            .insert(account.username.clone(), account.clone());
        Ok(())
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(username).cloned())
    }

    async fn save_category(&self, category: &Category) -> Result<()> {
        self.tables
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
        Ok(self.tables.read().await.list_categories(owner_id))
    }

    async fn delete_category(&self, owner_id: &str, id: Uuid) -> Result<Option<usize>> {
        Ok(self.tables.write().await.delete_category(owner_id, id))
    }

    async fn save_entry(&self, entry: &StoredEntry) -> Result<()> {
        self.tables
            .write()
            .await
            .entries
            .insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_entry(&self, owner_id: &str, id: Uuid) -> Result<Option<StoredEntry>> {
        Ok(self.tables.read().await.get_entry(owner_id, id))
    }

    async fn list_entries(&self, owner_id: &str) -> Result<Vec<StoredEntry>> {
        Ok(self.tables.read().await.list_entries(owner_id))
    }

    async fn delete_entry(&self, owner_id: &str, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.delete_entry(owner_id, id))
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Envelope;
    use chrono::Utc;

    fn entry(owner_id: &str, title: &str) -> StoredEntry {
        let now = Utc::now();
        StoredEntry {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            category_id: None,
            title: title.to_string(),
            username: Envelope::from_encoded("dXNlcg=="),
            password: Envelope::from_encoded("cGFzcw=="),
            url: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_accounts() {
        let store = MemoryStore::new();
        assert!(store.find_account("alice").await.unwrap().is_none());

        let account = Account::new("alice", "ab".repeat(32));
        store.save_account(&account).await.unwrap();

        assert_eq!(store.find_account("alice").await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn test_entries_are_owner_scoped() {
        let store = MemoryStore::new();
        let alice = entry("alice-id", "Mail");
        let bob = entry("bob-id", "Bank");

        store.save_entry(&alice).await.unwrap();
        store.save_entry(&bob).await.unwrap();

        assert_eq!(store.list_entries("alice-id").await.unwrap(), vec![alice.clone()]);
        assert!(store.get_entry("bob-id", alice.id).await.unwrap().is_none());
        assert!(!store.delete_entry("bob-id", alice.id).await.unwrap());

        assert!(store.delete_entry("alice-id", alice.id).await.unwrap());
        assert!(store.list_entries("alice-id").await.unwrap().is_empty());
        assert_eq!(store.list_entries("bob-id").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_categories_are_owner_scoped() {
        let store = MemoryStore::new();
        let work = Category::new("alice-id", "Work");

        store.save_category(&work).await.unwrap();

        assert_eq!(store.list_categories("alice-id").await.unwrap(), vec![work.clone()]);
        assert!(store.list_categories("bob-id").await.unwrap().is_empty());
        assert_eq!(store.delete_category("bob-id", work.id).await.unwrap(), None);
        assert_eq!(store.delete_category("alice-id", work.id).await.unwrap(), Some(0));
        assert!(store.list_categories("alice-id").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_category_uncategorizes_entries() {
        let store = MemoryStore::new();
        let work = Category::new("alice-id", "Work");
        store.save_category(&work).await.unwrap();

        let mut filed = entry("alice-id", "VPN");
        filed.category_id = Some(work.id);
        let loose = entry("alice-id", "Mail");
        store.save_entry(&filed).await.unwrap();
        store.save_entry(&loose).await.unwrap();

        assert_eq!(store.delete_category("alice-id", work.id).await.unwrap(), Some(1));
        assert!(store
            .list_entries("alice-id")
            .await
            .unwrap()
            .iter()
            .all(|e| e.category_id.is_none()));
    }
}
