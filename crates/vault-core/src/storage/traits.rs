//! Record store trait definitions

use crate::error::Result;
use crate::records::{Account, Category, StoredEntry};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence collaborator for accounts and user-scoped records
///
/// Records are only ever visible to their owner: lookups and deletes with a
/// foreign `owner_id` behave as if the record does not exist. Values handed
/// to the store are already encrypted; the store never sees a master key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace an account (keyed by username)
    async fn save_account(&self, account: &Account) -> Result<()>;

    /// Look up an account by username
    async fn find_account(&self, username: &str) -> Result<Option<Account>>;

    /// Insert or replace a category
    async fn save_category(&self, category: &Category) -> Result<()>;

    /// Categories owned by `owner_id`, oldest first
    async fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>>;

    /// Delete a category and move its entries to uncategorized in one step
    ///
    /// Returns how many entries were moved, or `None` if the owner has no
    /// such category.
    async fn delete_category(&self, owner_id: &str, id: Uuid) -> Result<Option<usize>>;

    /// Insert or replace an entry
    async fn save_entry(&self, entry: &StoredEntry) -> Result<()>;

    /// Fetch one entry owned by `owner_id`
    async fn get_entry(&self, owner_id: &str, id: Uuid) -> Result<Option<StoredEntry>>;

    /// Entries owned by `owner_id`, oldest first
    async fn list_entries(&self, owner_id: &str) -> Result<Vec<StoredEntry>>;

    /// Delete an entry. Returns false if the owner has no such entry.
    async fn delete_entry(&self, owner_id: &str, id: Uuid) -> Result<bool>;

    /// Get a human-readable name for this backend
    fn backend_name(&self) -> &'static str;
}
