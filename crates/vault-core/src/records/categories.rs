//! Category manager

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::types::Category;
use crate::error::{Result, VaultError};
use crate::session::SessionManager;
use crate::storage::RecordStore;

/// Category manager
pub struct CategoryManager {
    store: Arc<dyn RecordStore>,
    session: Arc<SessionManager>,
}

impl CategoryManager {
    pub fn new(store: Arc<dyn RecordStore>, session: Arc<SessionManager>) -> Self {
        Self { store, session }
    }

    async fn owner(&self) -> Result<String> {
        let owner_id = self.session.user_id().await?;
        self.session.record_activity().await;
        Ok(owner_id)
    }

    /// Validate a name against the owner's other categories
    fn check_name(name: &str, existing: &[Category], except: Option<Uuid>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }

        let taken = existing
            .iter()
            .any(|c| Some(c.id) != except && c.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(VaultError::InvalidInput(format!(
                "category already exists: {}",
                name
            )));
        }

        Ok(name.to_string())
    }

    /// Create a category
    pub async fn create(&self, name: &str) -> Result<Category> {
        let owner_id = self.owner().await?;
        let existing = self.store.list_categories(&owner_id).await?;
        let name = Self::check_name(name, &existing, None)?;

        let category = Category::new(&owner_id, &name);
        self.store.save_category(&category).await?;

        info!("Created category: {} ({})", category.name, category.id);
        Ok(category)
    }

    /// List the owner's categories
    pub async fn list(&self) -> Result<Vec<Category>> {
        let owner_id = self.owner().await?;
        self.store.list_categories(&owner_id).await
    }

    /// Rename a category
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Category> {
        let owner_id = self.owner().await?;
        let existing = self.store.list_categories(&owner_id).await?;

        let mut category = existing
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| VaultError::CategoryNotFound(id.to_string()))?;

        category.name = Self::check_name(name, &existing, Some(id))?;
        self.store.save_category(&category).await?;

        info!("Renamed category {} to {}", id, category.name);
        Ok(category)
    }

    /// Delete a category; its entries become uncategorized
    ///
    /// Returns how many entries were moved.
    pub async fn delete(&self, id: Uuid) -> Result<usize> {
        let owner_id = self.owner().await?;

        let moved = self
            .store
            .delete_category(&owner_id, id)
            .await?
            .ok_or_else(|| VaultError::CategoryNotFound(id.to_string()))?;

        info!("Deleted category {} ({} entries uncategorized)", id, moved);
        Ok(moved)
    }
}
