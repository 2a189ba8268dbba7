//! Accounts, categories and encrypted password entries

mod categories;
mod entries;
mod types;

pub use categories::CategoryManager;
pub use entries::{decrypt_entry, EntryFailure, EntryManager, VaultContents};
pub use types::*;

use crate::error::{Result, VaultError};

/// Run CPU-heavy crypto work off the async executor
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| VaultError::CryptoUnavailable(format!("crypto worker failed: {}", e)))?
}
