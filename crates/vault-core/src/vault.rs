//! Main vault orchestration

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::auth::{AuthOutcome, HttpIdentityProvider, IdentityProvider, Verifier};
use crate::crypto::{hash_master_key, MasterKey};
use crate::error::{Result, VaultError};
use crate::records::{Account, CategoryManager, EntryManager};
use crate::session::{SessionEnd, SessionInfo, SessionManager};
use crate::settings::Settings;
use crate::storage::RecordStore;

/// Main vault struct that orchestrates all functionality
pub struct Vault {
    /// Storage backend
    store: Arc<dyn RecordStore>,
    /// Login verification
    verifier: Verifier,
    /// Owner of the master key while logged in
    session: Arc<SessionManager>,
    /// Entry manager
    pub entries: EntryManager,
    /// Category manager
    pub categories: CategoryManager,
    check_interval: Duration,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Vault {
    /// Create a vault over `store`
    ///
    /// An HTTP identity provider is configured when `settings.identity` is set.
    pub fn new(store: Arc<dyn RecordStore>, settings: &Settings) -> Result<Self> {
        let mut verifier = Verifier::new(store.clone());
        if let Some(identity) = &settings.identity {
            verifier = verifier.with_provider(Arc::new(HttpIdentityProvider::new(identity)?));
        }

        let session = Arc::new(SessionManager::new(settings.inactivity_timeout()));

        Ok(Self {
            entries: EntryManager::new(store.clone(), session.clone()),
            categories: CategoryManager::new(store.clone(), session.clone()),
            store,
            verifier,
            session,
            check_interval: settings.activity_check_interval(),
            monitor: Mutex::new(None),
        })
    }

    /// Replace the identity provider
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.verifier = Verifier::new(self.store.clone()).with_provider(provider);
        self
    }

    /// Get the session manager
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Create an account; only the SHA-256 of the master key is stored
    pub async fn register(&self, username: &str, master_key: &MasterKey) -> Result<Account> {
        let username = username.trim();
        if username.is_empty() {
            return Err(VaultError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }
        if master_key.expose().is_empty() {
            return Err(VaultError::InvalidInput(
                "master key must not be empty".to_string(),
            ));
        }

        if self.store.find_account(username).await?.is_some() {
            return Err(VaultError::AccountExists(username.to_string()));
        }

        let account = Account::new(username, hash_master_key(master_key));
        self.store.save_account(&account).await?;

        info!("Registered account: {}", username);
        Ok(account)
    }

    /// Verify `master_key` and start a session on success
    ///
    /// Any existing session ends first. On rejection or error the key is
    /// dropped here, so no session holds it.
    pub async fn login(&self, username: &str, master_key: MasterKey) -> Result<AuthOutcome> {
        self.logout().await;

        let outcome = self.verifier.verify(username.trim(), &master_key).await?;

        match &outcome {
            AuthOutcome::Authenticated { user_id, method } => {
                let session_id = self
                    .session
                    .start(user_id, username.trim(), master_key)
                    .await;
                let handle = self
                    .session
                    .spawn_inactivity_monitor(session_id, self.check_interval);

                if let Some(previous) = self.monitor.lock().await.replace(handle) {
                    previous.abort();
                }

                info!("Logged in {} via {:?}", username.trim(), method);
            }
            AuthOutcome::Rejected => {
                info!("Login rejected for {}", username.trim());
            }
        }

        Ok(outcome)
    }

    /// End the current session. Returns false if none was active.
    pub async fn logout(&self) -> bool {
        if let Some(monitor) = self.monitor.lock().await.take() {
            monitor.abort();
        }

        let ended = self.session.end(SessionEnd::Logout).await;
        if ended {
            debug!("Vault locked");
        }
        ended
    }

    /// Check if a non-idle session exists
    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Reset the inactivity timer
    pub async fn record_activity(&self) -> bool {
        self.session.record_activity().await
    }

    /// Current session, if any
    pub async fn current_session(&self) -> Option<SessionInfo> {
        self.session.current().await
    }

    /// Get a human-readable name for the storage backend
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.get_mut().take() {
            monitor.abort();
        }
    }
}
