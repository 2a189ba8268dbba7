//! Two-step master key verification
//!
//! Precedence is fixed: the identity provider (when configured) answers
//! first; if it rejects or cannot be reached, the candidate key's SHA-256 is
//! compared in constant time against the account's stored hash.

use std::sync::Arc;
use tracing::{debug, warn};

use super::identity::{IdentityProvider, ProviderVerdict};
use crate::crypto::{hash_master_key, verify_master_key, MasterKey};
use crate::error::Result;
use crate::storage::RecordStore;

/// Which step accepted the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    IdentityProvider,
    LocalHash,
}

/// Result of a login attempt. A wrong key is `Rejected`, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated { user_id: String, method: AuthMethod },
    Rejected,
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated { .. })
    }
}

/// Master key verifier
pub struct Verifier {
    store: Arc<dyn RecordStore>,
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl Verifier {
    /// Verifier with local hash checking only
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            provider: None,
        }
    }

    /// Put an identity provider ahead of the local hash check
    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Check a candidate master key for `username`
    pub async fn verify(&self, username: &str, master_key: &MasterKey) -> Result<AuthOutcome> {
        let Some(account) = self.store.find_account(username).await? else {
            // Local hashing work still happens; the provider is never asked
            std::hint::black_box(hash_master_key(master_key));
            debug!("Login rejected: no account for {}", username);
            return Ok(AuthOutcome::Rejected);
        };

        if let Some(provider) = &self.provider {
            match provider.sign_in(username, master_key).await {
                Ok(ProviderVerdict::Accepted { subject }) => {
                    debug!(
                        "{} accepted {} (subject {})",
                        provider.provider_name(),
                        username,
                        subject
                    );
                    return Ok(AuthOutcome::Authenticated {
                        user_id: account.user_id,
                        method: AuthMethod::IdentityProvider,
                    });
                }
                Ok(ProviderVerdict::Rejected) => {
                    debug!(
                        "{} rejected {}, trying local hash",
                        provider.provider_name(),
                        username
                    );
                }
                Err(e) => {
                    warn!(
                        "{} unavailable, trying local hash: {}",
                        provider.provider_name(),
                        e
                    );
                }
            }
        }

        if verify_master_key(master_key, &account.master_key_hash) {
            Ok(AuthOutcome::Authenticated {
                user_id: account.user_id,
                method: AuthMethod::LocalHash,
            })
        } else {
            debug!("Login rejected for {}", username);
            Ok(AuthOutcome::Rejected)
        }
    }
}
