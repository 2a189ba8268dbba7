//! External identity providers
//!
//! A provider is the primary way to authenticate a login. It is an
//! integration detail: the vault's security never depends on it, and the
//! local hash check takes over whenever it is absent or unavailable.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::crypto::MasterKey;
use crate::error::{Result, VaultError};
use crate::settings::IdentitySettings;

/// What the provider said about a sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderVerdict {
    /// Credentials accepted; `subject` is the provider's own user ID
    Accepted { subject: String },
    Rejected,
}

/// Trait for primary authentication backends
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check a username / master key pair.
    ///
    /// `Err` means the provider could not give an answer (network, outage);
    /// a wrong key is `Ok(ProviderVerdict::Rejected)`.
    async fn sign_in(&self, username: &str, master_key: &MasterKey) -> Result<ProviderVerdict>;

    /// Get a human-readable name for this provider
    fn provider_name(&self) -> &'static str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
}

/// Password sign-in over HTTPS
///
/// Sends `{ email, password, returnSecureToken }` as JSON, with the email
/// synthesized as `<username>@<email_domain>`, and reads `localId` from a
/// successful response.
pub struct HttpIdentityProvider {
    client: Client,
    endpoint: Url,
    email_domain: String,
}

impl HttpIdentityProvider {
    /// Create a provider from settings
    pub fn new(settings: &IdentitySettings) -> Result<Self> {
        let mut endpoint = Url::parse(&settings.endpoint)
            .map_err(|e| VaultError::Identity(format!("Invalid endpoint URL: {}", e)))?;

        if let Some(api_key) = &settings.api_key {
            endpoint.query_pairs_mut().append_pair("key", api_key);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| VaultError::Identity(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            email_domain: settings.email_domain.trim_start_matches('@').to_string(),
        })
    }

    /// Sign-in email for a username
    pub fn email_for(&self, username: &str) -> String {
        format!("{}@{}", username, self.email_domain)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, username: &str, master_key: &MasterKey) -> Result<ProviderVerdict> {
        let email = self.email_for(username);
        let request = SignInRequest {
            email: &email,
            password: master_key.expose(),
            return_secure_token: true,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| VaultError::Identity(format!("Sign-in request failed: {}", e)))?;

        let status = response.status();
        debug!("Identity provider responded with {}", status);

        if status.is_success() {
            let body: SignInResponse = response
                .json()
                .await
                .map_err(|e| VaultError::Identity(format!("Invalid sign-in response: {}", e)))?;
            return Ok(ProviderVerdict::Accepted {
                subject: body.local_id,
            });
        }

        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            return Ok(ProviderVerdict::Rejected);
        }

        Err(VaultError::Identity(format!(
            "Identity provider unavailable: {}",
            status
        )))
    }

    fn provider_name(&self) -> &'static str {
        "HTTP Identity Provider"
    }
}
