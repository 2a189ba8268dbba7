//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file.
//! Settings are readable without a master key.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, VaultError};

/// Default idle time before a session is ended
pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 30;

/// Default period of the inactivity check
pub const DEFAULT_ACTIVITY_CHECK_INTERVAL_SECS: u64 = 1;

/// External identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySettings {
    /// Sign-in endpoint URL (e.g., "https://identity.example.com/v1/accounts:signInWithPassword")
    pub endpoint: String,
    /// Optional API key appended as the `key` query parameter
    pub api_key: Option<String>,
    /// Domain used to synthesize sign-in emails (`<username>@<domain>`)
    pub email_domain: String,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Seconds without activity before the session ends
    pub inactivity_timeout_secs: u64,
    /// Seconds between inactivity checks
    pub activity_check_interval_secs: u64,
    /// Primary identity provider (local hash verification only when absent)
    pub identity: Option<IdentitySettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            inactivity_timeout_secs: DEFAULT_INACTIVITY_TIMEOUT_SECS,
            activity_check_interval_secs: DEFAULT_ACTIVITY_CHECK_INTERVAL_SECS,
            identity: None,
        }
    }
}

impl Settings {
    /// Idle threshold as a duration
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    /// Check period as a duration (never zero)
    pub fn activity_check_interval(&self) -> Duration {
        Duration::from_secs(self.activity_check_interval_secs.max(1))
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Create a new settings manager, falling back to defaults if the file is unreadable
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file).unwrap_or_else(|e| {
            debug!("Ignoring unreadable settings file: {}", e);
            Settings::default()
        });

        Self {
            settings_file,
            settings,
        }
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        if let Some(parent) = self.settings_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Set the inactivity timeout and save
    pub async fn set_inactivity_timeout(&mut self, secs: u64) -> Result<()> {
        self.settings.inactivity_timeout_secs = secs;
        self.save().await
    }

    /// Set or clear the identity provider and save
    pub async fn set_identity(&mut self, identity: Option<IdentitySettings>) -> Result<()> {
        self.settings.identity = identity;
        self.save().await
    }

    /// Reset settings to defaults and delete settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file)
                .await
                .map_err(|e| VaultError::StorageError(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let settings = manager.get();
        assert_eq!(settings.inactivity_timeout(), Duration::from_secs(30));
        assert_eq!(settings.activity_check_interval(), Duration::from_secs(1));
        assert!(settings.identity.is_none());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path());
            manager.get_mut().inactivity_timeout_secs = 120;
            manager.get_mut().identity = Some(IdentitySettings {
                endpoint: "http://localhost:9099/v1/accounts:signInWithPassword".to_string(),
                api_key: None,
                email_domain: "passvault.local".to_string(),
            });
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path());
            assert_eq!(manager.get().inactivity_timeout_secs, 120);
            assert_eq!(
                manager.get().identity.as_ref().map(|i| i.email_domain.as_str()),
                Some("passvault.local")
            );
        }
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{ "inactivityTimeoutSecs": 45 }"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get().inactivity_timeout_secs, 45);
        assert_eq!(manager.get().activity_check_interval_secs, 1);
        assert_eq!(manager.get().version, 1);
    }

    #[tokio::test]
    async fn test_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());

        manager.set_inactivity_timeout(5).await.unwrap();
        assert!(temp_dir.path().join("settings.json").exists());

        manager.reset().await.unwrap();
        assert_eq!(manager.get(), &Settings::default());
        assert!(!temp_dir.path().join("settings.json").exists());
    }
}
