use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::account::AccountSettings;
use crate::error::{GmailError, Result};
use crate::hierarchy::HierarchyOptions;
use crate::models::DetailLevel;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub messages: MessageConfig,
    #[serde(default)]
    pub hierarchy: HierarchyOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_load_labels")]
    pub load_labels: bool,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            load_labels: default_load_labels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_cache_path: default_token_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Labels left out of tree counts, matched on full name
    #[serde(default = "default_skip_labels")]
    pub skip: Vec<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            skip: default_skip_labels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageConfig {
    /// Detail level used when listing messages
    #[serde(default)]
    pub detail: DetailLevel,
}

fn default_user_id() -> String {
    "me".to_string()
}

fn default_load_labels() -> bool {
    true
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from(".gmail-labels/token.json")
}

fn default_skip_labels() -> Vec<String> {
    ["CHAT", "IMPORTANT", "SENT", "TRASH", "UNREAD", "STARRED"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GmailError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.account.user_id.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "account.user_id cannot be empty".to_string(),
            ));
        }

        if self.auth.credentials_path.as_os_str().is_empty() {
            return Err(GmailError::ConfigError(
                "auth.credentials_path cannot be empty".to_string(),
            ));
        }
        if self.auth.token_cache_path.as_os_str().is_empty() {
            return Err(GmailError::ConfigError(
                "auth.token_cache_path cannot be empty".to_string(),
            ));
        }

        for name in &self.labels.skip {
            if name.trim().is_empty() {
                return Err(GmailError::ConfigError(
                    "labels.skip cannot contain empty strings".to_string(),
                ));
            }
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }

    pub fn account_settings(&self) -> AccountSettings {
        AccountSettings {
            user_id: self.account.user_id.clone(),
            load_labels: self.account.load_labels,
            hierarchy: self.hierarchy,
        }
    }
}
