//! Client configuration handling.

use anyhow::{Context, Result, bail};
use booksmart_core::SessionSettings;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the library service.
    pub base_url: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Access token lifetime in seconds; tokens are refreshed this often.
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Books per catalog page.
    pub page_limit: u32,

    /// Rejected refreshes in a row before the session is dropped.
    pub max_auth_rejections: u32,

    /// Logging level.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            config_path: PathBuf::new(),
            access_token_ttl_secs: 300,
            refresh_token_ttl_secs: 43_200,
            request_timeout_secs: 10,
            page_limit: 10,
            max_auth_rejections: 3,
            log_level: "warn".to_string(),
        }
    }
}

impl ClientConfig {
    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.access_token_ttl_secs == 0 {
            bail!("access_token_ttl_secs must be greater than zero");
        }
        if self.refresh_token_ttl_secs == 0 {
            bail!("refresh_token_ttl_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.page_limit == 0 {
            bail!("page_limit must be greater than zero");
        }
        Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url {:?}", self.base_url))?;
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            base_url: self.base_url.clone(),
            access_token_ttl: Duration::from_secs(self.access_token_ttl_secs),
            refresh_token_ttl: Duration::from_secs(self.refresh_token_ttl_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            page_limit: self.page_limit,
            max_auth_rejections: self.max_auth_rejections.max(1),
        }
    }
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    };

    let mut config = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        ClientConfig::default()
    };

    config.config_path = config_path;
    Ok(config)
}

fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("client.toml"))
        .unwrap_or_else(|| PathBuf::from("booksmart-client.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "booksmart", "booksmart")
}
