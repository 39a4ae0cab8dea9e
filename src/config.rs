//! Configuration Management
//!
//! Handles persistent configuration storage for dashcode. Values are layered
//! CLI > environment > config file > defaults.

use crate::grafana::auth::{self, Credentials};
use crate::grafana::http::DEFAULT_TIMEOUT;
use crate::resource::Format;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default directory resources are read from and pulled into
pub const DEFAULT_RESOURCES_DIR: &str = "resources";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Grafana base URL, e.g. `http://localhost:3000`
    #[serde(default)]
    pub url: Option<String>,
    /// Service account token
    #[serde(default)]
    pub token: Option<String>,
    /// Basic auth user
    #[serde(default)]
    pub user: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Directory holding resource files
    #[serde(default)]
    pub resources_dir: Option<PathBuf>,
    /// File format used when pulling
    #[serde(default)]
    pub format: Option<Format>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dashcode").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific file; missing or invalid files
    /// yield the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Overlay `GRAFANA_*` environment variables
    pub fn with_env(self) -> Self {
        self.with_lookup(auth::env_var)
    }

    /// Overlay settings from an arbitrary lookup (the environment in practice)
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(auth::URL_ENV) {
            self.url = Some(url);
        }
        if let Some(token) = lookup(auth::TOKEN_ENV) {
            self.token = Some(token);
        }
        if let Some(user) = lookup(auth::USER_ENV) {
            self.user = Some(user);
        }
        if let Some(password) = lookup(auth::PASSWORD_ENV) {
            self.password = Some(password);
        }
        self
    }

    /// Get effective Grafana URL, if any
    pub fn effective_url(&self) -> Option<String> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::from_parts(
            self.token.as_deref(),
            self.user.as_deref(),
            self.password.as_deref(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn effective_resources_dir(&self) -> PathBuf {
        self.resources_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES_DIR))
    }

    pub fn effective_format(&self) -> Format {
        self.format.unwrap_or_default()
    }
}
