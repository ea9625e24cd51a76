//! Manager configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. Command line flags (applied by the CLI on top of the loaded config)
//! 2. `~/.config/nodepack/config.yaml`
//! 3. Built-in defaults
//!
//! ```yaml
//! server_url: http://127.0.0.1:8188
//! mode: local             # url | local
//! skip_update_check: true
//! timeout_seconds: 30
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default manager server
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8188";

/// Minimum request timeout; package installs take a while
pub const MIN_TIMEOUT_SECONDS: u64 = 5;

/// Which package database the server consults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbMode {
    /// Remote channel database
    #[default]
    Url,
    /// Database bundled with the server
    Local,
}

impl DbMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbMode::Url => "url",
            DbMode::Local => "local",
        }
    }
}

impl fmt::Display for DbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default)]
    pub mode: DbMode,

    /// Don't ask the server to check installed packages for updates
    #[serde(default)]
    pub skip_update_check: bool,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            mode: DbMode::default(),
            skip_update_check: false,
            timeout_seconds: default_timeout(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path, defaults if it doesn't exist
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            anyhow::bail!(
                "Server URL must start with http:// or https:// (got '{}')",
                self.server_url
            );
        }
        Ok(())
    }

    /// Request timeout, clamped to [`MIN_TIMEOUT_SECONDS`]
    pub fn effective_timeout(&self) -> std::time::Duration {
        let seconds = if self.timeout_seconds < MIN_TIMEOUT_SECONDS {
            warn!(
                "Configured timeout_seconds={} is too low; using minimum of {} seconds",
                self.timeout_seconds, MIN_TIMEOUT_SECONDS
            );
            MIN_TIMEOUT_SECONDS
        } else {
            self.timeout_seconds
        };
        std::time::Duration::from_secs(seconds)
    }

    /// Server URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = directories::ProjectDirs::from("io", "nodepack", "nodepack")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("nodepack")))
            .context("Could not determine config directory")?;

        Ok(config_dir.join("config.yaml"))
    }
}
