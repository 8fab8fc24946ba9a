//! Fixdesk configuration.
//!
//! Config file: ~/.config/fixdesk/config.toml or /etc/fixdesk/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Notification delivery backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierBackend {
    /// Record deliveries in the daemon log
    Log,
}

impl Default for NotifierBackend {
    fn default() -> Self {
        Self::Log
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: PathBuf,
}

impl DatabaseConfig {
    fn default_path() -> PathBuf {
        // XDG_DATA_HOME first, fall back to ~/.local/share
        let base_dir = if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg_data)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local/share")
        } else {
            PathBuf::from("/var/lib")
        };
        base_dir.join("fixdesk").join("fixdesk.db")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

/// Outbox dispatch worker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Seconds between dispatch passes
    #[serde(default = "DispatchConfig::default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum entries delivered per pass
    #[serde(default = "DispatchConfig::default_batch_size")]
    pub batch_size: usize,
}

impl DispatchConfig {
    fn default_poll_interval() -> u64 {
        30
    }

    fn default_batch_size() -> usize {
        50
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: Self::default_poll_interval(),
            batch_size: Self::default_batch_size(),
        }
    }
}

/// Notifier settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub backend: NotifierBackend,
}

/// Main Fixdesk configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixdeskConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl FixdeskConfig {
    /// Default user config path: ~/.config/fixdesk/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("XDG_CONFIG_HOME"))
            .context("Cannot determine home directory")?;

        let config_dir = if home.contains("/.config") {
            PathBuf::from(home)
        } else {
            Path::new(&home).join(".config")
        };

        Ok(config_dir.join("fixdesk").join("config.toml"))
    }

    /// System config path: /etc/fixdesk/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/fixdesk/config.toml")
    }

    /// Load configuration.
    ///
    /// Priority:
    /// 1. Explicit path (if given)
    /// 2. User config (~/.config/fixdesk/config.toml)
    /// 3. System config (/etc/fixdesk/config.toml)
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::from_file(&system_path);
        }

        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: FixdeskConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}
