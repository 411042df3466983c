//! Configuration management for StitchFlow.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Presence broadcaster timing
    pub presence: PresenceConfig,

    /// Advisory provider settings
    pub ai: AiConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override for the directory holding profile, project and presence documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Presence (collaboration indicator) timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// How often the shared medium is re-read
    pub poll_interval_ms: u64,

    /// How often this session refreshes its own entry
    pub heartbeat_interval_ms: u64,

    /// Entries older than this are dropped from the visible set
    pub expiry_ms: u64,
}

impl PresenceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    pub fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms)
    }
}

/// Advisory provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Whether advisory features are enabled
    pub enabled: bool,

    /// Provider name (only "gemini" is built in)
    pub provider: String,

    /// API key; falls back to GEMINI_API_KEY / API_KEY
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the generative language API
    pub base_url: String,

    /// Model used for deep analysis (advice, risks, follow-ups, costing)
    pub pro_model: String,

    /// Model used for quick calls (feed, skills evaluation)
    pub flash_model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.stitchflow.toml` in current directory
    /// 2. `~/.config/stitchflow/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".stitchflow.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to the global config file and return its path.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        let path = config_dir.join("config.toml");
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("stitchflow"))
    }

    /// Get the data directory path (profile, projects, presence).
    ///
    /// `general.data_dir` wins over the platform default.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.general.data_dir.clone().or_else(|| dirs::data_dir().map(|d| d.join("stitchflow")))
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 2_000, heartbeat_interval_ms: 3_000, expiry_ms: 10_000 }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "gemini".to_string(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            pro_model: "gemini-3-pro-preview".to_string(),
            flash_model: "gemini-3-flash-preview".to_string(),
            timeout_secs: 60,
        }
    }
}
