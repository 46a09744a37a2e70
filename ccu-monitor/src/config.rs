//! Configuration management
//!
//! Handles:
//! - Games API endpoint, user agent and request timeout
//! - Presentation settings (replay pacing, colours)
//! - Cross-platform lookup of an optional `config.toml`
//!
//! The monitor only ever reads this file; a missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub api: ApiConfig,
    pub presentation: PresentationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub games_base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Pause after each first-universe line during the comparison replay
    pub pacing_delay_ms: u64,
    pub color: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            games_base_url: "https://games.roblox.com".to_string(),
            user_agent: "RobloxMonitor".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: 1000,
            color: true,
        }
    }
}

impl PresentationConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

impl MonitorConfig {
    /// Load config from the OS-specific location, defaults if absent
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: MonitorConfig =
            toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get OS-specific config file path
    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("ccu-monitor");
        path.push("config.toml");
        Ok(path)
    }
}
