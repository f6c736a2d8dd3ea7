//! On-disk configuration for the driver

use anyhow::{Context, Result};
use playkit_core::{LogConfig, PlayerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level TOML document: `[log]` and `[player]` tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub player: PlayerConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: AppConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config.player.validate()?;
        Ok(config)
    }
}
