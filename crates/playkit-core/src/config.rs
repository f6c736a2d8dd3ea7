//! Player configuration
//!
//! Loaded from TOML; every field has a default so partial files are accepted.

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A (name, value) option written to the engine before it is initialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOption {
    /// Option name
    pub name: String,
    /// Option value
    pub value: String,
}

impl EngineOption {
    /// Create an option
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Configuration of one player instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Options applied in order before initialization
    pub engine_options: Vec<EngineOption>,
    /// Video output enabled while a render target is attached
    pub video_output: String,
    /// Demuxer read-ahead limit in seconds
    pub demuxer_cache_secs: Option<f64>,
    /// Minimum level of native log lines forwarded to tracing
    pub log_level: String,
    /// Start with the engine paused
    pub start_paused: bool,
    /// Prefix for worker thread names
    pub thread_name_prefix: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            engine_options: vec![
                EngineOption::new("vo", "null"),
                EngineOption::new("hwdec", "auto-safe"),
                EngineOption::new("keep-open", "no"),
                EngineOption::new("idle", "yes"),
                EngineOption::new("msg-level", "all=warn"),
            ],
            video_output: "gpu".to_string(),
            demuxer_cache_secs: None,
            log_level: "warn".to_string(),
            start_paused: true,
            thread_name_prefix: "playkit".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PlayerConfig =
            toml::from_str(text).map_err(|e| PlayerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Reject values the engine cannot use
    pub fn validate(&self) -> Result<()> {
        if self.video_output.trim().is_empty() {
            return Err(PlayerError::Config(
                "video_output must not be empty".to_string(),
            ));
        }
        if let Some(secs) = self.demuxer_cache_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(PlayerError::Config(format!(
                    "demuxer_cache_secs must be positive, got {}",
                    secs
                )));
            }
        }
        if self.engine_options.iter().any(|o| o.name.trim().is_empty()) {
            return Err(PlayerError::Config(
                "engine option names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// All options to write before initialization, derived settings included
    pub fn initial_options(&self) -> Vec<EngineOption> {
        let mut options = self.engine_options.clone();
        options.push(EngineOption::new(
            "pause",
            if self.start_paused { "yes" } else { "no" },
        ));
        if let Some(secs) = self.demuxer_cache_secs {
            options.push(EngineOption::new(
                "demuxer-readahead-secs",
                format!("{}", secs),
            ));
        }
        options
    }
}
