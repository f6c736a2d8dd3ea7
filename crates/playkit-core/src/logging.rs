//! Logging configuration
//!
//! Describes where log output goes; the subscriber itself is installed by the
//! binary that owns the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

const LOG_FILE_PREFIX: &str = "playkit_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name: error, warn, info, debug, trace or off
    pub level: String,
    /// Write to stderr
    pub console_output: bool,
    /// Write to a file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Number of log files kept when cleaning up
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        if self.file_output {
            std::fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path of today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d");
        self.log_dir
            .join(format!("{}{}{}", LOG_FILE_PREFIX, stamp, LOG_FILE_SUFFIX))
    }

    /// Delete the oldest log files beyond `max_log_files`; returns how many were removed
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_dir.is_dir() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = std::fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_log_file(path))
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Date-stamped names sort chronologically
        logs.sort();
        let excess = logs.len() - self.max_log_files;
        for path in &logs[..excess] {
            std::fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
        .unwrap_or(false)
}
