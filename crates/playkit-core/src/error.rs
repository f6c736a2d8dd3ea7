//! Error types for the player
use thiserror::Error;

/// Errors returned synchronously by player operations
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The player was released; no further mutations are accepted
    #[error("Player has been released")]
    Released,

    /// The operation is not implemented by this engine
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// An argument was out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded or failed validation
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error (thread spawn, config file access)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// A playback failure delivered to listeners
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Playback error {code}: {message}")]
pub struct PlaybackError {
    /// Native status code, preserved as reported by the engine
    pub code: i32,
    /// Human-readable description
    pub message: String,
}

impl PlaybackError {
    /// Create a playback error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_error_display_keeps_code() {
        let err = PlaybackError::new(-13, "loading failed");
        assert_eq!(err.to_string(), "Playback error -13: loading failed");
    }

    #[test]
    fn test_io_conversion() {
        let err: PlayerError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, PlayerError::Io(_)));
    }
}
