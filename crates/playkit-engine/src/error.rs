//! Error types for native engine calls
use thiserror::Error;

/// Generic failure status, used when the engine gives no better code
pub const STATUS_GENERIC: i32 = -20;
/// The engine instance was not initialized
pub const STATUS_UNINITIALIZED: i32 = -3;
/// The requested property does not exist or has no value right now
pub const STATUS_PROPERTY_UNAVAILABLE: i32 = -10;

/// Native engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Call made before `initialize` or after `destroy`
    #[error("Engine not initialized")]
    NotInitialized,

    /// Native instance could not be created
    #[error("Engine creation failed: {0}")]
    Create(String),

    /// Native call returned a negative status
    #[error("{context} failed with status {code}")]
    Status {
        /// Native status code
        code: i32,
        /// Which call failed
        context: String,
    },

    /// Property has no value (yet)
    #[error("Property unavailable: {0}")]
    PropertyUnavailable(String),
}

impl EngineError {
    /// Build a status error
    pub fn status(code: i32, context: impl Into<String>) -> Self {
        EngineError::Status {
            code,
            context: context.into(),
        }
    }

    /// Native status code carried by this error
    pub fn code(&self) -> i32 {
        match self {
            EngineError::NotInitialized => STATUS_UNINITIALIZED,
            EngineError::Create(_) => STATUS_GENERIC,
            EngineError::Status { code, .. } => *code,
            EngineError::PropertyUnavailable(_) => STATUS_PROPERTY_UNAVAILABLE,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(EngineError::status(-13, "loadfile").code(), -13);
        assert_eq!(EngineError::NotInitialized.code(), STATUS_UNINITIALIZED);
        assert_eq!(
            EngineError::PropertyUnavailable("duration".into()).code(),
            STATUS_PROPERTY_UNAVAILABLE
        );
    }

    #[test]
    fn test_display() {
        let err = EngineError::status(-4, "command loadfile");
        assert_eq!(err.to_string(), "command loadfile failed with status -4");
    }
}
