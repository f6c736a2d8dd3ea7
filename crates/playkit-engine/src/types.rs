//! Values crossing the native boundary

/// Format requested when observing a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyFormat {
    /// 64-bit integer
    Int,
    /// Double precision float
    Double,
    /// Boolean flag
    Flag,
    /// UTF-8 string
    String,
}

/// A typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// 64-bit integer
    Int(i64),
    /// Double precision float
    Double(f64),
    /// Boolean flag
    Flag(bool),
    /// UTF-8 string
    Str(String),
}

impl PropertyValue {
    /// Format of this value
    pub fn format(&self) -> PropertyFormat {
        match self {
            PropertyValue::Int(_) => PropertyFormat::Int,
            PropertyValue::Double(_) => PropertyFormat::Double,
            PropertyValue::Flag(_) => PropertyFormat::Flag,
            PropertyValue::Str(_) => PropertyFormat::String,
        }
    }

    /// Numeric value as f64, for Int and Double
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as i64, for Int and Double
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Double(v) if v.is_finite() => Some(v.round() as i64),
            _ => None,
        }
    }

    /// Flag value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    /// String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Lifecycle events pushed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    /// Started loading a file
    StartFile,
    /// File was opened and decoding can begin
    FileLoaded,
    /// Playback resumed after a seek or load
    PlaybackRestart,
    /// Video output was reconfigured
    VideoReconfig,
    /// Audio output was reconfigured
    AudioReconfig,
    /// A seek was initiated
    Seek,
    /// Engine is idle with nothing loaded
    Idle,
    /// Engine is shutting down
    Shutdown,
}

/// Reason attached to an end-of-file notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndFileReason {
    /// Natural end of stream
    Eof,
    /// Stopped by a command (stop, loadfile replace)
    Stop,
    /// Engine is quitting
    Quit,
    /// Playback failed; see the accompanying error code
    Error,
    /// Redirected to another source (playlist expansion)
    Redirect,
    /// Reason not known to this crate
    Unknown(i64),
}

impl EndFileReason {
    /// Map libmpv's `mpv_end_file_reason` value
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => EndFileReason::Eof,
            2 => EndFileReason::Stop,
            3 => EndFileReason::Quit,
            4 => EndFileReason::Error,
            5 => EndFileReason::Redirect,
            other => EndFileReason::Unknown(other),
        }
    }
}

/// Severity of a native log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fatal error
    Fatal,
    /// Error
    Error,
    /// Warning
    Warn,
    /// Informational
    Info,
    /// Verbose
    Verbose,
    /// Debug
    Debug,
    /// Trace
    Trace,
}

impl LogLevel {
    /// Parse libmpv's level names
    pub fn from_native(name: &str) -> Option<Self> {
        match name {
            "fatal" => Some(LogLevel::Fatal),
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "v" => Some(LogLevel::Verbose),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// libmpv's name for this level
    pub fn as_native(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Verbose => "v",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
