//! Native engine traits
//!
//! The engine is not safe for concurrent invocation. Implementations are owned
//! by exactly one thread at a time, which is why every call takes `&mut self`.
//! Notifications flow the other way through an [`EngineObserver`], invoked on
//! threads the engine controls.

use crate::error::Result;
use crate::types::{EndFileReason, EngineEvent, LogLevel, PropertyFormat, PropertyValue};
use std::sync::Arc;

/// Callback surface invoked by the engine on its own threads
pub trait EngineObserver: Send + Sync {
    /// An observed property changed
    fn on_property_changed(&self, name: &str, value: PropertyValue);

    /// A lifecycle event occurred
    fn on_event(&self, event: EngineEvent);

    /// The current file ended
    fn on_end_of_file(&self, reason: EndFileReason, error_code: i32);

    /// The engine emitted a log line
    fn on_log_message(&self, prefix: &str, level: LogLevel, text: &str);
}

/// Contract of a native decoding/rendering engine
pub trait NativeEngine: Send {
    /// Create the native instance. Options may be written afterwards until [`initialize`](Self::initialize).
    fn create(&mut self) -> Result<()>;

    /// Write a pre-initialization option
    fn set_option_string(&mut self, name: &str, value: &str) -> Result<()>;

    /// Start the engine and register `observer` for notifications
    fn initialize(&mut self, observer: Arc<dyn EngineObserver>) -> Result<()>;

    /// Stop delivering notifications to the registered observer
    fn remove_observer(&mut self);

    /// Tear the native instance down. Safe to call more than once.
    fn destroy(&mut self);

    /// Register a native render target
    fn attach_render_target(&mut self, handle: i64) -> Result<()>;

    /// Unregister the current render target
    fn detach_render_target(&mut self) -> Result<()>;

    /// Run a scripting verb, `args[0]` being the verb
    fn command(&mut self, args: &[&str]) -> Result<()>;

    /// Read an integer property
    fn get_property_int(&mut self, name: &str) -> Result<i64>;

    /// Read a double property
    fn get_property_double(&mut self, name: &str) -> Result<f64>;

    /// Read a flag property
    fn get_property_bool(&mut self, name: &str) -> Result<bool>;

    /// Read a string property
    fn get_property_string(&mut self, name: &str) -> Result<String>;

    /// Write an integer property
    fn set_property_int(&mut self, name: &str, value: i64) -> Result<()>;

    /// Write a double property
    fn set_property_double(&mut self, name: &str, value: f64) -> Result<()>;

    /// Write a flag property
    fn set_property_bool(&mut self, name: &str, value: bool) -> Result<()>;

    /// Write a string property
    fn set_property_string(&mut self, name: &str, value: &str) -> Result<()>;

    /// Opt into change notifications for `name`
    fn observe_property(&mut self, name: &str, format: PropertyFormat) -> Result<()>;

    /// Ask for log lines at `level` and above
    fn request_log_messages(&mut self, level: LogLevel) -> Result<()>;
}
