//! Playkit Core - Playback Data Model
//!
//! This crate contains the value types shared by the player adapter and its callers:
//! - Immutable playback state snapshots
//! - Media descriptors and loaded media references
//! - Track groups and selection overrides
//! - Commands understood by the command thread
//! - Listener events and the error taxonomy
//! - Player and logging configuration

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod media;
pub mod state;
pub mod track;

pub use command::{Command, RenderTarget, TrackValue};
pub use config::{EngineOption, PlayerConfig};
pub use error::{PlaybackError, PlayerError, Result};
pub use event::PlayerEvent;
pub use logging::LogConfig;
pub use media::{ExternalSubtitle, LoadedMedia, MediaDescriptor};
pub use state::{LifecycleState, PlaybackState, VideoSize, TIME_UNSET};
pub use track::{TrackGroup, TrackInventory, TrackKind, TrackSelectionOverride};

/// Convert an engine time value in seconds to whole milliseconds.
///
/// Non-finite input yields [`TIME_UNSET`]; negative input clamps to zero.
pub fn seconds_to_ms(seconds: f64) -> i64 {
    if !seconds.is_finite() {
        return TIME_UNSET;
    }
    (seconds.max(0.0) * 1000.0).round() as i64
}

/// Convert milliseconds to the seconds representation used by the engine.
pub fn ms_to_seconds(ms: i64) -> f64 {
    ms as f64 / 1000.0
}
