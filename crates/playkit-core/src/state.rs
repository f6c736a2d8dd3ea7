//! Playback State - immutable snapshot of everything a caller can observe
//!
//! A [`PlaybackState`] is never mutated after it has been published. Every change
//! produces a whole new value derived from the previous one, so readers always
//! see a complete snapshot.

use crate::media::LoadedMedia;
use crate::track::TrackInventory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sentinel for a time value (position, buffer, duration) that is not known yet.
pub const TIME_UNSET: i64 = i64::MIN + 1;

/// Coarse player lifecycle.
///
/// There is deliberately no buffering value: stalls are reported through
/// [`PlaybackState::is_buffering`] and the combined loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Nothing loaded, or the last load failed.
    #[default]
    Idle,
    /// Media is loaded and can render.
    Ready,
    /// Playback reached the natural end of the stream.
    Ended,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Idle => "IDLE",
            LifecycleState::Ready => "READY",
            LifecycleState::Ended => "ENDED",
        };
        f.write_str(name)
    }
}

/// Displayed video geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VideoSize {
    /// Width in pixels (0 while unknown)
    pub width: u32,
    /// Height in pixels (0 while unknown)
    pub height: u32,
}

impl VideoSize {
    /// Create a new size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are known
    pub fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Snapshot of all observable playback facts
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Instant this snapshot was produced
    pub timestamp: Instant,
    /// Lifecycle state
    pub lifecycle: LifecycleState,
    /// A load command was issued and the engine has not reported the file as loaded
    pub is_loading_file: bool,
    /// The engine stalled waiting for data
    pub is_buffering: bool,
    /// Engine pause flag
    pub is_paused: bool,
    /// Currently loaded media and its requested start offset
    pub media: Option<Arc<LoadedMedia>>,
    /// Playback position in milliseconds, or [`TIME_UNSET`]
    pub position_ms: i64,
    /// Buffered-ahead position in milliseconds, or [`TIME_UNSET`]
    pub buffer_ms: i64,
    /// Stream duration in milliseconds, or [`TIME_UNSET`]
    pub duration_ms: i64,
    /// Playback speed multiplier
    pub speed: f64,
    /// Subtitle delay in seconds
    pub subtitle_delay_seconds: f64,
    /// Displayed video size, once the engine reported one
    pub video_size: Option<VideoSize>,
    /// Current track inventory
    pub tracks: TrackInventory,
}

impl PlaybackState {
    /// The EMPTY snapshot: nothing loaded, every time unknown, paused.
    pub fn empty() -> Self {
        Self {
            timestamp: Instant::now(),
            lifecycle: LifecycleState::Idle,
            is_loading_file: false,
            is_buffering: false,
            is_paused: true,
            media: None,
            position_ms: TIME_UNSET,
            buffer_ms: TIME_UNSET,
            duration_ms: TIME_UNSET,
            speed: 1.0,
            subtitle_delay_seconds: 0.0,
            video_size: None,
            tracks: TrackInventory::empty(),
        }
    }

    /// Whether the adapter considers playback to be running
    pub fn is_playing(&self) -> bool {
        !self.is_paused
    }

    /// Combined loading flag reported to callers
    pub fn is_loading(&self) -> bool {
        self.is_loading_file || self.is_buffering
    }

    /// Age of this snapshot relative to `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.timestamp)
    }

    /// Whether this snapshot is older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age(Instant::now()) > max_age
    }

    /// This snapshot stamped with the current time
    pub fn refreshed(self) -> Self {
        Self {
            timestamp: Instant::now(),
            ..self
        }
    }

    /// Snapshot describing a freshly issued load of `media`
    pub fn loading(&self, media: Arc<LoadedMedia>) -> Self {
        Self {
            lifecycle: LifecycleState::Idle,
            is_loading_file: true,
            is_buffering: false,
            position_ms: media.start_offset_ms,
            buffer_ms: TIME_UNSET,
            duration_ms: TIME_UNSET,
            video_size: None,
            tracks: TrackInventory::empty(),
            media: Some(media),
            ..self.clone()
        }
    }

    /// Snapshot with the loaded media dropped (stop, failed load)
    pub fn unloaded(&self) -> Self {
        Self {
            lifecycle: LifecycleState::Idle,
            is_loading_file: false,
            is_buffering: false,
            media: None,
            position_ms: TIME_UNSET,
            buffer_ms: TIME_UNSET,
            duration_ms: TIME_UNSET,
            video_size: None,
            tracks: TrackInventory::empty(),
            ..self.clone()
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::empty()
    }
}
