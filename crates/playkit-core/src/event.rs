//! Listener events

use crate::error::PlaybackError;
use crate::media::MediaDescriptor;
use crate::state::{LifecycleState, VideoSize};
use crate::track::TrackInventory;
use std::sync::Arc;

/// Notification delivered to registered listeners on the delivery thread
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Lifecycle state changed
    PlaybackStateChanged(LifecycleState),
    /// Playing flag changed
    IsPlayingChanged(bool),
    /// Combined loading flag changed
    IsLoadingChanged(bool),
    /// Track inventory was rebuilt
    TracksChanged(TrackInventory),
    /// First frame of the loaded media is available
    RenderedFirstFrame,
    /// The loaded media is now playing
    MediaItemTransition(Arc<MediaDescriptor>),
    /// Displayed video size changed
    VideoSizeChanged(VideoSize),
    /// Playback failed
    Error(PlaybackError),
}

impl PlayerEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::PlaybackStateChanged(_) => "playback-state-changed",
            PlayerEvent::IsPlayingChanged(_) => "is-playing-changed",
            PlayerEvent::IsLoadingChanged(_) => "is-loading-changed",
            PlayerEvent::TracksChanged(_) => "tracks-changed",
            PlayerEvent::RenderedFirstFrame => "rendered-first-frame",
            PlayerEvent::MediaItemTransition(_) => "media-item-transition",
            PlayerEvent::VideoSizeChanged(_) => "video-size-changed",
            PlayerEvent::Error(_) => "player-error",
        }
    }
}
