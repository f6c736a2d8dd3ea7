//! Commands applied by the command thread
//!
//! Commands carry no reply channel. Completion is observed through later
//! snapshot updates and listener events.

use crate::media::LoadedMedia;
use std::sync::Arc;

/// Opaque handle of a native render target (window id or surface pointer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget(i64);

impl RenderTarget {
    /// Wrap a raw handle
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw handle passed to the engine
    pub fn raw(&self) -> i64 {
        self.0
    }
}

/// Value written to a track selection property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackValue {
    /// Select the track with this native id
    Id(i64),
    /// Disable the track kind
    Disabled,
}

/// A unit of work for the command thread
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create, configure and initialize the engine
    Initialize,
    /// Resume (`true`) or pause (`false`)
    SetPlayWhenReady(bool),
    /// Absolute seek in milliseconds
    Seek(i64),
    /// Replace the current media
    Load(Arc<LoadedMedia>),
    /// Stop playback and unload the media
    Stop,
    /// Playback speed multiplier
    SetSpeed(f64),
    /// Write a track selection property
    SetTrack {
        /// Selection property (`vid`, `aid` or `sid`)
        property: &'static str,
        /// Value to write
        value: TrackValue,
    },
    /// Subtitle delay in seconds
    SetSubtitleDelay(f64),
    /// Attach (or switch to) a render target
    AttachSurface(RenderTarget),
    /// Detach the current render target
    DetachSurface,
    /// Engine reported the file as loaded
    FileLoaded,
    /// Rebuild the track inventory after a reconfiguration
    RefreshTracks,
    /// Tear everything down; the command thread exits afterwards
    Destroy,
}

impl Command {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize => "initialize",
            Command::SetPlayWhenReady(_) => "set-play-when-ready",
            Command::Seek(_) => "seek",
            Command::Load(_) => "load",
            Command::Stop => "stop",
            Command::SetSpeed(_) => "set-speed",
            Command::SetTrack { .. } => "set-track",
            Command::SetSubtitleDelay(_) => "set-subtitle-delay",
            Command::AttachSurface(_) => "attach-surface",
            Command::DetachSurface => "detach-surface",
            Command::FileLoaded => "file-loaded",
            Command::RefreshTracks => "refresh-tracks",
            Command::Destroy => "destroy",
        }
    }

    /// The command thread stops after applying this command
    pub fn is_terminal(&self) -> bool {
        matches!(self, Command::Destroy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_destroy_is_terminal() {
        assert!(Command::Destroy.is_terminal());
        assert!(!Command::Stop.is_terminal());
        assert!(!Command::DetachSurface.is_terminal());
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Seek(10).name(), "seek");
        assert_eq!(
            Command::SetTrack {
                property: "aid",
                value: TrackValue::Id(2)
            }
            .name(),
            "set-track"
        );
    }

    #[test]
    fn test_render_target_raw() {
        assert_eq!(RenderTarget::new(0x51).raw(), 0x51);
        assert_ne!(RenderTarget::new(1), RenderTarget::new(2));
    }
}
