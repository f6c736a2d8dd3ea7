//! Track groups - selectable video, audio and subtitle streams
//!
//! Inventories are rebuilt wholesale after every engine reconfiguration, because
//! native track indices are not stable across reconfiguration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of decoding stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
    /// Subtitle / caption stream
    Text,
}

impl TrackKind {
    /// Parse the engine's track type name
    pub fn from_native(name: &str) -> Option<Self> {
        match name {
            "video" => Some(TrackKind::Video),
            "audio" => Some(TrackKind::Audio),
            "sub" => Some(TrackKind::Text),
            _ => None,
        }
    }

    /// Engine property that selects a track of this kind
    pub fn selection_property(&self) -> &'static str {
        match self {
            TrackKind::Video => "vid",
            TrackKind::Audio => "aid",
            TrackKind::Text => "sid",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "text",
        };
        f.pad(name)
    }
}

/// One selectable stream exposed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackGroup {
    /// Synthesized identifier, `{index}:{external}:{native_id}`
    pub id: String,
    /// Position in the engine's track list at build time
    pub index: usize,
    /// Stream kind
    pub kind: TrackKind,
    /// Engine-side track id, unique per kind
    pub native_id: i64,
    /// Language tag
    pub language: Option<String>,
    /// Codec name
    pub codec_name: Option<String>,
    /// Title reported by the container or the side-loaded file
    pub label: Option<String>,
    /// Audio channel count
    pub channel_count: Option<u32>,
    /// Flagged as default in the container
    pub is_default: bool,
    /// Flagged as forced in the container
    pub is_forced: bool,
    /// Loaded from a separate file
    pub is_external: bool,
    /// Currently selected by the engine
    pub is_selected: bool,
}

impl TrackGroup {
    /// Build the stable identifier for a track
    pub fn synthesize_id(index: usize, is_external: bool, native_id: i64) -> String {
        format!("{}:{}:{}", index, u8::from(is_external), native_id)
    }
}

/// Immutable set of track groups, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackInventory {
    groups: Arc<[TrackGroup]>,
}

impl TrackInventory {
    /// Inventory with no tracks
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an already built list of groups
    pub fn new(groups: Vec<TrackGroup>) -> Self {
        Self {
            groups: groups.into(),
        }
    }

    /// All groups in engine order
    pub fn groups(&self) -> &[TrackGroup] {
        &self.groups
    }

    /// Groups of one kind
    pub fn of_kind(&self, kind: TrackKind) -> impl Iterator<Item = &TrackGroup> {
        self.groups.iter().filter(move |g| g.kind == kind)
    }

    /// Selected group of one kind, if any
    pub fn selected(&self, kind: TrackKind) -> Option<&TrackGroup> {
        self.of_kind(kind).find(|g| g.is_selected)
    }

    /// Look up a group by its synthesized identifier
    pub fn find(&self, id: &str) -> Option<&TrackGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// No groups at all
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Caller request to change which track of a kind is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelectionOverride {
    /// Select exactly this group
    Select(TrackGroup),
    /// Turn off every track of this kind
    Disable(TrackKind),
}

impl TrackSelectionOverride {
    /// Kind affected by this override
    pub fn kind(&self) -> TrackKind {
        match self {
            TrackSelectionOverride::Select(group) => group.kind,
            TrackSelectionOverride::Disable(kind) => *kind,
        }
    }
}
