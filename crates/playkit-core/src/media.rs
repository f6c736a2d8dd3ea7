//! Media descriptors handed to the player by callers

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A subtitle file that lives next to the media rather than inside its container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSubtitle {
    /// Location the engine can open
    pub uri: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Language tag (e.g. "en", "deu")
    #[serde(default)]
    pub language: Option<String>,
}

impl ExternalSubtitle {
    /// Create a subtitle reference without title or language
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: None,
            language: None,
        }
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Description of a playable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Caller-side identifier
    pub id: String,
    /// Location the engine can open
    pub uri: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Side-loaded subtitles attached once the file is loaded
    #[serde(default)]
    pub external_subtitles: Vec<ExternalSubtitle>,
}

impl MediaDescriptor {
    /// Create a descriptor for `uri`
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            title: None,
            external_subtitles: Vec::new(),
        }
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add an external subtitle
    pub fn with_subtitle(mut self, subtitle: ExternalSubtitle) -> Self {
        self.external_subtitles.push(subtitle);
        self
    }
}

/// The media currently loaded into the engine, with its requested start offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMedia {
    /// What was loaded
    pub descriptor: Arc<MediaDescriptor>,
    /// Requested start position in milliseconds
    pub start_offset_ms: i64,
}

impl LoadedMedia {
    /// Wrap a descriptor; negative offsets clamp to zero
    pub fn new(descriptor: MediaDescriptor, start_offset_ms: i64) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            start_offset_ms: start_offset_ms.max(0),
        }
    }
}
