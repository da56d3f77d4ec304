//! Media assets for playview
//!
//! A `MediaSource` is the opaque locator handed in by the embedding view. The
//! `AssetLoader` turns it into a `MediaItem` by asking an `AssetResolver` (the
//! platform media framework) for the metadata that decides playability.

mod loader;

pub use loader::AssetLoader;

use crate::utils::{clamp_unit, PlayerError, Result};
use async_trait::async_trait;
use std::fmt;

/// Opaque media locator (URL or path)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaSource(String);

impl MediaSource {
    /// Validate a raw locator
    ///
    /// Empty and whitespace-only locators are rejected with `InvalidSource`.
    pub fn parse(locator: &str) -> Result<Self> {
        let trimmed = locator.trim();
        if trimmed.is_empty() {
            return Err(PlayerError::InvalidSource);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The locator text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load status of a media item
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Metadata still resolving
    Pending,

    /// Resolved and playable
    Ready,

    /// Resolution failed with a human-readable message
    Failed(String),
}

/// A loaded (or loading) playable unit
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Locator this item was resolved from
    pub source: MediaSource,

    /// Duration in seconds, 0.0 until resolved
    pub duration: f64,

    /// Whether the resource reported itself playable
    pub playable: bool,

    /// Current position in seconds
    pub position: f64,

    /// Load status
    pub status: LoadStatus,
}

impl MediaItem {
    /// Placeholder for a source whose metadata is still resolving
    pub fn pending(source: MediaSource) -> Self {
        Self {
            source,
            duration: 0.0,
            playable: false,
            position: 0.0,
            status: LoadStatus::Pending,
        }
    }

    /// A resolved, ready-to-attach item
    pub fn ready(source: MediaSource, duration: f64) -> Self {
        Self {
            source,
            duration,
            playable: true,
            position: 0.0,
            status: LoadStatus::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == LoadStatus::Ready
    }

    /// Normalized position in [0.0, 1.0]
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            clamp_unit(self.position / self.duration)
        } else {
            0.0
        }
    }
}

/// Description of a single track inside an asset
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Track kind, e.g. "video" or "audio"
    pub kind: String,

    /// Codec or format name if known
    pub codec: Option<String>,
}

/// Metadata an `AssetResolver` reports for a source
///
/// `None` means the key failed to resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMetadata {
    /// Track list
    pub tracks: Vec<TrackInfo>,

    /// Playable flag
    pub playable: Option<bool>,

    /// Duration in seconds
    pub duration: Option<f64>,
}

/// Platform hook resolving playability metadata for a source
///
/// Implementations run on tokio worker tasks and must not block. The error
/// string is surfaced to subscribers as-is.
#[async_trait]
pub trait AssetResolver: Send + Sync + 'static {
    async fn resolve(&self, source: &MediaSource) -> std::result::Result<AssetMetadata, String>;
}
