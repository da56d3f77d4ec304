//! Catalog-backed asset resolver
//!
//! Answers metadata queries from a static list of sources, typically read
//! from a TOML file:
//!
//! ```toml
//! [[source]]
//! locator = "clip-a"
//! duration = 10.0
//! latency_ms = 50
//!
//! [[source]]
//! locator = "broken"
//! fail = "connection reset"
//! ```

use crate::asset::{AssetMetadata, AssetResolver, MediaSource, TrackInfo};
use crate::utils::error::{IntoPlayerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use log::debug;

/// One catalog source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Locator this entry answers for
    pub locator: String,

    /// Duration in seconds; absent means the key fails to resolve
    #[serde(default)]
    pub duration: Option<f64>,

    /// Playable flag
    #[serde(default = "default_playable")]
    pub playable: bool,

    /// Simulated resolution latency
    #[serde(default)]
    pub latency_ms: u64,

    /// Resolve with this error instead of metadata
    #[serde(default)]
    pub fail: Option<String>,

    /// Track list
    #[serde(default)]
    pub tracks: Vec<CatalogTrack>,
}

fn default_playable() -> bool {
    true
}

impl CatalogEntry {
    /// Playable entry with the given duration and no latency
    pub fn new(locator: &str, duration: f64) -> Self {
        Self {
            locator: locator.to_string(),
            duration: Some(duration),
            playable: true,
            latency_ms: 0,
            fail: None,
            tracks: vec![CatalogTrack { kind: "video".to_string(), codec: None }],
        }
    }

    fn metadata(&self) -> AssetMetadata {
        AssetMetadata {
            tracks: self.tracks
                .iter()
                .map(|track| TrackInfo { kind: track.kind.clone(), codec: track.codec.clone() })
                .collect(),
            playable: Some(self.playable),
            duration: self.duration,
        }
    }
}

/// Track description in a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub kind: String,
    #[serde(default)]
    pub codec: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "source")]
    sources: Vec<CatalogEntry>,
}

/// Resolver answering from a fixed catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    entries: HashMap<String, CatalogEntry>,
}

impl CatalogResolver {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.locator.clone(), entry))
                .collect(),
        }
    }

    /// Parse a TOML catalog
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents).catalog_err("Failed to parse catalog")?;
        Ok(Self::new(file.sources))
    }

    /// Read a TOML catalog from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.entries.contains_key(locator)
    }

    pub fn get(&self, locator: &str) -> Option<&CatalogEntry> {
        self.entries.get(locator)
    }
}

#[async_trait]
impl AssetResolver for CatalogResolver {
    async fn resolve(&self, source: &MediaSource) -> std::result::Result<AssetMetadata, String> {
        let entry = self.entries
            .get(source.as_str())
            .cloned()
            .ok_or_else(|| format!("resource not found: {}", source))?;

        if entry.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(entry.latency_ms)).await;
        }

        debug!("Catalog resolved {}", source);
        match entry.fail {
            Some(message) => Err(message),
            None => Ok(entry.metadata()),
        }
    }
}
