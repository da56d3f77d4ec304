//! Asynchronous asset loading
//!
//! Loads run as tokio tasks. A finished load never touches engine state
//! directly: the result is posted into the engine mailbox together with the
//! generation and queue slot it was started for, and the owner context
//! decides whether it still applies.

use crate::asset::{AssetMetadata, AssetResolver, MediaItem, MediaSource};
use crate::player::{EngineHandle, EngineMessage};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use log::{debug, warn};

/// Resolves sources into media items off the owner context
#[derive(Clone)]
pub struct AssetLoader {
    resolver: Arc<dyn AssetResolver>,
    runtime: Handle,
    mailbox: EngineHandle,
}

impl AssetLoader {
    pub fn new(resolver: Arc<dyn AssetResolver>, runtime: Handle, mailbox: EngineHandle) -> Self {
        Self {
            resolver,
            runtime,
            mailbox,
        }
    }

    /// Start loading `source` for queue slot `index`
    ///
    /// The completion is posted exactly once as `EngineMessage::AssetLoaded`.
    pub fn load(&self, generation: u64, index: usize, source: MediaSource) -> JoinHandle<()> {
        let resolver = Arc::clone(&self.resolver);
        let mailbox = self.mailbox.clone();

        debug!("Loading slot {} (generation {}): {}", index, generation, source);

        self.runtime.spawn(async move {
            let result = resolve_item(resolver.as_ref(), source).await;
            if let Err(message) = &result {
                warn!("Asset load failed for slot {}: {}", index, message);
            }
            mailbox.post(EngineMessage::AssetLoaded { generation, index, result });
        })
    }
}

/// Resolve and validate a single source
async fn resolve_item(
    resolver: &dyn AssetResolver,
    source: MediaSource,
) -> Result<MediaItem, String> {
    let metadata = resolver.resolve(&source).await?;
    validate(source, metadata)
}

fn validate(source: MediaSource, metadata: AssetMetadata) -> Result<MediaItem, String> {
    let playable = metadata.playable
        .ok_or_else(|| "failed to load key: playable".to_string())?;
    let duration = metadata.duration
        .ok_or_else(|| "failed to load key: duration".to_string())?;

    if !playable {
        return Err("asset is not playable".to_string());
    }

    if !duration.is_finite() || !(duration > 0.0) {
        return Err("asset reported an invalid duration".to_string());
    }

    Ok(MediaItem::ready(source, duration))
}
