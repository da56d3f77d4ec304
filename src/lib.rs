//! playview - playback state machine and event engine for embeddable video views
//!
//! The crate sits between a platform media framework and a controls overlay:
//! - `asset`: source locators, media items and asynchronous asset loading
//! - `player`: the playback engine, its queue, state machine and status observer
//! - `events`: outbound player events and the multi-subscriber event bus
//! - `transport`: the trait the engine drives the platform player through
//! - `controls`: capability traits and concrete controls variants
//! - `backend`: catalog resolver and clock transport for running without a platform
//! - `utils`: errors, configuration and numeric helpers

pub mod asset;
pub mod backend;
pub mod controls;
pub mod events;
pub mod player;
pub mod transport;
pub mod utils;

pub use asset::{AssetLoader, AssetMetadata, AssetResolver, LoadStatus, MediaItem, MediaSource, TrackInfo};
pub use events::{EventBus, EventKind, PlayerEvent, SubscriptionId};
pub use player::{
    EngineHandle, PlaybackEngine, PlaybackEngineBuilder, PlayerCommand, PlayerConfig, PlayerState,
    VideoGravity,
};
pub use transport::Transport;
pub use utils::{Config, PlayerError, Result};
