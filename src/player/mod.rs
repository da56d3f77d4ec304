//! Player core for playview
//!
//! This module owns playback state: the queue of media items, the state
//! machine, the status observer bridging transport notifications, and the
//! engine that ties them together on a single owner context.

mod engine;
mod handle;
mod observer;
mod queue;
mod state;

pub use engine::{PlaybackEngine, PlaybackEngineBuilder};
pub use handle::{EngineHandle, EngineMessage, PlayerCommand};
pub use observer::{ItemIdentity, ItemObserver, ItemSignal, ObservedEvent, ObserverKey, StatusObserver};
pub use queue::Queue;
pub use state::{InvalidTransition, PlayerStateMachine, StateEvent, Transition};

use serde::{Deserialize, Serialize};

/// Canonical playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// Source assigned, item not ready yet
    #[default]
    New,

    /// Current item loaded, transport idle
    ReadyToPlay,

    /// Transport running
    Playing,

    /// Playing, but stalled on an empty buffer
    Buffering,

    /// Paused by the user or a lifecycle suspend
    Paused,

    /// Stopped by the user or at the end of the queue
    Stopped,

    /// Current source failed; only a new source assignment recovers
    Error,
}

impl PlayerState {
    /// Whether the transport is (nominally) running
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Buffering)
    }
}

/// Display mode of the video layer. Stored and passed to the transport only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Stretch to fill
    Resize,

    /// Fit inside, keep aspect ratio
    #[default]
    ResizeAspect,

    /// Fill, keep aspect ratio, crop overflow
    ResizeAspectFill,
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Start playback as soon as the first item is ready
    pub start_playing_when_ready: bool,

    /// Loop the queue (or the single item) at its end
    pub should_loop: bool,

    /// Initial volume (0.0 to 1.0)
    pub volume: f32,

    /// Video layer gravity
    pub gravity: VideoGravity,

    /// Default jump step as a fraction of the item duration
    pub jump_delta: f64,

    /// Progress tick interval in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_playing_when_ready: false,
            should_loop: false,
            volume: 1.0,
            gravity: VideoGravity::ResizeAspect,
            jump_delta: 0.05,
            tick_interval_ms: 10,
        }
    }
}
