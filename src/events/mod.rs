//! Outbound player events
//!
//! Every state transition, progress tick and failure reaches listeners as a
//! `PlayerEvent` delivered through the `EventBus`. Each variant has its own
//! subscribable `EventKind`.

mod bus;

pub use bus::{EventBus, EventCallback, SubscriptionId};

use serde::Serialize;

/// Player event delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A new item became current; state reset to New
    NewVideo,

    /// Current item loaded and ready
    ReadyToPlay,

    /// Transport started
    StartedVideo,

    /// Progress tick while playing, or after a seek
    PlayingVideo { progress: f64 },

    /// Playback stalled on an empty buffer
    BufferingStarted,

    /// Buffer recovered
    BufferingFinished,

    /// Transport paused
    PausedVideo,

    /// Item restarted because looping is enabled
    LoopedVideo { count: u64 },

    /// Item reached its natural end
    FinishedVideo,

    /// Transport stopped
    StoppedVideo,

    /// Non-zero seek requested
    SeekStarted,

    /// Seek completed
    SeekEnded,

    /// Failure surfaced to subscribers
    Error { message: String },
}

/// Subscribable event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    NewVideo,
    ReadyToPlay,
    StartedVideo,
    PlayingVideo,
    BufferingStarted,
    BufferingFinished,
    PausedVideo,
    LoopedVideo,
    FinishedVideo,
    StoppedVideo,
    SeekStarted,
    SeekEnded,
    Error,
}

impl EventKind {
    /// All kinds, in declaration order
    pub const ALL: [EventKind; 13] = [
        EventKind::NewVideo,
        EventKind::ReadyToPlay,
        EventKind::StartedVideo,
        EventKind::PlayingVideo,
        EventKind::BufferingStarted,
        EventKind::BufferingFinished,
        EventKind::PausedVideo,
        EventKind::LoopedVideo,
        EventKind::FinishedVideo,
        EventKind::StoppedVideo,
        EventKind::SeekStarted,
        EventKind::SeekEnded,
        EventKind::Error,
    ];
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::NewVideo => EventKind::NewVideo,
            PlayerEvent::ReadyToPlay => EventKind::ReadyToPlay,
            PlayerEvent::StartedVideo => EventKind::StartedVideo,
            PlayerEvent::PlayingVideo { .. } => EventKind::PlayingVideo,
            PlayerEvent::BufferingStarted => EventKind::BufferingStarted,
            PlayerEvent::BufferingFinished => EventKind::BufferingFinished,
            PlayerEvent::PausedVideo => EventKind::PausedVideo,
            PlayerEvent::LoopedVideo { .. } => EventKind::LoopedVideo,
            PlayerEvent::FinishedVideo => EventKind::FinishedVideo,
            PlayerEvent::StoppedVideo => EventKind::StoppedVideo,
            PlayerEvent::SeekStarted => EventKind::SeekStarted,
            PlayerEvent::SeekEnded => EventKind::SeekEnded,
            PlayerEvent::Error { .. } => EventKind::Error,
        }
    }

    /// Progress carried by a `PlayingVideo` event
    pub fn progress(&self) -> Option<f64> {
        match self {
            PlayerEvent::PlayingVideo { progress } => Some(*progress),
            _ => None,
        }
    }
}
