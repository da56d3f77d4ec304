//! Playback controls
//!
//! Controls are capability sets over the engine's command mailbox. A variant
//! implements `commands()` and gets the transport commands for free;
//! variants that expose a scrubber also implement `SeekControls`.

mod variants;

pub use variants::{CompactControls, ScrubberControls};

use crate::events::PlayerEvent;
use crate::player::{EngineHandle, PlayerCommand};

/// Transport commands: play, pause, stop, queue navigation, volume
///
/// Every method returns false once the engine is gone.
pub trait PlaybackControls {
    /// Mailbox the commands are posted to
    fn commands(&self) -> &EngineHandle;

    fn play(&self) -> bool {
        self.commands().send(PlayerCommand::Play)
    }

    fn pause(&self) -> bool {
        self.commands().send(PlayerCommand::Pause)
    }

    fn toggle(&self) -> bool {
        self.commands().send(PlayerCommand::TogglePlayPause)
    }

    fn stop(&self) -> bool {
        self.commands().send(PlayerCommand::Stop)
    }

    fn next(&self) -> bool {
        self.commands().send(PlayerCommand::PlayNext)
    }

    fn previous(&self) -> bool {
        self.commands().send(PlayerCommand::PlayPrevious)
    }

    fn set_volume(&self, volume: f32) -> bool {
        self.commands().send(PlayerCommand::SetVolume(volume))
    }
}

/// Seek commands for variants with a scrubber
pub trait SeekControls: PlaybackControls {
    /// Seek to a fraction of the duration
    fn seek(&self, fraction: f64) -> bool {
        self.commands().send(PlayerCommand::Seek(fraction))
    }

    /// Seek to a slider value within `min..max`
    fn seek_range(&self, min: f64, max: f64, value: f64) -> bool {
        self.commands().send(PlayerCommand::SeekRange { min, max, value })
    }

    fn jump_forward(&self, delta: Option<f64>) -> bool {
        self.commands().send(PlayerCommand::JumpForward(delta))
    }

    fn jump_backward(&self, delta: Option<f64>) -> bool {
        self.commands().send(PlayerCommand::JumpBackward(delta))
    }
}

/// What a controls overlay displays, folded from player events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlsState {
    pub playing: bool,
    pub buffering: bool,
    pub progress: f64,
    pub seeking: bool,
    pub last_error: Option<String>,
}

impl ControlsState {
    pub fn apply(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::NewVideo => *self = Self::default(),
            PlayerEvent::ReadyToPlay => self.playing = false,
            PlayerEvent::StartedVideo => {
                self.playing = true;
                self.last_error = None;
            }
            PlayerEvent::PlayingVideo { progress } => self.progress = *progress,
            PlayerEvent::BufferingStarted => self.buffering = true,
            PlayerEvent::BufferingFinished => self.buffering = false,
            PlayerEvent::PausedVideo | PlayerEvent::StoppedVideo => {
                self.playing = false;
                self.buffering = false;
            }
            PlayerEvent::LoopedVideo { .. } => {}
            PlayerEvent::FinishedVideo => self.progress = 1.0,
            PlayerEvent::SeekStarted => self.seeking = true,
            PlayerEvent::SeekEnded => self.seeking = false,
            PlayerEvent::Error { message } => {
                self.playing = false;
                self.buffering = false;
                self.seeking = false;
                self.last_error = Some(message.clone());
            }
        }
    }
}
