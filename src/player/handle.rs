//! Engine mailbox
//!
//! Everything that does not run on the owner context talks to the engine by
//! posting an `EngineMessage`: controls post commands, loader tasks post load
//! results, transports post item signals. The owner drains the mailbox in
//! order, so engine state is only ever mutated in one place.

use crate::asset::MediaItem;
use crate::player::observer::{ItemSignal, ObserverKey};
use tokio::sync::mpsc;
use log::debug;

/// Command accepted by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    SetSource(String),
    SetSources(Vec<String>),
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    /// Seek to a fraction of the duration
    Seek(f64),
    /// Seek to `value` within the `min..max` range of a slider
    SeekRange { min: f64, max: f64, value: f64 },
    /// Jump forward by a fraction (configured default if `None`)
    JumpForward(Option<f64>),
    /// Jump backward by a fraction (configured default if `None`)
    JumpBackward(Option<f64>),
    SetVolume(f32),
    SetLooping(bool),
    PlayNext,
    PlayPrevious,
    Suspend,
    Resume,
    Shutdown,
}

/// Message drained by the owner context
#[derive(Debug)]
pub enum EngineMessage {
    /// Command from a control or other collaborator
    Command(PlayerCommand),

    /// Completion of an asset load started for `generation`/`index`
    AssetLoaded {
        generation: u64,
        index: usize,
        result: Result<MediaItem, String>,
    },

    /// Notification from the transport for an observed item
    Signal {
        key: ObserverKey,
        signal: ItemSignal,
    },
}

/// Cloneable, thread-safe sender into the engine mailbox
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineMessage>,
}

impl EngineHandle {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<EngineMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a command; returns false if the engine is gone
    pub fn send(&self, command: PlayerCommand) -> bool {
        self.post(EngineMessage::Command(command))
    }

    pub(crate) fn post(&self, message: EngineMessage) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(err) => {
                debug!("Engine mailbox closed, dropping {:?}", err.0);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
