//! Player state machine
//!
//! The single source of truth for `PlayerState`. The engine feeds it
//! `StateEvent`s and only emits outbound events for transitions the machine
//! accepted.

use crate::player::PlayerState;
use std::fmt;
use log::debug;

/// Input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// New source or queue swap
    Reset,

    /// Current item became ready
    Ready,

    /// Transport started
    Play,

    /// Transport paused
    Pause,

    /// Transport stopped
    Stop,

    /// Buffer ran empty while playing
    BufferStart,

    /// Buffer recovered
    BufferEnd,

    /// Load or playback failure
    Fail(String),
}

/// Accepted transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlayerState,
    pub to: PlayerState,
}

/// Rejected transition
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidTransition {
    pub state: PlayerState,
    pub event: StateEvent,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not accepted in state {:?}", self.event, self.state)
    }
}

impl std::error::Error for InvalidTransition {}

/// Owner of the canonical `PlayerState`
#[derive(Debug, Default)]
pub struct PlayerStateMachine {
    state: PlayerState,
}

impl PlayerStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Target state for `event`, if the current state accepts it
    pub fn target(&self, event: &StateEvent) -> Option<PlayerState> {
        use PlayerState::*;

        match (self.state, event) {
            (_, StateEvent::Reset) => Some(New),
            (New, StateEvent::Ready) => Some(ReadyToPlay),
            // New -> Playing covers start-when-ready and auto-advance
            (New | ReadyToPlay | Paused | Stopped, StateEvent::Play) => Some(Playing),
            (Playing | Buffering, StateEvent::Pause) => Some(Paused),
            (Playing | Buffering | Paused | ReadyToPlay, StateEvent::Stop) => Some(Stopped),
            (Playing, StateEvent::BufferStart) => Some(Buffering),
            (Buffering, StateEvent::BufferEnd) => Some(Playing),
            (Error, StateEvent::Fail(_)) => None,
            (_, StateEvent::Fail(_)) => Some(Error),
            _ => None,
        }
    }

    /// Apply `event`, returning the transition taken
    pub fn apply(&mut self, event: StateEvent) -> Result<Transition, InvalidTransition> {
        match self.target(&event) {
            Some(to) => {
                let from = self.state;
                self.state = to;
                if from != to {
                    debug!("State {:?} -> {:?} on {:?}", from, to, event);
                }
                Ok(Transition { from, to })
            }
            None => Err(InvalidTransition { state: self.state, event }),
        }
    }

    /// Unconditional reset to `New`
    pub fn reset(&mut self) {
        self.state = PlayerState::New;
    }
}
