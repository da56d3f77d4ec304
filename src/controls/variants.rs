//! Concrete controls variants

use crate::controls::{ControlsState, PlaybackControls, SeekControls};
use crate::events::{EventBus, EventKind, PlayerEvent, SubscriptionId};
use crate::player::{EngineHandle, PlaybackEngine, PlayerCommand};
use crate::utils::clamp_unit;
use parking_lot::Mutex;
use std::sync::Arc;

/// Subscriptions held for the lifetime of a controls instance
struct Attachment {
    events: EventBus,
    ids: Vec<SubscriptionId>,
}

impl Attachment {
    fn new<F>(events: &EventBus, callback: F) -> Self
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        Self {
            events: events.clone(),
            ids: events.subscribe_all(callback),
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        for (kind, id) in EventKind::ALL.iter().zip(&self.ids) {
            self.events.unsubscribe(*kind, *id);
        }
    }
}

/// Transport-only controls: play/pause, stop, next/previous, volume
pub struct CompactControls {
    commands: EngineHandle,
    state: Arc<Mutex<ControlsState>>,
    _attachment: Attachment,
}

impl CompactControls {
    pub fn new(commands: EngineHandle, events: &EventBus) -> Self {
        let state = Arc::new(Mutex::new(ControlsState::default()));
        let sink = Arc::clone(&state);
        let attachment = Attachment::new(events, move |event| sink.lock().apply(event));

        Self {
            commands,
            state,
            _attachment: attachment,
        }
    }

    pub fn attach(engine: &PlaybackEngine) -> Self {
        Self::new(engine.handle(), engine.events())
    }

    /// Snapshot of the displayed state
    pub fn state(&self) -> ControlsState {
        self.state.lock().clone()
    }
}

impl PlaybackControls for CompactControls {
    fn commands(&self) -> &EngineHandle {
        &self.commands
    }
}

#[derive(Debug, Default)]
struct ScrubState {
    display: ControlsState,
    scrubbing: bool,
}

/// Controls with a scrubber
///
/// While the user drags, progress ticks from the engine no longer move the
/// displayed position; the seek is sent when the drag ends.
pub struct ScrubberControls {
    commands: EngineHandle,
    state: Arc<Mutex<ScrubState>>,
    _attachment: Attachment,
}

impl ScrubberControls {
    pub fn new(commands: EngineHandle, events: &EventBus) -> Self {
        let state = Arc::new(Mutex::new(ScrubState::default()));
        let sink = Arc::clone(&state);
        let attachment = Attachment::new(events, move |event| {
            let mut scrub = sink.lock();
            if scrub.scrubbing && matches!(event, PlayerEvent::PlayingVideo { .. }) {
                return;
            }
            scrub.display.apply(event);
        });

        Self {
            commands,
            state,
            _attachment: attachment,
        }
    }

    pub fn attach(engine: &PlaybackEngine) -> Self {
        Self::new(engine.handle(), engine.events())
    }

    pub fn state(&self) -> ControlsState {
        self.state.lock().display.clone()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.state.lock().scrubbing
    }

    /// User grabbed the scrubber
    pub fn begin_scrub(&self) {
        self.state.lock().scrubbing = true;
    }

    /// Move the displayed position without seeking
    pub fn scrub_to(&self, fraction: f64) {
        let mut scrub = self.state.lock();
        if scrub.scrubbing {
            scrub.display.progress = clamp_unit(fraction);
        }
    }

    /// User released the scrubber at `fraction`; seeks there
    pub fn end_scrub(&self, fraction: f64) -> bool {
        let fraction = clamp_unit(fraction);
        {
            let mut scrub = self.state.lock();
            scrub.scrubbing = false;
            scrub.display.progress = fraction;
        }
        self.commands.send(PlayerCommand::Seek(fraction))
    }
}

impl PlaybackControls for ScrubberControls {
    fn commands(&self) -> &EngineHandle {
        &self.commands
    }
}

impl SeekControls for ScrubberControls {}
