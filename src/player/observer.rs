//! Status observation
//!
//! The transport reports item and playback changes through an `ItemObserver`.
//! Every observation gets a fresh `ObserverKey`; the `StatusObserver` keeps
//! exactly one key active and drops signals carrying any other key, so a
//! detached item can never fire into the engine after a queue swap.

use crate::player::handle::{EngineHandle, EngineMessage};
use crate::player::state::StateEvent;
use crate::transport::Transport;
use log::debug;

/// Identity of one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverKey(u64);

/// Which queue slot of which source assignment is being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemIdentity {
    pub generation: u64,
    pub index: usize,
}

/// Raw notification from the transport
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSignal {
    /// Item is ready to play
    Ready,

    /// Item failed to load or play
    Failed(String),

    /// Playback buffer ran empty
    BufferEmpty,

    /// Playback buffer is likely to keep up again
    LikelyToKeepUp,

    /// Playback reached the end of the item
    ReachedEnd,

    /// Periodic time update. `seek_serial` is the last seek the transport
    /// applied before sampling `position`.
    TimeTick { position: f64, seek_serial: u64 },

    /// Asynchronous seek finished (`finished == false` if superseded)
    SeekCompleted { serial: u64, finished: bool },
}

/// Signal after translation
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    State(StateEvent),
    Finished,
    Tick { position: f64, seek_serial: u64 },
    SeekCompleted { serial: u64, finished: bool },
}

/// Sender half handed to the transport for one observation
#[derive(Debug, Clone)]
pub struct ItemObserver {
    key: ObserverKey,
    mailbox: EngineHandle,
}

impl ItemObserver {
    pub fn key(&self) -> ObserverKey {
        self.key
    }

    /// Post a signal; returns false once the engine is gone
    pub fn notify(&self, signal: ItemSignal) -> bool {
        self.mailbox.post(EngineMessage::Signal { key: self.key, signal })
    }
}

/// Bridge between transport signals and state machine events
#[derive(Debug, Default)]
pub struct StatusObserver {
    active: Option<(ObserverKey, ItemIdentity)>,
    next_key: u64,
}

impl StatusObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `identity`, detaching any previous observation first
    pub fn observe(
        &mut self,
        transport: &mut dyn Transport,
        identity: ItemIdentity,
        mailbox: &EngineHandle,
    ) -> ObserverKey {
        self.detach(transport);

        self.next_key += 1;
        let key = ObserverKey(self.next_key);
        self.active = Some((key, identity));

        transport.start_observing(ItemObserver {
            key,
            mailbox: mailbox.clone(),
        });
        debug!("Observing slot {} as {:?}", identity.index, key);
        key
    }

    /// Observe `identity` unless it is already the active observation.
    /// Returns true if a new observation was installed.
    pub fn ensure(
        &mut self,
        transport: &mut dyn Transport,
        identity: ItemIdentity,
        mailbox: &EngineHandle,
    ) -> bool {
        match self.active {
            Some((_, active)) if active == identity => false,
            _ => {
                self.observe(transport, identity, mailbox);
                true
            }
        }
    }

    /// Stop observing. Calling it with nothing attached is a no-op.
    pub fn detach(&mut self, transport: &mut dyn Transport) {
        if let Some((key, identity)) = self.active.take() {
            transport.stop_observing(key);
            debug!("Detached {:?} from slot {}", key, identity.index);
        }
    }

    pub fn active_key(&self) -> Option<ObserverKey> {
        self.active.map(|(key, _)| key)
    }

    /// Translate a signal if it belongs to the active observation
    pub fn accept(&self, key: ObserverKey, signal: ItemSignal) -> Option<ObservedEvent> {
        if self.active_key() != Some(key) {
            debug!("Dropping {:?} from inactive {:?}", signal, key);
            return None;
        }
        Some(translate(signal))
    }
}

fn translate(signal: ItemSignal) -> ObservedEvent {
    match signal {
        ItemSignal::Ready => ObservedEvent::State(StateEvent::Ready),
        ItemSignal::Failed(message) => ObservedEvent::State(StateEvent::Fail(message)),
        ItemSignal::BufferEmpty => ObservedEvent::State(StateEvent::BufferStart),
        ItemSignal::LikelyToKeepUp => ObservedEvent::State(StateEvent::BufferEnd),
        ItemSignal::ReachedEnd => ObservedEvent::Finished,
        ItemSignal::TimeTick { position, seek_serial } => ObservedEvent::Tick { position, seek_serial },
        ItemSignal::SeekCompleted { serial, finished } => ObservedEvent::SeekCompleted { serial, finished },
    }
}
