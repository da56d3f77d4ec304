//! Multi-subscriber event bus
//!
//! One ordered callback list per `EventKind`. `emit` snapshots the list for
//! the event's kind and invokes the callbacks synchronously in registration
//! order, so callbacks may subscribe or unsubscribe while being invoked.
//! Such changes apply from the next emit.

use crate::events::{EventKind, PlayerEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Subscriber callback
pub type EventCallback = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// Handle for removing a single subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event bus shared between the engine and its listeners
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<EventKind, Vec<(SubscriptionId, EventCallback)>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback for `kind`
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.subscribe_arc(kind, Arc::new(callback))
    }

    fn subscribe_arc(&self, kind: EventKind, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, callback));
        id
    }

    /// Register one callback for every event kind
    pub fn subscribe_all<F>(&self, callback: F) -> Vec<SubscriptionId>
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        let callback: EventCallback = Arc::new(callback);
        EventKind::ALL
            .iter()
            .map(|kind| self.subscribe_arc(*kind, Arc::clone(&callback)))
            .collect()
    }

    /// Remove one subscription; returns whether it existed
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        match subscribers.get_mut(&kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(existing, _)| *existing != id);
                list.len() != before
            }
            None => false,
        }
    }

    /// Remove every callback registered for `kind`
    pub fn clear(&self, kind: EventKind) {
        self.subscribers.write().remove(&kind);
    }

    /// Remove every callback of every kind
    pub fn clear_all(&self) {
        self.subscribers.write().clear();
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke the callbacks registered for the event's kind
    pub fn emit(&self, event: &PlayerEvent) {
        let callbacks: Vec<EventCallback> = match self.subscribers.read().get(&event.kind()) {
            Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            None => return,
        };

        for callback in callbacks {
            callback(event);
        }
    }
}
