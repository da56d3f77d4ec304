//! Playback queue
//!
//! One slot per assigned locator, in input order. Slots start out pending
//! and are filled in place as loads complete, so completion order never
//! affects playback order. The current item is tracked by index.

use crate::asset::{LoadStatus, MediaItem, MediaSource};

#[derive(Debug, Default)]
pub struct Queue {
    items: Vec<MediaItem>,
    current: Option<usize>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue with pending slots; the first slot becomes current
    pub fn replace(&mut self, sources: Vec<MediaSource>) {
        self.items = sources.into_iter().map(MediaItem::pending).collect();
        self.current = if self.items.is_empty() { None } else { Some(0) };
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.current.and_then(|index| self.items.get(index))
    }

    pub fn current_mut(&mut self) -> Option<&mut MediaItem> {
        match self.current {
            Some(index) => self.items.get_mut(index),
            None => None,
        }
    }

    /// Fill slot `index` with a loaded item. Returns false if the slot does
    /// not exist or belongs to a different source.
    pub fn fill(&mut self, index: usize, item: MediaItem) -> bool {
        match self.items.get_mut(index) {
            Some(slot) if slot.source == item.source => {
                *slot = item;
                true
            }
            _ => false,
        }
    }

    /// Mark slot `index` as failed
    pub fn mark_failed(&mut self, index: usize, message: String) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                slot.status = LoadStatus::Failed(message);
                true
            }
            None => false,
        }
    }

    /// Whether an item follows the current one without wrapping
    pub fn has_next(&self) -> bool {
        matches!(self.current, Some(index) if index + 1 < self.items.len())
    }

    /// Index after the current one, wrapping at the end
    pub fn next_index(&self) -> Option<usize> {
        let count = self.items.len();
        self.current.map(|index| (index + 1) % count)
    }

    /// Index before the current one, wrapping at the start
    pub fn previous_index(&self) -> Option<usize> {
        let count = self.items.len();
        self.current.map(|index| (index + count - 1) % count)
    }

    /// Make `index` current and rewind it
    pub fn select(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.position = 0.0;
                self.current = Some(index);
                true
            }
            None => false,
        }
    }
}
