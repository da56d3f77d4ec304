//! Platform transport abstraction
//!
//! This module defines the trait the engine drives the underlying media
//! framework through. A transport holds at most one attached item and
//! reports everything asynchronous (readiness, buffering, time, seek
//! completion, end of item) through the `ItemObserver` it was handed.

use crate::asset::MediaItem;
use crate::player::{ItemObserver, ObserverKey, VideoGravity};

/// Active player handle of the platform media framework
///
/// All methods are called from the engine's owner context and must return
/// promptly. Signals may be posted from any context.
pub trait Transport: Send {
    /// Attach `item`, or detach the current item with `None`
    ///
    /// Replacing the item resets the playback rate to 0.0.
    fn replace_item(&mut self, item: Option<&MediaItem>);

    /// Start reporting signals for the attached item
    ///
    /// If the attached item is already ready, `ItemSignal::Ready` is posted.
    fn start_observing(&mut self, observer: ItemObserver);

    /// Stop reporting signals for `key`
    fn stop_observing(&mut self, key: ObserverKey);

    /// Set the playback rate (0.0 paused, 1.0 normal)
    fn set_rate(&mut self, rate: f32);

    /// Seek to `position` seconds asynchronously
    ///
    /// Completion is reported as `ItemSignal::SeekCompleted` with `serial`.
    /// A newer seek supersedes pending ones, which complete with
    /// `finished: false`.
    fn seek(&mut self, position: f64, serial: u64);

    /// Seek to `position` seconds synchronously, without a completion signal
    ///
    /// Ticks sampled after this call carry `serial`.
    fn seek_immediate(&mut self, position: f64, serial: u64);

    /// Set the output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Set the video layer gravity
    fn set_gravity(&mut self, _gravity: VideoGravity) {}
}
