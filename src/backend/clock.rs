//! Clock-driven transport
//!
//! Simulates a player: while the rate is positive a tokio task advances the
//! position against the tokio clock and reports a time tick every interval.
//! Seeks complete after a short latency; a newer seek supersedes a pending
//! one, which then reports `finished: false`.

use crate::asset::MediaItem;
use crate::player::{ItemObserver, ItemSignal, ObserverKey, VideoGravity};
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use log::{debug, info};

/// Default time a seek takes to complete
pub const DEFAULT_SEEK_LATENCY: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct ClockState {
    /// Duration of the attached item
    duration: Option<f64>,
    position: f64,
    rate: f32,
    volume: f32,
    gravity: VideoGravity,
    /// Last seek applied to `position`
    applied_serial: u64,
    /// Seek still in flight
    pending_serial: Option<u64>,
    ended: bool,
    observer: Option<ItemObserver>,
}

impl ClockState {
    fn notify(&self, signal: ItemSignal) {
        if let Some(observer) = &self.observer {
            observer.notify(signal);
        }
    }
}

/// Transport running items against the tokio clock
pub struct ClockTransport {
    runtime: Handle,
    tick: Duration,
    seek_latency: Duration,
    shared: Arc<Mutex<ClockState>>,
    ticker: Option<JoinHandle<()>>,
    seek_task: Option<JoinHandle<()>>,
}

impl ClockTransport {
    pub fn new(runtime: Handle, tick: Duration) -> Self {
        Self {
            runtime,
            tick,
            seek_latency: DEFAULT_SEEK_LATENCY,
            shared: Arc::new(Mutex::new(ClockState {
                volume: 1.0,
                ..ClockState::default()
            })),
            ticker: None,
            seek_task: None,
        }
    }

    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    /// Current position in seconds
    pub fn position(&self) -> f64 {
        self.shared.lock().position
    }

    pub fn rate(&self) -> f32 {
        self.shared.lock().rate
    }

    pub fn volume(&self) -> f32 {
        self.shared.lock().volume
    }

    pub fn gravity(&self) -> VideoGravity {
        self.shared.lock().gravity
    }

    fn start_ticker(&mut self) {
        if self.ticker.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let tick = self.tick;
        self.ticker = Some(self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            let mut last = Instant::now();

            loop {
                interval.tick().await;
                let now = Instant::now();
                let elapsed = now.duration_since(last).as_secs_f64();
                last = now;

                let mut state = shared.lock();
                let duration = match state.duration {
                    Some(duration) if state.rate > 0.0 => duration,
                    _ => continue,
                };
                if state.ended {
                    continue;
                }

                state.position = (state.position + elapsed * f64::from(state.rate)).min(duration);
                state.notify(ItemSignal::TimeTick {
                    position: state.position,
                    seek_serial: state.applied_serial,
                });

                if state.position >= duration {
                    state.ended = true;
                    state.notify(ItemSignal::ReachedEnd);
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// Abort the in-flight seek, reporting it as superseded
    fn supersede_seek(&mut self) {
        if let Some(task) = self.seek_task.take() {
            task.abort();
        }
        let mut state = self.shared.lock();
        if let Some(serial) = state.pending_serial.take() {
            debug!("Seek {} superseded", serial);
            state.notify(ItemSignal::SeekCompleted { serial, finished: false });
        }
    }
}

impl Transport for ClockTransport {
    fn replace_item(&mut self, item: Option<&MediaItem>) {
        self.stop_ticker();
        if let Some(task) = self.seek_task.take() {
            task.abort();
        }

        let mut state = self.shared.lock();
        state.duration = item.filter(|item| item.is_ready()).map(|item| item.duration);
        state.position = 0.0;
        state.rate = 0.0;
        state.pending_serial = None;
        state.ended = false;
    }

    fn start_observing(&mut self, observer: ItemObserver) {
        let mut state = self.shared.lock();
        if state.duration.is_some() {
            observer.notify(ItemSignal::Ready);
        }
        state.observer = Some(observer);
    }

    fn stop_observing(&mut self, key: ObserverKey) {
        let mut state = self.shared.lock();
        if state.observer.as_ref().map(ItemObserver::key) == Some(key) {
            state.observer = None;
        }
    }

    fn set_rate(&mut self, rate: f32) {
        let has_item = {
            let mut state = self.shared.lock();
            state.rate = rate.max(0.0);
            state.duration.is_some()
        };

        if rate > 0.0 && has_item {
            info!("Clock running at {:.2}x", rate);
            self.start_ticker();
        } else {
            self.stop_ticker();
        }
    }

    fn seek(&mut self, position: f64, serial: u64) {
        self.supersede_seek();

        let target = {
            let mut state = self.shared.lock();
            let duration = match state.duration {
                Some(duration) => duration,
                None => {
                    state.notify(ItemSignal::SeekCompleted { serial, finished: false });
                    return;
                }
            };
            state.pending_serial = Some(serial);
            position.clamp(0.0, duration)
        };

        let shared = Arc::clone(&self.shared);
        let latency = self.seek_latency;
        self.seek_task = Some(self.runtime.spawn(async move {
            tokio::time::sleep(latency).await;

            let mut state = shared.lock();
            if state.pending_serial != Some(serial) {
                return;
            }
            state.pending_serial = None;
            state.position = target;
            state.applied_serial = serial;
            state.ended = false;
            state.notify(ItemSignal::SeekCompleted { serial, finished: true });
        }));
    }

    fn seek_immediate(&mut self, position: f64, serial: u64) {
        self.supersede_seek();

        let mut state = self.shared.lock();
        let duration = state.duration.unwrap_or(0.0);
        state.position = position.clamp(0.0, duration);
        state.applied_serial = serial;
        state.ended = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.shared.lock().volume = volume;
    }

    fn set_gravity(&mut self, gravity: VideoGravity) {
        self.shared.lock().gravity = gravity;
    }
}

impl Drop for ClockTransport {
    fn drop(&mut self) {
        self.stop_ticker();
        if let Some(task) = self.seek_task.take() {
            task.abort();
        }
    }
}
