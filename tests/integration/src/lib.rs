//! Integration test utilities for playview
//!
//! This module provides common utilities for integration testing including:
//! - A scripted asset resolver with per-source gates
//! - A recording transport whose probe lets tests inject item signals
//! - An event recorder and a harness that pumps the engine mailbox

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use playview::asset::{AssetMetadata, AssetResolver, MediaItem, MediaSource, TrackInfo};
use playview::events::{EventBus, EventKind, PlayerEvent};
use playview::player::{
    ItemObserver, ItemSignal, ObserverKey, PlaybackEngine, PlayerConfig, VideoGravity,
};
use playview::transport::Transport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Scripted resolver answers keyed by locator
pub struct ScriptedResolver {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
}

#[derive(Clone)]
struct Script {
    result: std::result::Result<AssetMetadata, String>,
    gate: Option<Arc<Notify>>,
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer `locator` with a playable asset of `duration` seconds
    pub fn ready(self, locator: &str, duration: f64) -> Self {
        let metadata = AssetMetadata {
            tracks: vec![TrackInfo { kind: "video".to_string(), codec: Some("h264".to_string()) }],
            playable: Some(true),
            duration: Some(duration),
        };
        self.script(locator, Ok(metadata))
    }

    /// Answer `locator` with a resolver error
    pub fn failing(self, locator: &str, message: &str) -> Self {
        self.script(locator, Err(message.to_string()))
    }

    /// Answer `locator` with raw metadata
    pub fn metadata(self, locator: &str, metadata: AssetMetadata) -> Self {
        self.script(locator, Ok(metadata))
    }

    fn script(self, locator: &str, result: std::result::Result<AssetMetadata, String>) -> Self {
        self.scripts
            .lock()
            .insert(locator.to_string(), Script { result, gate: None });
        self
    }

    /// Hold resolution of `locator` until the returned gate is notified
    pub fn gate(&self, locator: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        if let Some(script) = self.scripts.lock().get_mut(locator) {
            script.gate = Some(Arc::clone(&gate));
        }
        gate
    }

    /// Number of resolve calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetResolver for ScriptedResolver {
    async fn resolve(&self, source: &MediaSource) -> std::result::Result<AssetMetadata, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let script = self.scripts.lock().get(source.as_str()).cloned();
        let script = script.ok_or_else(|| format!("resource not found: {}", source))?;

        if let Some(gate) = script.gate {
            gate.notified().await;
        }
        script.result
    }
}

/// Call made on the recording transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Replace(Option<String>),
    StartObserving,
    StopObserving,
    SetRate(f32),
    Seek { position: f64, serial: u64 },
    SeekImmediate { position: f64, serial: u64 },
    SetVolume(f32),
    SetGravity(VideoGravity),
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<TransportCall>,
    attached: Option<String>,
    observer: Option<ItemObserver>,
    rate: f32,
    applied_serial: u64,
    last_seek: Option<u64>,
    manual_ready: bool,
}

/// Test-side view of a `RecordingTransport`
#[derive(Clone, Default)]
pub struct TransportProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl TransportProbe {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn count(&self, call: &TransportCall) -> usize {
        self.inner.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// Locator of the attached item
    pub fn attached(&self) -> Option<String> {
        self.inner.lock().attached.clone()
    }

    pub fn rate(&self) -> f32 {
        self.inner.lock().rate
    }

    pub fn observer(&self) -> Option<ItemObserver> {
        self.inner.lock().observer.clone()
    }

    /// Post `signal` through the active observer
    pub fn signal(&self, signal: ItemSignal) -> bool {
        match self.observer() {
            Some(observer) => observer.notify(signal),
            None => false,
        }
    }

    /// Serial of the most recent asynchronous seek
    pub fn last_seek(&self) -> Option<u64> {
        self.inner.lock().last_seek
    }

    /// Complete the most recent asynchronous seek
    pub fn complete_seek(&self, finished: bool) -> bool {
        let serial = {
            let mut state = self.inner.lock();
            let serial = match state.last_seek.take() {
                Some(serial) => serial,
                None => return false,
            };
            if finished {
                state.applied_serial = serial;
            }
            serial
        };
        self.signal(ItemSignal::SeekCompleted { serial, finished })
    }

    /// Post a time tick sampled after the last applied seek
    pub fn tick(&self, position: f64) -> bool {
        let seek_serial = self.inner.lock().applied_serial;
        self.tick_with_serial(position, seek_serial)
    }

    pub fn tick_with_serial(&self, position: f64, seek_serial: u64) -> bool {
        self.signal(ItemSignal::TimeTick { position, seek_serial })
    }

    pub fn applied_serial(&self) -> u64 {
        self.inner.lock().applied_serial
    }
}

/// Transport that records every call and never plays anything
///
/// Attaching an observer to a loaded item posts `Ready`, like a platform
/// player whose item finished preparing, unless built with `manual_ready`.
pub struct RecordingTransport {
    probe: TransportProbe,
}

impl RecordingTransport {
    pub fn new() -> (Self, TransportProbe) {
        let probe = TransportProbe::default();
        (Self { probe: probe.clone() }, probe)
    }

    /// Tests post `Ready` themselves
    pub fn manual_ready() -> (Self, TransportProbe) {
        let (transport, probe) = Self::new();
        probe.inner.lock().manual_ready = true;
        (transport, probe)
    }

    fn record(&self, call: TransportCall) {
        self.probe.inner.lock().calls.push(call);
    }
}

impl Transport for RecordingTransport {
    fn replace_item(&mut self, item: Option<&MediaItem>) {
        let locator = item.map(|item| item.source.as_str().to_string());
        self.record(TransportCall::Replace(locator.clone()));

        let mut state = self.probe.inner.lock();
        state.attached = locator;
        state.rate = 0.0;
        state.last_seek = None;
    }

    fn start_observing(&mut self, observer: ItemObserver) {
        self.record(TransportCall::StartObserving);

        let mut state = self.probe.inner.lock();
        if state.attached.is_some() && !state.manual_ready {
            observer.notify(ItemSignal::Ready);
        }
        state.observer = Some(observer);
    }

    fn stop_observing(&mut self, key: ObserverKey) {
        self.record(TransportCall::StopObserving);

        let mut state = self.probe.inner.lock();
        if state.observer.as_ref().map(ItemObserver::key) == Some(key) {
            state.observer = None;
        }
    }

    fn set_rate(&mut self, rate: f32) {
        self.record(TransportCall::SetRate(rate));
        self.probe.inner.lock().rate = rate;
    }

    fn seek(&mut self, position: f64, serial: u64) {
        self.record(TransportCall::Seek { position, serial });
        self.probe.inner.lock().last_seek = Some(serial);
    }

    fn seek_immediate(&mut self, position: f64, serial: u64) {
        self.record(TransportCall::SeekImmediate { position, serial });
        self.probe.inner.lock().applied_serial = serial;
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(TransportCall::SetVolume(volume));
    }

    fn set_gravity(&mut self, gravity: VideoGravity) {
        self.record(TransportCall::SetGravity(gravity));
    }
}

/// Collects every event emitted on a bus
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let recorder = Self::default();
        let sink = Arc::clone(&recorder.events);
        bus.subscribe_all(move |event| sink.lock().push(event.clone()));
        recorder
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(PlayerEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|event| event.kind() == kind).count()
    }

    /// Progress values of every `PlayingVideo` event, in order
    pub fn progress_values(&self) -> Vec<f64> {
        self.events.lock().iter().filter_map(PlayerEvent::progress).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Engine wired to a scripted resolver and a recording transport
pub struct Harness {
    pub engine: PlaybackEngine,
    pub probe: TransportProbe,
    pub resolver: Arc<ScriptedResolver>,
    pub events: EventRecorder,
}

impl Harness {
    pub fn new(resolver: ScriptedResolver, config: PlayerConfig) -> Result<Self> {
        Self::with_transport(resolver, config, RecordingTransport::new())
    }

    pub fn with_transport(
        resolver: ScriptedResolver,
        config: PlayerConfig,
        (transport, probe): (RecordingTransport, TransportProbe),
    ) -> Result<Self> {
        let resolver = Arc::new(resolver);
        let engine = PlaybackEngine::builder()
            .with_config(config)
            .with_resolver(Arc::clone(&resolver) as Arc<dyn AssetResolver>)
            .with_transport(Box::new(transport))
            .build()?;
        let events = EventRecorder::attach(engine.events());

        Ok(Self {
            engine,
            probe,
            resolver,
            events,
        })
    }

    /// Let spawned tasks run and drain the mailbox
    pub async fn settle(&mut self) {
        settle(&mut self.engine).await;
    }
}

/// Yield to spawned tasks and pump the engine until nothing is left
pub async fn settle(engine: &mut PlaybackEngine) {
    for _ in 0..16 {
        tokio::task::yield_now().await;
        engine.pump();
    }
}

/// Assert two fractions are equal within floating point noise
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
