//! Playback engine implementation for playview
//!
//! The `PlaybackEngine` owns the queue, the transport, the state machine and
//! the status observer. It runs on a single owner context: every mutation
//! happens through `&mut self`, and asynchronous results (asset loads,
//! transport signals, commands from controls) reach it through the mailbox.

use crate::asset::{AssetLoader, AssetResolver, LoadStatus, MediaItem, MediaSource};
use crate::backend::ClockTransport;
use crate::events::{EventBus, PlayerEvent};
use crate::player::handle::{EngineHandle, EngineMessage, PlayerCommand};
use crate::player::observer::{ItemIdentity, ObservedEvent, StatusObserver};
use crate::player::queue::Queue;
use crate::player::state::{PlayerStateMachine, StateEvent, Transition};
use crate::player::{PlayerConfig, PlayerState, VideoGravity};
use crate::transport::Transport;
use crate::utils::error::{PlayerError, Result};
use crate::utils::{clamp_unit, clamp_volume};

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use log::{debug, error, info, warn};

/// Seek waiting for its transport completion
#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    serial: u64,
    position: f64,
}

/// Builder for `PlaybackEngine`
pub struct PlaybackEngineBuilder {
    config: PlayerConfig,
    resolver: Option<Arc<dyn AssetResolver>>,
    transport: Option<Box<dyn Transport>>,
    runtime: Option<Handle>,
    events: Option<EventBus>,
}

impl Default for PlaybackEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: PlayerConfig::default(),
            resolver: None,
            transport: None,
            runtime: None,
            events: None,
        }
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Metadata resolver used by the asset loader (required)
    pub fn with_resolver(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Transport to drive; defaults to a `ClockTransport`
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Runtime for load tasks; defaults to the current runtime
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Share an existing event bus
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<PlaybackEngine> {
        let resolver = self.resolver
            .ok_or_else(|| PlayerError::Config("an asset resolver is required".to_string()))?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| PlayerError::Runtime(e.to_string()))?,
        };

        let config = self.config;
        let volume = clamp_volume(config.volume);

        let mut transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(ClockTransport::new(
                runtime.clone(),
                Duration::from_millis(config.tick_interval_ms.max(1)),
            )),
        };
        transport.set_volume(volume);
        transport.set_gravity(config.gravity);

        let (handle, mailbox) = EngineHandle::channel();
        let loader = AssetLoader::new(resolver, runtime, handle.clone());

        info!(
            "Playback engine ready (autoplay: {}, loop: {}, volume: {:.2})",
            config.start_playing_when_ready, config.should_loop, volume
        );

        Ok(PlaybackEngine {
            config,
            machine: PlayerStateMachine::new(),
            queue: Queue::new(),
            transport,
            observer: StatusObserver::new(),
            loader,
            loads: Vec::new(),
            events: self.events.unwrap_or_default(),
            handle,
            mailbox,
            generation: 0,
            volume,
            seek_serial: 0,
            applied_seek_serial: 0,
            pending_seek: None,
            play_when_ready: false,
            resume_after_suspend: false,
            loop_count: 0,
            shutdown: false,
        })
    }
}

/// Playback engine
pub struct PlaybackEngine {
    config: PlayerConfig,
    machine: PlayerStateMachine,
    queue: Queue,
    transport: Box<dyn Transport>,
    observer: StatusObserver,

    // Loading
    loader: AssetLoader,
    loads: Vec<JoinHandle<()>>,

    // Outbound events and inbound mailbox
    events: EventBus,
    handle: EngineHandle,
    mailbox: mpsc::UnboundedReceiver<EngineMessage>,

    /// Bumped on every source assignment
    generation: u64,
    volume: f32,

    // Seek bookkeeping
    seek_serial: u64,
    applied_seek_serial: u64,
    pending_seek: Option<PendingSeek>,

    play_when_ready: bool,
    resume_after_suspend: bool,
    loop_count: u64,
    shutdown: bool,
}

impl PlaybackEngine {
    pub fn builder() -> PlaybackEngineBuilder {
        PlaybackEngineBuilder::new()
    }

    /// Sender for commands from other contexts
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> PlayerState {
        self.machine.state()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Whether a non-zero seek is waiting for completion
    pub fn is_seeking(&self) -> bool {
        self.pending_seek.is_some()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    // ---- Source assignment ----

    /// Replace the queue with a single source
    pub fn set_source(&mut self, locator: &str) {
        self.set_sources(&[locator]);
    }

    /// Replace the queue with `locators`, in order
    pub fn set_sources<S: AsRef<str>>(&mut self, locators: &[S]) {
        self.generation += 1;
        self.teardown_current();
        self.cancel_loads();
        self.play_when_ready = false;
        self.resume_after_suspend = false;
        self.loop_count = 0;

        let sources: Result<Vec<MediaSource>> = locators
            .iter()
            .map(|locator| MediaSource::parse(locator.as_ref()))
            .collect();

        let sources = match sources {
            Ok(sources) if !sources.is_empty() => sources,
            Ok(_) | Err(_) => {
                self.queue.clear();
                self.machine.reset();
                self.fail(PlayerError::InvalidSource);
                return;
            }
        };

        info!("Assigning {} source(s), generation {}", sources.len(), self.generation);

        if self.apply(StateEvent::Reset).is_some() {
            self.emit(PlayerEvent::NewVideo);
        }

        self.queue.replace(sources.clone());
        self.play_when_ready = self.config.start_playing_when_ready;

        for (index, source) in sources.into_iter().enumerate() {
            let task = self.loader.load(self.generation, index, source);
            self.loads.push(task);
        }
    }

    // ---- Transport commands ----

    /// Start or resume playback
    pub fn play(&mut self) {
        match self.machine.state() {
            PlayerState::Playing | PlayerState::Buffering => return,
            PlayerState::Error => {
                debug!("Ignoring play in error state");
                return;
            }
            PlayerState::New => {
                if self.queue.current().is_some() {
                    debug!("Current item not ready, playing when ready");
                    self.play_when_ready = true;
                }
                return;
            }
            PlayerState::ReadyToPlay | PlayerState::Paused | PlayerState::Stopped => {}
        }

        if self.progress() >= 1.0 {
            self.seek(0.0);
        }
        self.start_playback();
    }

    pub fn pause(&mut self) {
        if self.machine.state() == PlayerState::New {
            self.play_when_ready = false;
            return;
        }
        if !self.machine.state().is_active() {
            return;
        }

        info!("Pausing playback");
        self.transport.set_rate(0.0);
        self.resume_after_suspend = false;
        if self.apply(StateEvent::Pause).is_some() {
            self.emit(PlayerEvent::PausedVideo);
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.machine.state().is_active() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop playback and rewind
    pub fn stop(&mut self) {
        match self.machine.state() {
            PlayerState::New | PlayerState::Error | PlayerState::Stopped => return,
            _ => {}
        }

        info!("Stopping playback");
        self.transport.set_rate(0.0);
        self.seek(0.0);
        if self.apply(StateEvent::Stop).is_some() {
            self.emit(PlayerEvent::StoppedVideo);
        }
    }

    /// Seek to a fraction of the current item's duration
    ///
    /// 0.0 seeks synchronously and reports progress at once. Anything else
    /// reports `SeekStarted` now and `SeekEnded` plus progress when the
    /// transport completes the seek.
    pub fn seek(&mut self, fraction: f64) {
        if self.machine.state() == PlayerState::Error {
            return;
        }
        let duration = match self.queue.current() {
            Some(item) if item.is_ready() => item.duration,
            _ => {
                debug!("Ignoring seek without a loaded item");
                return;
            }
        };

        let fraction = clamp_unit(fraction);
        self.seek_serial += 1;
        let serial = self.seek_serial;

        if fraction == 0.0 {
            self.pending_seek = None;
            self.transport.seek_immediate(0.0, serial);
            self.applied_seek_serial = serial;
            if let Some(item) = self.queue.current_mut() {
                item.position = 0.0;
            }
            self.emit(PlayerEvent::PlayingVideo { progress: 0.0 });
            return;
        }

        let position = fraction * duration;
        info!("Seeking to {:.3}s ({:.1}%)", position, fraction * 100.0);
        self.pending_seek = Some(PendingSeek { serial, position });
        self.emit(PlayerEvent::SeekStarted);
        self.transport.seek(position, serial);
    }

    /// Seek to `value` within the `min..max` range of a slider
    pub fn seek_range(&mut self, min: f64, max: f64, value: f64) {
        let span = max - min;
        if !(span.is_finite() && span > 0.0) {
            self.seek(0.0);
            return;
        }
        self.seek((value - min) / span);
    }

    /// Jump forward by `delta` (or the configured step) of the duration
    pub fn jump_forward(&mut self, delta: Option<f64>) {
        let delta = delta.unwrap_or(self.config.jump_delta);
        self.seek(self.progress() + delta);
    }

    /// Jump backward by `delta` (or the configured step) of the duration
    pub fn jump_backward(&mut self, delta: Option<f64>) {
        let delta = delta.unwrap_or(self.config.jump_delta);
        self.seek(self.progress() - delta);
    }

    pub fn play_next(&mut self) {
        let target = self.queue.next_index();
        self.jump_to(target);
    }

    pub fn play_previous(&mut self) {
        let target = self.queue.previous_index();
        self.jump_to(target);
    }

    fn jump_to(&mut self, target: Option<usize>) {
        if self.machine.state() == PlayerState::Error {
            debug!("Ignoring queue navigation in error state");
            return;
        }
        let target = match target {
            Some(target) => target,
            None => return,
        };

        if self.queue.len() == 1 {
            self.seek(0.0);
            return;
        }
        self.swap_to(target, false);
    }

    // ---- Volume and readouts ----

    /// Set the volume, clamped to [0.0, 1.0]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
        self.transport.set_volume(self.volume);
    }

    /// Volume of the loaded item; 0.0 when nothing is loaded
    pub fn volume(&self) -> f32 {
        match self.loaded_item() {
            Some(_) => self.volume,
            None => 0.0,
        }
    }

    /// Position of the loaded item in seconds
    pub fn current_time(&self) -> f64 {
        self.loaded_item().map(|item| item.position).unwrap_or(0.0)
    }

    /// Duration of the loaded item in seconds
    pub fn video_length(&self) -> f64 {
        self.loaded_item().map(|item| item.duration).unwrap_or(0.0)
    }

    /// Normalized position of the loaded item
    pub fn progress(&self) -> f64 {
        self.loaded_item().map(MediaItem::progress).unwrap_or(0.0)
    }

    fn loaded_item(&self) -> Option<&MediaItem> {
        if self.machine.state() == PlayerState::Error {
            return None;
        }
        self.queue.current().filter(|item| item.is_ready())
    }

    // ---- Configuration ----

    pub fn set_looping(&mut self, should_loop: bool) {
        self.config.should_loop = should_loop;
    }

    pub fn set_start_playing_when_ready(&mut self, autoplay: bool) {
        self.config.start_playing_when_ready = autoplay;
    }

    pub fn set_gravity(&mut self, gravity: VideoGravity) {
        self.config.gravity = gravity;
        self.transport.set_gravity(gravity);
    }

    // ---- Lifecycle ----

    /// Pause for a lifecycle suspension, remembering whether we were playing
    pub fn suspend(&mut self) {
        if self.machine.state().is_active() {
            self.pause();
            self.resume_after_suspend = true;
        }
    }

    /// Undo `suspend`; plays only if the suspension paused playback
    pub fn resume(&mut self) {
        if std::mem::take(&mut self.resume_after_suspend)
            && self.machine.state() == PlayerState::Paused
        {
            self.play();
        }
    }

    /// Release the current item and stop processing messages
    pub fn shutdown(&mut self) {
        if self.shutdown {
            return;
        }
        info!("Shutting down playback engine");
        self.teardown_current();
        self.cancel_loads();
        self.shutdown = true;
    }

    // ---- Mailbox ----

    /// Run a command on the owner context
    pub fn execute(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::SetSource(locator) => self.set_source(&locator),
            PlayerCommand::SetSources(locators) => self.set_sources(&locators),
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::Seek(fraction) => self.seek(fraction),
            PlayerCommand::SeekRange { min, max, value } => self.seek_range(min, max, value),
            PlayerCommand::JumpForward(delta) => self.jump_forward(delta),
            PlayerCommand::JumpBackward(delta) => self.jump_backward(delta),
            PlayerCommand::SetVolume(volume) => self.set_volume(volume),
            PlayerCommand::SetLooping(should_loop) => self.set_looping(should_loop),
            PlayerCommand::PlayNext => self.play_next(),
            PlayerCommand::PlayPrevious => self.play_previous(),
            PlayerCommand::Suspend => self.suspend(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::Shutdown => self.shutdown(),
        }
    }

    /// Process every queued message without waiting; returns the count
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while !self.shutdown {
            match self.mailbox.try_recv() {
                Ok(message) => {
                    self.process(message);
                    processed += 1;
                }
                Err(_) => break,
            }
        }
        processed
    }

    /// Wait for one message and process it; false once the mailbox closed
    pub async fn next_message(&mut self) -> bool {
        match self.mailbox.recv().await {
            Some(message) => {
                self.process(message);
                true
            }
            None => false,
        }
    }

    /// Process messages until shutdown
    pub async fn run(&mut self) {
        while !self.shutdown {
            if !self.next_message().await {
                break;
            }
        }
    }

    fn process(&mut self, message: EngineMessage) {
        if self.shutdown {
            return;
        }
        match message {
            EngineMessage::Command(command) => self.execute(command),
            EngineMessage::AssetLoaded { generation, index, result } => {
                self.on_asset_loaded(generation, index, result)
            }
            EngineMessage::Signal { key, signal } => {
                if let Some(event) = self.observer.accept(key, signal) {
                    self.on_observed(event);
                }
            }
        }
    }

    // ---- Load completion ----

    fn on_asset_loaded(
        &mut self,
        generation: u64,
        index: usize,
        result: std::result::Result<MediaItem, String>,
    ) {
        if generation != self.generation {
            debug!(
                "Discarding stale load for slot {} (generation {}, current {})",
                index, generation, self.generation
            );
            return;
        }

        let is_current = self.queue.current_index() == Some(index);
        match result {
            Ok(item) => {
                if !self.queue.fill(index, item) {
                    debug!("Load completion for unknown slot {}", index);
                    return;
                }
                if is_current {
                    self.install_current();
                }
            }
            Err(message) => {
                self.queue.mark_failed(index, message.clone());
                if is_current {
                    self.fail(PlayerError::asset_load(message));
                } else {
                    warn!("Queued item {} failed to load: {}", index, message);
                }
            }
        }
    }

    // ---- Observed signals ----

    fn on_observed(&mut self, event: ObservedEvent) {
        match event {
            ObservedEvent::State(StateEvent::Ready) => self.on_ready(),
            ObservedEvent::State(StateEvent::Fail(message)) => {
                let error = if self.machine.state() == PlayerState::New {
                    PlayerError::asset_load(message)
                } else {
                    PlayerError::Playback(message)
                };
                self.fail(error);
            }
            ObservedEvent::State(StateEvent::BufferStart) => {
                if self.machine.target(&StateEvent::BufferStart).is_some() {
                    self.apply(StateEvent::BufferStart);
                    self.emit(PlayerEvent::BufferingStarted);
                } else {
                    debug!("Ignoring buffer-empty in {:?}", self.machine.state());
                }
            }
            ObservedEvent::State(StateEvent::BufferEnd) => {
                if self.machine.target(&StateEvent::BufferEnd).is_some() {
                    self.apply(StateEvent::BufferEnd);
                    self.emit(PlayerEvent::BufferingFinished);
                } else {
                    debug!("Ignoring buffer-recovered in {:?}", self.machine.state());
                }
            }
            ObservedEvent::State(other) => debug!("Ignoring observed {:?}", other),
            ObservedEvent::Finished => self.on_finished(),
            ObservedEvent::Tick { position, seek_serial } => self.on_tick(position, seek_serial),
            ObservedEvent::SeekCompleted { serial, finished } => {
                self.on_seek_completed(serial, finished)
            }
        }
    }

    fn on_ready(&mut self) {
        if self.machine.state() != PlayerState::New {
            debug!("Ignoring ready in {:?}", self.machine.state());
            return;
        }
        if !self.queue.current().is_some_and(MediaItem::is_ready) {
            return;
        }

        if std::mem::take(&mut self.play_when_ready) {
            self.start_playback();
        } else if self.apply(StateEvent::Ready).is_some() {
            self.emit(PlayerEvent::ReadyToPlay);
        }
    }

    fn on_tick(&mut self, position: f64, seek_serial: u64) {
        if self.machine.state() != PlayerState::Playing
            || self.pending_seek.is_some()
            || seek_serial < self.applied_seek_serial
        {
            return;
        }

        let progress = match self.queue.current_mut() {
            Some(item) if item.is_ready() => {
                if position < item.position {
                    debug!("Ignoring tick behind current position ({:.3} < {:.3})", position, item.position);
                    return;
                }
                item.position = position.min(item.duration);
                item.progress()
            }
            _ => return,
        };
        self.emit(PlayerEvent::PlayingVideo { progress });
    }

    fn on_seek_completed(&mut self, serial: u64, finished: bool) {
        let pending = match self.pending_seek {
            Some(pending) if pending.serial == serial => pending,
            _ => {
                debug!("Ignoring completion of superseded seek {}", serial);
                return;
            }
        };
        self.pending_seek = None;

        if !finished {
            debug!("Seek {} did not finish", serial);
            return;
        }

        self.applied_seek_serial = serial;
        let progress = match self.queue.current_mut() {
            Some(item) => {
                item.position = pending.position;
                item.progress()
            }
            None => return,
        };
        self.emit(PlayerEvent::SeekEnded);
        self.emit(PlayerEvent::PlayingVideo { progress });
    }

    fn on_finished(&mut self) {
        if !self.machine.state().is_active() {
            debug!("Ignoring end of item in {:?}", self.machine.state());
            return;
        }

        if let Some(item) = self.queue.current_mut() {
            item.position = item.duration;
        }
        self.emit(PlayerEvent::FinishedVideo);

        if self.queue.has_next() {
            if let Some(next) = self.queue.next_index() {
                info!("Advancing to item {}", next);
                self.swap_to(next, true);
            }
            return;
        }

        if self.config.should_loop {
            self.loop_count += 1;
            self.emit(PlayerEvent::LoopedVideo { count: self.loop_count });

            if self.queue.len() == 1 {
                // Seamless restart without leaving Playing
                self.seek(0.0);
                self.transport.set_rate(1.0);
            } else {
                info!("Looping queue, pass {}", self.loop_count);
                self.swap_to(0, true);
            }
            return;
        }

        info!("End of queue reached");
        self.transport.set_rate(0.0);
        if self.apply(StateEvent::Stop).is_some() {
            self.emit(PlayerEvent::StoppedVideo);
        }
    }

    // ---- Internals ----

    fn start_playback(&mut self) {
        if self.apply(StateEvent::Play).is_none() {
            return;
        }

        if let Some(identity) = self.current_identity() {
            self.observer.ensure(self.transport.as_mut(), identity, &self.handle);
        }
        info!("Starting playback");
        self.transport.set_rate(1.0);
        self.emit(PlayerEvent::StartedVideo);
    }

    /// Make `index` current, resetting to New
    fn swap_to(&mut self, index: usize, autoplay: bool) {
        self.teardown_current();
        self.queue.select(index);

        if self.apply(StateEvent::Reset).is_some() {
            self.emit(PlayerEvent::NewVideo);
        }
        self.play_when_ready = autoplay;

        let status = self.queue.current().map(|item| item.status.clone());
        match status {
            Some(LoadStatus::Ready) => self.install_current(),
            Some(LoadStatus::Failed(message)) => self.fail(PlayerError::asset_load(message)),
            Some(LoadStatus::Pending) | None => {}
        }
    }

    /// Attach the current (loaded) item to the transport and observe it
    fn install_current(&mut self) {
        let identity = match self.current_identity() {
            Some(identity) => identity,
            None => return,
        };
        let item = match self.queue.current() {
            Some(item) if item.is_ready() => item,
            _ => return,
        };

        info!("Installing {} ({:.3}s)", item.source, item.duration);
        self.transport.replace_item(Some(item));
        self.transport.set_volume(self.volume);
        self.observer.observe(self.transport.as_mut(), identity, &self.handle);
    }

    /// Stop observing, then release the item
    fn teardown_current(&mut self) {
        self.observer.detach(self.transport.as_mut());
        self.transport.replace_item(None);
        self.pending_seek = None;
    }

    fn cancel_loads(&mut self) {
        for task in self.loads.drain(..) {
            task.abort();
        }
    }

    fn current_identity(&self) -> Option<ItemIdentity> {
        self.queue.current_index().map(|index| ItemIdentity {
            generation: self.generation,
            index,
        })
    }

    fn fail(&mut self, error: PlayerError) {
        if self.machine.state() == PlayerState::Error {
            debug!("Already failed, dropping: {}", error);
            return;
        }

        self.transport.set_rate(0.0);
        self.pending_seek = None;
        self.play_when_ready = false;
        self.resume_after_suspend = false;

        let message = error.to_string();
        if self.apply(StateEvent::Fail(message.clone())).is_some() {
            self.emit(PlayerEvent::Error { message });
        }
    }

    fn apply(&mut self, event: StateEvent) -> Option<Transition> {
        match self.machine.apply(event) {
            Ok(transition) => Some(transition),
            Err(err) => {
                warn!("Rejected transition: {}", err);
                None
            }
        }
    }

    fn emit(&self, event: PlayerEvent) {
        match &event {
            PlayerEvent::Error { message } => error!("Player error: {}", message),
            PlayerEvent::PlayingVideo { .. } => {}
            other => debug!("Event {:?}", other),
        }
        self.events.emit(&event);
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
