//! End-to-end playback against the reference backends
//!
//! The engine runs with the catalog resolver and the default clock transport
//! on a paused tokio clock, so whole items play in virtual time.

use anyhow::Result;
use playview::backend::CatalogResolver;
use playview::events::{EventKind, PlayerEvent};
use playview::player::{PlaybackEngine, PlayerConfig, PlayerState};
use playview_integration_tests::EventRecorder;
use std::sync::Arc;
use std::time::Duration;

const CATALOG: &str = r#"
    [[source]]
    locator = "short"
    duration = 0.2
    latency_ms = 30

    [[source]]
    locator = "long"
    duration = 1.0
    latency_ms = 5

    [[source]]
    locator = "still"
    duration = 0.0
    latency_ms = 5

    [[source]]
    locator = "offline"
    latency_ms = 10
    fail = "host unreachable"
"#;

fn engine(config: PlayerConfig) -> Result<(PlaybackEngine, EventRecorder)> {
    let resolver = CatalogResolver::from_toml_str(CATALOG)?;
    let engine = PlaybackEngine::builder()
        .with_config(config)
        .with_resolver(Arc::new(resolver))
        .build()?;
    let events = EventRecorder::attach(engine.events());
    Ok((engine, events))
}

/// Process messages until `done` holds, in virtual time
async fn run_until<F>(engine: &mut PlaybackEngine, done: F) -> Result<()>
where
    F: Fn(&PlaybackEngine) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        while !done(engine) {
            if !engine.next_message().await {
                break;
            }
        }
    })
    .await?;
    Ok(())
}

fn assert_monotonic(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(pair[1] >= pair[0], "progress went backwards: {:?}", pair);
    }
}

#[tokio::test(start_paused = true)]
async fn test_plays_item_to_the_end() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig::default())?;

    engine.set_source("short");
    engine.play();
    run_until(&mut engine, |e| e.state() == PlayerState::Stopped).await?;

    let kinds = events.kinds();
    assert_eq!(kinds.first(), Some(&EventKind::NewVideo));
    assert_eq!(kinds[1], EventKind::StartedVideo);
    assert_eq!(
        &kinds[kinds.len() - 2..],
        &[EventKind::FinishedVideo, EventKind::StoppedVideo]
    );
    assert_eq!(events.count(EventKind::StoppedVideo), 1);

    let progress = events.progress_values();
    assert!(progress.len() > 5);
    assert_monotonic(&progress);
    assert_eq!(progress.last(), Some(&1.0));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_queue_advances_then_stops() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig {
        start_playing_when_ready: true,
        ..PlayerConfig::default()
    })?;

    engine.set_sources(&["short", "short"]);
    run_until(&mut engine, |e| e.state() == PlayerState::Stopped).await?;

    assert_eq!(engine.current_index(), Some(1));
    assert_eq!(events.count(EventKind::FinishedVideo), 2);
    assert_eq!(events.count(EventKind::StartedVideo), 2);
    assert_eq!(events.count(EventKind::NewVideo), 2);
    assert_eq!(events.count(EventKind::ReadyToPlay), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_single_item_loops_without_new_video() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig {
        should_loop: true,
        start_playing_when_ready: true,
        ..PlayerConfig::default()
    })?;

    engine.set_source("short");
    run_until(&mut engine, |e| e.loop_count() >= 3).await?;

    assert_eq!(engine.state(), PlayerState::Playing);
    assert_eq!(events.count(EventKind::NewVideo), 1);
    assert_eq!(events.count(EventKind::StoppedVideo), 0);

    let loops: Vec<u64> = events
        .events()
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::LoopedVideo { count } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(loops, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_seek_while_playing() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig::default())?;

    engine.set_source("long");
    engine.play();
    run_until(&mut engine, |e| e.progress() >= 0.2).await?;

    events.clear();
    engine.seek(0.8);
    assert!(engine.is_seeking());
    run_until(&mut engine, |e| !e.is_seeking()).await?;

    assert_eq!(events.kinds()[..2], [EventKind::SeekStarted, EventKind::SeekEnded]);
    let progress = events.progress_values();
    assert!((progress[0] - 0.8).abs() < 1e-9);

    run_until(&mut engine, |e| e.state() == PlayerState::Stopped).await?;
    let progress = events.progress_values();
    assert!(progress.iter().all(|p| *p >= 0.8 - 1e-9));
    assert_monotonic(&progress);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_position() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig::default())?;

    engine.set_source("long");
    engine.play();
    run_until(&mut engine, |e| e.current_time() >= 0.3).await?;

    engine.pause();
    let paused_at = engine.current_time();
    events.clear();

    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.pump();
    assert_eq!(engine.current_time(), paused_at);
    assert!(events.progress_values().is_empty());

    engine.play();
    run_until(&mut engine, |e| e.current_time() > paused_at).await?;
    assert_eq!(engine.state(), PlayerState::Playing);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_source_reports_error() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig::default())?;

    engine.set_source("offline");
    run_until(&mut engine, |e| e.state() == PlayerState::Error).await?;

    assert_eq!(
        events.events(),
        vec![
            PlayerEvent::NewVideo,
            PlayerEvent::Error { message: "host unreachable".to_string() },
        ]
    );

    engine.set_source("nowhere");
    run_until(&mut engine, |e| e.state() == PlayerState::Error).await?;
    assert_eq!(
        events.events().last(),
        Some(&PlayerEvent::Error { message: "resource not found: nowhere".to_string() })
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_zero_length_item_is_rejected() -> Result<()> {
    let (mut engine, events) = engine(PlayerConfig {
        should_loop: true,
        start_playing_when_ready: true,
        ..PlayerConfig::default()
    })?;

    engine.set_source("still");
    run_until(&mut engine, |e| e.state() == PlayerState::Error).await?;
    assert_eq!(
        events.events(),
        vec![
            PlayerEvent::NewVideo,
            PlayerEvent::Error { message: "asset reported an invalid duration".to_string() },
        ]
    );

    events.clear();
    engine.play();
    engine.seek(0.5);
    tokio::time::sleep(Duration::from_millis(500)).await;
    engine.pump();

    assert_eq!(engine.state(), PlayerState::Error);
    assert_eq!(engine.loop_count(), 0);
    assert!(events.events().is_empty());
    Ok(())
}
