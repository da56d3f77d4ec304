use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, error, info, warn};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use playview::backend::CatalogResolver;
use playview::events::PlayerEvent;
use playview::player::{PlaybackEngine, PlayerCommand};
use playview::utils::{format_seconds, load_config, Config};

/// playview - play a queue of catalog sources and log every player event
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source locators to play, in order
    #[arg(value_name = "SOURCE", required = true)]
    sources: Vec<String>,

    /// Source catalog (TOML)
    #[arg(short, long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Loop the queue
    #[arg(short = 'l', long = "loop")]
    looping: bool,

    /// Start playing as soon as the first source is ready
    #[arg(short, long)]
    autoplay: bool,

    /// Set initial volume (0-100)
    #[arg(short, long, value_name = "VOLUME")]
    volume: Option<u8>,

    /// Print events as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Configuration file instead of the system and user files
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => load_config()?,
    };

    // Initialize logging
    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting playview v{}", env!("CARGO_PKG_VERSION"));

    if args.looping {
        config.player.should_loop = true;
    }
    if args.autoplay {
        config.player.start_playing_when_ready = true;
    }
    if let Some(volume) = args.volume {
        config.player.volume = f32::from(volume.min(100)) / 100.0;
    }

    let catalog_path = args.catalog
        .clone()
        .or_else(|| config.general.catalog.clone())
        .context("No source catalog given (use --catalog or general.catalog)")?;
    let resolver = CatalogResolver::from_file(&catalog_path)?;
    info!("Loaded {} catalog entries from {:?}", resolver.len(), catalog_path);
    for source in &args.sources {
        if !resolver.contains(source.trim()) {
            warn!("{} is not in the catalog", source);
        } else if let Some(entry) = resolver.get(source.trim()) {
            debug!("{}: duration {:?}, latency {}ms", source, entry.duration, entry.latency_ms);
        }
    }

    let mut engine = PlaybackEngine::builder()
        .with_config(config.player.clone())
        .with_resolver(Arc::new(resolver))
        .build()?;

    let handle = engine.handle();
    let json = args.json;
    engine.events().subscribe_all(move |event| {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to serialize event: {}", e),
            }
        } else {
            match event {
                PlayerEvent::PlayingVideo { progress } => debug!("Progress: {:.1}%", progress * 100.0),
                PlayerEvent::LoopedVideo { count } => info!("Looped ({} so far)", count),
                PlayerEvent::Error { .. } => {}
                other => info!("{:?}", other),
            }
        }

        if matches!(event, PlayerEvent::StoppedVideo | PlayerEvent::Error { .. }) {
            handle.send(PlayerCommand::Shutdown);
        }
    });

    let interrupt = engine.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && !interrupt.is_closed() {
            info!("Interrupted");
            interrupt.send(PlayerCommand::Shutdown);
        }
    });

    engine.set_sources(&args.sources);
    if !config.player.start_playing_when_ready {
        engine.play();
    }

    engine.run().await;

    for (index, item) in engine.queue().items().iter().enumerate() {
        debug!("Slot {}: {} ({:?})", index, item.source, item.status);
    }
    if let Some(current) = engine.current_index().and_then(|index| engine.queue().get(index)) {
        info!("Last item: {}", current.source);
    }

    info!(
        "Stopped at {} of {} after {} loop(s)",
        format_seconds(engine.current_time()),
        format_seconds(engine.video_length()),
        engine.loop_count()
    );

    Ok(())
}
