//! btsource - stream a local track catalog to a named Bluetooth sink.
//!
//! Brings up the radio, scans the music directory, starts a random track and
//! hands control to the event dispatch loop, which runs until Ctrl-C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use btsource_bluetooth::{PeerDiscovery, RadioStack, SimulatedRadio};
use btsource_control::{Config, Dispatcher};
use btsource_core::event_queue;
use btsource_playback::{PlaybackController, SimulatedPipeline, TrackCatalog};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// This program's crates, for log filtering.
const CRATES: &[&str] = &[
    "btsource",
    "btsource_core",
    "btsource_bluetooth",
    "btsource_playback",
    "btsource_control",
];

/// Command-line arguments for btsource
#[derive(Parser, Debug)]
#[command(name = "btsource")]
#[command(about = "Bluetooth A2DP source streaming a local track catalog")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Advertised name of the sink to connect to
    #[arg(short, long, env = "BT_REMOTE_NAME")]
    remote_name: Option<String>,

    /// Directory holding the tracks
    #[arg(short, long, env = "BTSOURCE_MUSIC_DIR")]
    music_dir: Option<PathBuf>,

    /// Enable debug logging for this program
    #[arg(short, long)]
    debug: bool,
}

fn default_filter(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    let mut filter = String::from("warn");
    for name in CRATES {
        filter.push_str(&format!(",{}={}", name, level));
    }
    filter
}

fn setup_logging(args: &Args) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(args.debug))),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_overrides(args.remote_name.clone(), args.music_dir.clone())
        .context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging before anything else
    setup_logging(&args);

    let config = load_config(&args)?;
    info!("Starting btsource, target sink: {}", config.remote_name);
    info!("Music directory: {}", config.music_dir.display());

    let (events, mut queue) = event_queue();

    // Storage
    let catalog = TrackCatalog::scan(&config.music_dir, &config.scan_options())
        .context("Failed to scan music directory")?;
    if catalog.is_empty() {
        anyhow::bail!("No playable tracks under {}", config.music_dir.display());
    }

    // Radio
    let mut radio = SimulatedRadio::new(events.clone(), config.simulated_peers())
        .with_inquiry_unit(config.simulation.inquiry_unit())
        .with_connect_delay(config.simulation.connect_delay());
    radio
        .set_device_name(&config.device_name)
        .context("Failed to set local device name")?;

    // Pipeline
    let mut pipeline = SimulatedPipeline::new(events);
    if let Some(max) = config.simulation.max_track_duration() {
        pipeline = pipeline.with_max_track_duration(max);
    }

    let mut playback = PlaybackController::new(catalog, pipeline);
    let mut discovery = PeerDiscovery::new(radio, config.target_name()?)
        .with_inquiry_window(config.inquiry_window()?);

    playback.start().context("Failed to start playback")?;
    info!("Starting device discovery...");
    discovery
        .start_discovery()
        .context("Failed to start device discovery")?;

    let mut dispatcher = Dispatcher::new(discovery, playback);

    tokio::select! {
        stats = dispatcher.run(&mut queue) => {
            warn!("Event loop ended after {} events", stats.dispatched);
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
