//! Radio Station (radio-station) - Main entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use radio_common::config::{resolve_root_folder, TomlConfig};
use radio_common::events::EventBus;
use radio_station::api::{self, AppContext};
use radio_station::background::BackgroundRotator;
use radio_station::catalog::TrackCatalog;
use radio_station::clock::{event_bus_observer, PlaybackClock};
use radio_station::config::Config;
use radio_station::publisher::PositionPublisher;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for radio-station
#[derive(Parser, Debug)]
#[command(name = "radio-station")]
#[command(about = "Shared radio playback clock and HTTP API")]
#[command(version)]
struct Args {
    /// Port to listen on (default 5000)
    #[arg(short, long, env = "RADIO_PORT")]
    port: Option<u16>,

    /// Root folder holding audios/, data/ and static/
    ///
    /// Falls back to RADIO_ROOT_FOLDER, then the config file, then the OS
    /// data directory.
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Modulus applied to published start references
    #[arg(long, env = "RADIO_MODULUS", value_parser = clap::value_parser!(u64).range(1..))]
    modulus: Option<u64>,

    /// Seconds between background image changes
    #[arg(long, env = "RADIO_BACKGROUND_INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
    background_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "radio_station=info,radio_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default();
    let config = build_config(&args, &toml_config)?;

    info!("Starting radio station on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    let catalog = Arc::new(
        TrackCatalog::new(config.audio_dir()).context("Failed to open track catalog")?,
    );
    let publisher = Arc::new(
        PositionPublisher::new(config.data_dir()).context("Failed to open data directory")?,
    );
    let events = EventBus::new(EVENT_BUS_CAPACITY);

    let clock = Arc::new(PlaybackClock::new(
        Arc::clone(&catalog),
        Arc::clone(&publisher),
        config.clock.clone(),
    ));
    clock.add_observer(event_bus_observer(events.clone()));

    let rotator = BackgroundRotator::new(
        &config.background_dir(),
        Arc::clone(&publisher),
        config.background_interval,
    );
    rotator.add_observer(event_bus_observer(events.clone()));

    clock.start().await;
    rotator.start().await;

    let ctx = AppContext {
        catalog,
        clock: Arc::clone(&clock),
        publisher,
        events,
        root_folder: config.root_folder.clone(),
        port: config.port,
    };
    let served = api::run(ctx, shutdown_signal()).await;

    rotator.stop(config.clock.stop_timeout).await;
    clock.stop().await;

    served.context("HTTP server failed")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Merge command line, environment and config file into a [`Config`]
fn build_config(args: &Args, toml_config: &TomlConfig) -> Result<Config> {
    let root_folder = resolve_root_folder(
        args.root_folder.as_deref(),
        "RADIO_ROOT_FOLDER",
        Some(toml_config),
    );
    let mut config = Config::new(root_folder);

    if let Some(port) = args.port.or(toml_config.port) {
        config.port = port;
    }
    if let Some(modulus) = args.modulus.or(toml_config.modulus) {
        if modulus == 0 {
            bail!("modulus must be at least 1");
        }
        config.clock.modulus = modulus;
    }
    if let Some(secs) = args.background_interval.or(toml_config.background_interval_secs) {
        if secs == 0 {
            bail!("background interval must be at least 1 second");
        }
        config.background_interval = Duration::from_secs(secs);
    }

    Ok(config)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
