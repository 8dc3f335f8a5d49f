//! Announcement Player (qcall-ap) - Main entry point
//!
//! Startup: CLI, TOML bootstrap, tracing, then player -> announcer -> queue,
//! then the HTTP server. On Ctrl+C / SIGTERM the server stops accepting,
//! the queue plays what is left, and the audio device is released.

use anyhow::{Context, Result};
use clap::Parser;
use qcall_ap::api::{self, AppContext};
use qcall_ap::audio::{CpalOutput, OutputDevice};
use qcall_ap::config::{load_config, Args};
use qcall_ap::logging::init_tracing;
use qcall_ap::playback::{AnnouncementQueue, FileSegmentPlayer, NumeralAnnouncer, SegmentLibrary};
use qcall_ap::RequestMetrics;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args).context("Failed to load configuration")?;

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    // Log build identification immediately after tracing init
    info!(
        "Starting qcall-ap v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if !config.sounds_dir.is_dir() {
        warn!(
            "Sounds directory {} does not exist; every announcement will be silent",
            config.sounds_dir.display()
        );
    } else {
        info!("Sounds directory: {}", config.sounds_dir.display());
    }

    if config.queue.worker_count > 1 {
        warn!(
            "{} announcement workers configured; clips still play one at a time and announcements may interleave",
            config.queue.worker_count
        );
    }

    let device: Arc<dyn OutputDevice> = Arc::new(CpalOutput::new(config.audio.device.clone()));
    let player = Arc::new(FileSegmentPlayer::new(
        SegmentLibrary::new(config.sounds_dir.clone()),
        device,
        config.audio.segment_timeout(),
    ));
    let announcer = Arc::new(NumeralAnnouncer::new(player.clone()));
    let queue = Arc::new(AnnouncementQueue::new(announcer, &config.queue));
    queue.start().await;

    let ctx = AppContext {
        queue: Arc::clone(&queue),
        metrics: Arc::new(RequestMetrics::new()),
    };

    let served = api::run(config.port, ctx, shutdown_signal()).await;
    if let Err(e) = &served {
        error!("{}", e);
    }

    queue.stop().await;
    player.close();
    info!("Shutdown complete");

    served.context("HTTP server failed")
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
