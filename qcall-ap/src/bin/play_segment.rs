//! play-segment: play one clip through the real output device
//!
//! Useful when installing a new speaker or checking a freshly recorded clip.
//!
//! ```text
//! play-segment sounds/numbers/7.mp3
//! play-segment --device "USB Audio" --timeout-ms 5000 sounds/phrases/raqam_egasi.wav
//! play-segment --list-devices
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use qcall_ap::audio::CpalOutput;
use qcall_ap::playback::{FileSegmentPlayer, SegmentLibrary};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "play-segment")]
#[command(about = "Play a single announcement clip")]
#[command(version)]
struct Args {
    /// Clip to play (.mp3 or .wav)
    #[arg(required_unless_present = "list_devices")]
    file: Option<PathBuf>,

    /// Give up after this many milliseconds
    #[arg(long, default_value = "10000")]
    timeout_ms: u64,

    /// Output device name (default device when omitted)
    #[arg(short, long)]
    device: Option<String>,

    /// Print available output devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "play_segment=info,qcall_ap=info".into()),
        )
        .init();

    let args = Args::parse();

    if args.list_devices {
        for name in CpalOutput::list_devices().context("Failed to list output devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let Some(file) = args.file else {
        bail!("No clip given");
    };
    if !file.is_file() {
        bail!("Clip not found: {}", file.display());
    }

    let base_dir = file.parent().map(PathBuf::from).unwrap_or_default();
    let player = FileSegmentPlayer::new(
        SegmentLibrary::new(base_dir),
        Arc::new(CpalOutput::new(args.device)),
        Duration::from_millis(args.timeout_ms),
    );

    info!("Playing {}", file.display());
    let result = player.play_file(&file);
    player.close();
    result.with_context(|| format!("Failed to play {}", file.display()))?;

    info!("Done");
    Ok(())
}
