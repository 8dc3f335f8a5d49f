//! qcall-ap command-line arguments
//!
//! Flags override values from the TOML bootstrap file.

use crate::error::Result;
use clap::Parser;
use qcall_common::config::TomlConfig;
use std::path::PathBuf;

/// Command-line arguments for qcall-ap
#[derive(Parser, Debug, Default)]
#[command(name = "qcall-ap")]
#[command(about = "Queue ticket announcement player")]
#[command(version)]
pub struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "QCALL_PORT")]
    pub port: Option<u16>,

    /// Directory containing numbers/ and phrases/ clips
    #[arg(short, long, env = "QCALL_SOUNDS_DIR")]
    pub sounds_dir: Option<PathBuf>,

    /// Number of announcement workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut TomlConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.sounds_dir {
            config.sounds_dir = dir.clone();
        }
        if let Some(workers) = self.workers {
            config.queue.worker_count = workers;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// Load the bootstrap file, apply CLI overrides, and validate the result.
pub fn load_config(args: &Args) -> Result<TomlConfig> {
    let mut config = TomlConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}
