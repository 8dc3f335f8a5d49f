//! Bootstrap configuration loading
//!
//! Configuration is read once at startup from an optional TOML file. Every
//! field has a built-in default, so a missing file (or a file that only sets a
//! few keys) never prevents the service from starting.
//!
//! # Config file resolution
//!
//! 1. Explicit path (`--config` on the command line)
//! 2. `QCALL_CONFIG` environment variable
//! 3. `<user config dir>/qcall/config.toml`
//! 4. `/etc/qcall/config.toml` (Linux only)
//! 5. Built-in defaults (no file)
//!
//! Command-line flags are applied on top of the loaded values by the binary.

use crate::time::millis_to_duration;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "QCALL_CONFIG";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base directory holding `numbers/` and `phrases/` clips
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,

    /// Announcement queue sizing
    #[serde(default)]
    pub queue: QueueConfig,

    /// Audio playback settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Announcement queue configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Number of workers pulling announcements (1 keeps playback strictly ordered)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Buffered announcements before new ones are dropped
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Pause between two announcements handled by the same worker
    #[serde(default = "default_inter_task_pause_ms")]
    pub inter_task_pause_ms: u64,
}

/// Audio playback configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Upper bound on a single clip's playback
    #[serde(default = "default_segment_timeout_ms")]
    pub segment_timeout_ms: u64,

    /// Output device name (None = system default device)
    #[serde(default)]
    pub device: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_port() -> u16 {
    8080
}

fn default_sounds_dir() -> PathBuf {
    PathBuf::from("./sounds")
}

fn default_worker_count() -> usize {
    1
}

fn default_capacity() -> usize {
    100
}

fn default_inter_task_pause_ms() -> u64 {
    100
}

fn default_segment_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            sounds_dir: default_sounds_dir(),
            queue: QueueConfig::default(),
            audio: AudioConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            capacity: default_capacity(),
            inter_task_pause_ms: default_inter_task_pause_ms(),
        }
    }
}

impl QueueConfig {
    pub fn inter_task_pause(&self) -> Duration {
        millis_to_duration(self.inter_task_pause_ms)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            segment_timeout_ms: default_segment_timeout_ms(),
            device: None,
        }
    }
}

impl AudioConfig {
    pub fn segment_timeout(&self) -> Duration {
        millis_to_duration(self.segment_timeout_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content).map_err(|source| Error::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Resolve and load the bootstrap configuration
    ///
    /// Missing files fall back to defaults with a warning. A file that exists
    /// but cannot be parsed is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load_from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue.worker_count == 0 {
            return Err(Error::Config("queue.worker_count must be at least 1".to_string()));
        }
        if self.queue.capacity == 0 {
            return Err(Error::Config("queue.capacity must be at least 1".to_string()));
        }
        if self.audio.segment_timeout_ms == 0 {
            return Err(Error::Config(
                "audio.segment_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Find the config file to use, following the documented priority order
///
/// Returns the explicit or environment path even when it does not exist so the
/// caller can report it; discovered default locations are only returned when
/// present.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("qcall").join("config.toml")) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/qcall/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
