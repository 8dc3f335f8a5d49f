//! Error types for qcall-ap
//!
//! Three layers, matching how far a failure is allowed to travel:
//! - [`PlaybackError`]: one clip failed; the announcement logs it and moves on
//! - [`NumeralError`]: a ticket number has no spoken form; that step is skipped
//! - [`Error`]: service-level failures (configuration, HTTP server, log file)

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for qcall-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] qcall_common::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using qcall-ap Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to play one segment
///
/// Never fatal: the announcer logs these and continues with the next segment.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No clip exists for the segment in any supported format
    #[error("Segment not found: {segment} (tried {tried})")]
    SegmentNotFound { segment: String, tried: String },

    /// Clip exists but could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Clip did not finish within the playback bound; the device was cleared
    #[error("Playback of {segment} timed out after {timeout:?}")]
    PlaybackTimeout { segment: String, timeout: Duration },

    /// Output device could not be opened or refused the clip
    #[error("Audio device error: {0}")]
    Device(String),

    /// Clip file exists but could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ticket number outside the range that has recorded clips
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumeralError {
    #[error("No audio for number {0} (supported range 1-199)")]
    UnsupportedNumber(u32),
}
