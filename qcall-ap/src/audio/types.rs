//! Core audio data types
//!
//! A decoded clip is held entirely in RAM: announcement segments are a few
//! seconds long, so there is no streaming decode.

use std::path::Path;
use std::time::Duration;

/// Container formats a segment may be recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipFormat {
    Mp3,
    Wav,
}

/// Lookup order when resolving a segment to a file: first match wins.
pub const FORMAT_PREFERENCE: [ClipFormat; 2] = [ClipFormat::Mp3, ClipFormat::Wav];

impl ClipFormat {
    /// File extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            ClipFormat::Mp3 => "mp3",
            ClipFormat::Wav => "wav",
        }
    }

    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        FORMAT_PREFERENCE.into_iter().find(|f| f.extension() == ext)
    }
}

/// DecodedClip holds a clip's PCM audio ready for the output device.
///
/// **Format:**
/// - Samples are f32 (-1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...] (mono sources duplicated)
/// - `sample_rate` is the rate the samples are currently at
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedClip {
    pub const CHANNELS: u16 = 2;

    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / Self::CHANNELS as usize
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}
