//! Audio test file generation
//!
//! Short deterministic clips laid out the way the service expects
//! (`<sounds>/numbers/7.wav`, `<sounds>/phrases/raqam_egasi.wav`, ...).

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a 16-bit sine WAV.
pub fn write_sine_wav(path: &Path, sample_rate: u32, channels: u16, duration_ms: u64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();

    let frames = sample_rate as u64 * duration_ms / 1000;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = ((2.0 * PI * 440.0 * t).sin() * 0.5 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Write bytes that no decoder accepts.
pub fn write_garbage(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"this is not an audio file at all").unwrap();
}

/// Temporary sounds directory.
pub struct SoundsDir {
    dir: TempDir,
}

impl SoundsDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for segment `id` with extension `ext`.
    pub fn clip_path(&self, id: &str, ext: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{}", id, ext))
    }

    /// Add a 50ms stereo WAV for segment `id` at `sample_rate`.
    pub fn add_wav(&self, id: &str, sample_rate: u32) -> PathBuf {
        let path = self.clip_path(id, "wav");
        write_sine_wav(&path, sample_rate, 2, 50);
        path
    }
}
