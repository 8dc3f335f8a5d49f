//! Segment Player
//!
//! Plays one pre-recorded clip at a time on the shared output device,
//! blocking the caller until the clip ends or the playback bound expires.

use crate::audio::{decode_clip, ClipFormat, OutputDevice, Resampler};
use crate::error::PlaybackError;
use crate::playback::segment::{SegmentId, SegmentLibrary};
use std::path::Path;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Plays a single segment to completion.
///
/// Implementations block; async callers go through `spawn_blocking`.
pub trait SegmentPlayer: Send + Sync {
    fn play(&self, segment: &SegmentId) -> Result<(), PlaybackError>;
}

/// Segment player reading clips from a [`SegmentLibrary`] on disk.
pub struct FileSegmentPlayer {
    library: SegmentLibrary,
    device: Arc<dyn OutputDevice>,
    /// Device rate once opened. Held across `init` so concurrent first plays
    /// open the device exactly once.
    device_rate: Mutex<Option<u32>>,
    /// One clip on the speaker at a time, whatever the worker count.
    playback_lock: Mutex<()>,
    timeout: Duration,
}

impl FileSegmentPlayer {
    pub fn new(library: SegmentLibrary, device: Arc<dyn OutputDevice>, timeout: Duration) -> Self {
        Self {
            library,
            device,
            device_rate: Mutex::new(None),
            playback_lock: Mutex::new(()),
            timeout,
        }
    }

    pub fn library(&self) -> &SegmentLibrary {
        &self.library
    }

    /// Rate the device was opened at, if it has been opened.
    pub fn device_sample_rate(&self) -> Option<u32> {
        *lock(&self.device_rate)
    }

    /// Play an arbitrary clip file.
    ///
    /// The format comes from the file extension.
    pub fn play_file(&self, path: &Path) -> Result<(), PlaybackError> {
        let format = ClipFormat::from_path(path).ok_or_else(|| {
            PlaybackError::Decode(format!("Unsupported file type: {}", path.display()))
        })?;
        self.play_clip_file(path, format, &path.display().to_string())
    }

    /// Stop anything playing and release the device.
    pub fn close(&self) {
        self.device.clear();
        self.device.close();
    }

    fn play_clip_file(&self, path: &Path, format: ClipFormat, label: &str) -> Result<(), PlaybackError> {
        let bytes = std::fs::read(path).map_err(|source| PlaybackError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let clip = decode_clip(bytes, format)?;
        let device_rate = self.ensure_device(clip.sample_rate)?;
        let clip = Resampler::resample_clip(clip, device_rate)?;
        let expected = clip.duration();

        let _playing = lock(&self.playback_lock);
        let started = Instant::now();
        let done = self.device.play(clip)?;

        match done.recv_timeout(self.timeout) {
            Ok(()) => {
                debug!(
                    "Played {} ({:.2}s, took {}ms)",
                    label,
                    expected.as_secs_f32(),
                    started.elapsed().as_millis()
                );
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                self.device.clear();
                Err(PlaybackError::PlaybackTimeout {
                    segment: label.to_string(),
                    timeout: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(PlaybackError::Device(format!(
                "Playback of {} was interrupted",
                label
            ))),
        }
    }

    /// Open the device at the first clip's rate; later calls return that rate.
    fn ensure_device(&self, clip_rate: u32) -> Result<u32, PlaybackError> {
        let mut device_rate = lock(&self.device_rate);
        if let Some(rate) = *device_rate {
            return Ok(rate);
        }

        let rate = self.device.init(clip_rate)?;
        if rate != clip_rate {
            warn!(
                "Device opened at {}Hz instead of {}Hz, clips will be resampled",
                rate, clip_rate
            );
        }
        *device_rate = Some(rate);
        Ok(rate)
    }
}

impl SegmentPlayer for FileSegmentPlayer {
    fn play(&self, segment: &SegmentId) -> Result<(), PlaybackError> {
        let resolved = self.library.resolve(segment)?;
        self.play_clip_file(&resolved.path, resolved.format, segment.as_str())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
