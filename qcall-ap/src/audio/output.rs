//! Audio output using cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated speaker thread
//! for its whole life. Other threads talk to it through a shared clip slot:
//! `play` drops a clip into the slot, the stream callback drains it and fires
//! the clip's done signal when the last frame has been written.

use crate::audio::types::DecodedClip;
use crate::error::PlaybackError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Fires once when a clip has been fully written to the device.
///
/// Disconnects without firing if the clip was cleared or replaced.
pub type DoneSignal = Receiver<()>;

/// Sink for decoded clips.
///
/// The device is opened once, at the rate of the first clip, and stays open
/// until [`OutputDevice::close`].
pub trait OutputDevice: Send + Sync {
    /// Open the device, asking for `sample_rate`.
    ///
    /// Returns the rate the device actually runs at. Calling again after a
    /// successful open returns the existing rate without reopening.
    fn init(&self, sample_rate: u32) -> Result<u32, PlaybackError>;

    /// Queue a clip for output. The clip must already be at the device rate.
    fn play(&self, clip: DecodedClip) -> Result<DoneSignal, PlaybackError>;

    /// Drop whatever is currently playing.
    fn clear(&self);

    /// Release the device. Safe to call more than once.
    fn close(&self);
}

/// Clip currently being written to the device.
struct ActiveClip {
    samples: Vec<f32>,
    position: usize,
    done: SyncSender<()>,
}

impl ActiveClip {
    fn next_frame(&mut self) -> Option<(f32, f32)> {
        let left = *self.samples.get(self.position)?;
        let right = self.samples.get(self.position + 1).copied().unwrap_or(left);
        self.position += DecodedClip::CHANNELS as usize;
        Some((left, right))
    }

    fn finish(self) {
        // Receiver may have given up already (timeout)
        let _ = self.done.try_send(());
    }
}

type ClipSlot = Arc<Mutex<Option<ActiveClip>>>;

fn lock_slot(slot: &ClipSlot) -> MutexGuard<'_, Option<ActiveClip>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SpeakerThread {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
    sample_rate: u32,
}

/// Output device backed by the system audio host.
pub struct CpalOutput {
    device_name: Option<String>,
    slot: ClipSlot,
    speaker: Mutex<Option<SpeakerThread>>,
}

impl CpalOutput {
    /// Create an output for the named device (None = system default).
    ///
    /// Nothing is opened until the first [`OutputDevice::init`].
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            slot: Arc::new(Mutex::new(None)),
            speaker: Mutex::new(None),
        }
    }

    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>, PlaybackError> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| PlaybackError::Device(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    fn speaker(&self) -> MutexGuard<'_, Option<SpeakerThread>> {
        self.speaker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputDevice for CpalOutput {
    fn init(&self, sample_rate: u32) -> Result<u32, PlaybackError> {
        let mut speaker = self.speaker();
        if let Some(running) = speaker.as_ref() {
            return Ok(running.sample_rate);
        }

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<u32, PlaybackError>>(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let device_name = self.device_name.clone();
        let slot = Arc::clone(&self.slot);

        let handle = thread::Builder::new()
            .name("qcall-speaker".to_string())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), sample_rate, slot) {
                    Ok((stream, rate)) => {
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Park until close() signals or drops the sender
                let _ = shutdown_rx.recv();
                if let Err(e) = stream.pause() {
                    warn!("Failed to pause stream: {}", e);
                }
                drop(stream);
                debug!("Speaker thread exiting");
            })
            .map_err(|e| PlaybackError::Device(format!("Failed to spawn speaker thread: {}", e)))?;

        let rate = match ready_rx.recv() {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(PlaybackError::Device(
                    "Speaker thread exited during startup".to_string(),
                ));
            }
        };

        info!("Audio device open at {}Hz", rate);
        *speaker = Some(SpeakerThread {
            shutdown: shutdown_tx,
            handle,
            sample_rate: rate,
        });
        Ok(rate)
    }

    fn play(&self, clip: DecodedClip) -> Result<DoneSignal, PlaybackError> {
        if self.speaker().is_none() {
            return Err(PlaybackError::Device("Audio device not initialized".to_string()));
        }

        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let previous = lock_slot(&self.slot).replace(ActiveClip {
            samples: clip.samples,
            position: 0,
            done: done_tx,
        });
        if previous.is_some() {
            warn!("Replacing a clip that had not finished playing");
        }
        Ok(done_rx)
    }

    fn clear(&self) {
        if lock_slot(&self.slot).take().is_some() {
            debug!("Cleared active clip");
        }
    }

    fn close(&self) {
        self.clear();
        let Some(speaker) = self.speaker().take() else {
            return;
        };
        let _ = speaker.shutdown.send(());
        if speaker.handle.join().is_err() {
            error!("Speaker thread panicked");
        }
        info!("Audio device closed");
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.close();
    }
}

/// Find the device and start a stream on it. Runs on the speaker thread.
fn open_stream(
    device_name: Option<&str>,
    sample_rate: u32,
    slot: ClipSlot,
) -> Result<(Stream, u32), PlaybackError> {
    let device = select_device(device_name)?;
    let (config, sample_format) = select_config(&device, sample_rate)?;

    debug!(
        "Audio config: sample_rate={}, channels={}, format={:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, slot)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, slot)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, slot)?,
        other => {
            return Err(PlaybackError::Device(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream
        .play()
        .map_err(|e| PlaybackError::Device(format!("Failed to start stream: {}", e)))?;

    Ok((stream, config.sample_rate.0))
}

/// Requested device by name, falling back to the default device.
fn select_device(device_name: Option<&str>) -> Result<Device, PlaybackError> {
    let host = cpal::default_host();

    if let Some(name) = device_name {
        let found = host
            .output_devices()
            .map_err(|e| PlaybackError::Device(format!("Failed to enumerate devices: {}", e)))?
            .find(|d| d.name().ok().as_deref() == Some(name));

        match found {
            Some(device) => {
                info!("Using requested audio device: {}", name);
                return Ok(device);
            }
            None => warn!("Requested device '{}' not found, falling back to default device", name),
        }
    }

    let device = host
        .default_output_device()
        .ok_or_else(|| PlaybackError::Device("No default output device found".to_string()))?;
    info!(
        "Using default audio device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );
    Ok(device)
}

/// Config at `sample_rate` if the device supports it, preferring stereo f32.
/// Otherwise the device default, and clips get resampled to match.
fn select_config(device: &Device, sample_rate: u32) -> Result<(StreamConfig, SampleFormat), PlaybackError> {
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| PlaybackError::Device(format!("Failed to get device configs: {}", e)))?
        .filter(|range| {
            range.min_sample_rate().0 <= sample_rate && range.max_sample_rate().0 >= sample_rate
        })
        .collect();

    let preferred = ranges
        .iter()
        .find(|r| r.channels() == 2 && r.sample_format() == SampleFormat::F32)
        .or_else(|| ranges.first());

    if let Some(range) = preferred {
        let supported = range.clone().with_sample_rate(cpal::SampleRate(sample_rate));
        return Ok((supported.config(), supported.sample_format()));
    }

    warn!("Device does not support {}Hz, using its default config", sample_rate);
    let supported = device
        .default_output_config()
        .map_err(|e| PlaybackError::Device(format!("Failed to get default config: {}", e)))?;
    Ok((supported.config(), supported.sample_format()))
}

fn build_stream<T>(device: &Device, config: &StreamConfig, slot: ClipSlot) -> Result<Stream, PlaybackError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| fill_output(data, channels, &slot),
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| PlaybackError::Device(format!("Failed to build stream: {}", e)))
}

/// Stream callback body: copy frames out of the active clip, silence after it.
fn fill_output<T>(data: &mut [T], channels: usize, slot: &ClipSlot)
where
    T: SizedSample + FromSample<f32>,
{
    let mut active = lock_slot(slot);

    for frame in data.chunks_mut(channels.max(1)) {
        let (left, right) = match active.as_mut().and_then(ActiveClip::next_frame) {
            Some(pair) => pair,
            None => {
                if let Some(finished) = active.take() {
                    finished.finish();
                }
                (0.0, 0.0)
            }
        };
        write_frame(frame, left, right);
    }
}

fn write_frame<T>(frame: &mut [T], left: f32, right: f32)
where
    T: Sample + FromSample<f32>,
{
    match frame {
        [] => {}
        [mono] => *mono = T::from_sample(((left + right) * 0.5).clamp(-1.0, 1.0)),
        [l, r, rest @ ..] => {
            *l = T::from_sample(left.clamp(-1.0, 1.0));
            *r = T::from_sample(right.clamp(-1.0, 1.0));
            for extra in rest {
                *extra = T::EQUILIBRIUM;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_with(samples: Vec<f32>) -> (ClipSlot, DoneSignal) {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let slot = Arc::new(Mutex::new(Some(ActiveClip {
            samples,
            position: 0,
            done: done_tx,
        })));
        (slot, done_rx)
    }

    #[test]
    fn test_fill_output_copies_then_signals_done() {
        let (slot, done) = slot_with(vec![0.1, 0.2, 0.3, 0.4]);

        let mut data = [1.0f32; 8];
        fill_output(&mut data, 2, &slot);

        assert_eq!(data, [0.1, 0.2, 0.3, 0.4, 0.0, 0.0, 0.0, 0.0]);
        assert!(done.try_recv().is_ok());
        assert!(slot.lock().unwrap().is_none());
    }

    #[test]
    fn test_fill_output_keeps_clip_until_drained() {
        let (slot, done) = slot_with(vec![0.5; 8]);

        let mut data = [0.0f32; 4];
        fill_output(&mut data, 2, &slot);
        assert!(done.try_recv().is_err());
        assert!(slot.lock().unwrap().is_some());

        fill_output(&mut data, 2, &slot);
        fill_output(&mut data, 2, &slot);
        assert!(done.try_recv().is_ok());
    }

    #[test]
    fn test_fill_output_mono_device_downmixes() {
        let (slot, _done) = slot_with(vec![0.2, 0.4]);

        let mut data = [0.0f32; 1];
        fill_output(&mut data, 1, &slot);
        assert!((data[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_fill_output_silence_when_empty() {
        let slot: ClipSlot = Arc::new(Mutex::new(None));

        let mut data = [i16::MAX; 6];
        fill_output(&mut data, 3, &slot);
        assert_eq!(data, [0; 6]);
    }

    #[test]
    fn test_play_requires_init() {
        let output = CpalOutput::new(None);
        let result = output.play(DecodedClip::new(vec![0.0; 4], 44100));
        assert!(matches!(result, Err(PlaybackError::Device(_))));
    }

    #[test]
    fn test_clear_disconnects_done_signal() {
        let (slot, done) = slot_with(vec![0.5; 8]);
        slot.lock().unwrap().take();
        assert!(matches!(done.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
    }
}
