//! Test doubles for the playback seams

use qcall_ap::audio::{DecodedClip, DoneSignal, OutputDevice};
use qcall_ap::error::PlaybackError;
use qcall_ap::playback::{SegmentId, SegmentPlayer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Segment player that records every call instead of making sound.
#[derive(Default)]
pub struct RecordingPlayer {
    played: Mutex<Vec<String>>,
    missing: HashSet<String>,
    delay: Duration,
    panic_next: AtomicBool,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend each clip takes `delay` to play.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Fail these segment ids with `SegmentNotFound`.
    pub fn with_missing(ids: &[&str]) -> Self {
        Self {
            missing: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Panic on the first `play` call, then behave normally.
    pub fn panicking_once() -> Self {
        Self {
            panic_next: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

impl SegmentPlayer for RecordingPlayer {
    fn play(&self, segment: &SegmentId) -> Result<(), PlaybackError> {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("segment player failed on {}", segment);
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.played.lock().unwrap().push(segment.to_string());
        if self.missing.contains(segment.as_str()) {
            return Err(PlaybackError::SegmentNotFound {
                segment: segment.to_string(),
                tried: "mp3, wav".to_string(),
            });
        }
        Ok(())
    }
}

/// Output device that finishes clips instantly (or after `finish_delay`),
/// or never when `hang` is set.
#[derive(Default)]
pub struct MockDevice {
    /// Rate `init` reports; None echoes the requested rate
    forced_rate: Option<u32>,
    hang: bool,
    finish_delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    init_calls: Mutex<Vec<u32>>,
    played: Mutex<Vec<(u32, usize)>>,
    held: Mutex<Vec<SyncSender<()>>>,
    clears: AtomicUsize,
    closes: AtomicUsize,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(rate: u32) -> Self {
        Self {
            forced_rate: Some(rate),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Clips take `delay` to finish, each on its own thread.
    pub fn with_finish_delay(delay: Duration) -> Self {
        Self {
            finish_delay: delay,
            ..Self::default()
        }
    }

    /// Most clips that were playing at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn init_calls(&self) -> Vec<u32> {
        self.init_calls.lock().unwrap().clone()
    }

    /// `(sample_rate, frames)` of every clip handed to the device
    pub fn played(&self) -> Vec<(u32, usize)> {
        self.played.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl OutputDevice for MockDevice {
    fn init(&self, sample_rate: u32) -> Result<u32, PlaybackError> {
        // Widen the window for racing first plays
        thread::sleep(Duration::from_millis(20));
        self.init_calls.lock().unwrap().push(sample_rate);
        Ok(self.forced_rate.unwrap_or(sample_rate))
    }

    fn play(&self, clip: DecodedClip) -> Result<DoneSignal, PlaybackError> {
        self.played.lock().unwrap().push((clip.sample_rate, clip.frames()));
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        if self.hang {
            self.held.lock().unwrap().push(done_tx);
        } else if self.finish_delay.is_zero() {
            done_tx.send(()).unwrap();
        } else {
            let playing = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(playing, Ordering::SeqCst);

            let in_flight = Arc::clone(&self.in_flight);
            let delay = self.finish_delay;
            thread::spawn(move || {
                thread::sleep(delay);
                // Finished before the listener hears about it
                in_flight.fetch_sub(1, Ordering::SeqCst);
                let _ = done_tx.send(());
            });
        }
        Ok(done_rx)
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
