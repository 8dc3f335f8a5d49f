//! Shared test infrastructure for qcall-ap integration tests
//!
//! - `audio_generator`: WAV fixtures written with hound
//! - `mocks`: recording segment player and scriptable output device

#![allow(dead_code)]

pub mod audio_generator;
pub mod mocks;

pub use audio_generator::{write_garbage, write_sine_wav, SoundsDir};
pub use mocks::{MockDevice, RecordingPlayer};
