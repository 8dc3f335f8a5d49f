//! Audio decode, resample, and device output

pub mod decoder;
pub mod output;
pub mod resampler;
pub mod types;

pub use decoder::decode_clip;
pub use output::{CpalOutput, DoneSignal, OutputDevice};
pub use resampler::Resampler;
pub use types::{ClipFormat, DecodedClip, FORMAT_PREFERENCE};
