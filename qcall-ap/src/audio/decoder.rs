//! Audio decoder using symphonia
//!
//! Decodes a whole MP3 or WAV clip held in memory to interleaved stereo f32.

use crate::audio::types::{ClipFormat, DecodedClip};
use crate::error::PlaybackError;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode an entire clip to PCM.
///
/// # Returns
/// Interleaved stereo samples at the clip's native sample rate. Mono sources
/// are duplicated to both channels; channels beyond the first two are dropped.
///
/// # Errors
/// [`PlaybackError::Decode`] when the bytes are not a recognizable container,
/// no audio track exists, or the clip holds no audio frames.
pub fn decode_clip(bytes: Vec<u8>, format: ClipFormat) -> Result<DecodedClip, PlaybackError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("Failed to probe format: {}", e)))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PlaybackError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame: skip it and keep going
                warn!("Decode error: {}", e);
                continue;
            }
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);

        let needs_new_buf = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * spec.channels.count());
        if needs_new_buf {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            push_stereo(buf.samples(), spec.channels.count(), &mut samples);
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| PlaybackError::Decode("Sample rate not found".to_string()))?;

    let clip = DecodedClip::new(samples, sample_rate);
    if clip.is_empty() {
        return Err(PlaybackError::Decode("Clip contains no audio frames".to_string()));
    }

    debug!(
        "Decoded {} frames at {}Hz ({:.2}s)",
        clip.frames(),
        clip.sample_rate,
        clip.duration().as_secs_f32()
    );

    Ok(clip)
}

/// Append interleaved samples with `channels` channels as stereo.
fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            for &sample in interleaved {
                output.push(sample);
                output.push(sample);
            }
        }
        _ => {
            for frame in interleaved.chunks_exact(channels) {
                output.push(frame[0]);
                output.push(frame[1]);
            }
        }
    }
}
