//! File decoding for WAV, FLAC and anything rodio can read.
//!
//! WAV and FLAC go through `hound` and `claxon` directly, which handles every
//! bit depth those crates support. Other containers (mp3, ogg, ...) fall back
//! to `rodio::Decoder`. The format is chosen from the file's magic bytes, not
//! its extension.

use crate::decode::{Decode, DecodedAudio};
use crate::error::{TrackError, TrackResult};
use rodio::Source;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Container {
    Wav,
    Flac,
    Other,
}

fn sniff(bytes: &[u8]) -> Container {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        Container::Wav
    } else if bytes.starts_with(b"fLaC") {
        Container::Flac
    } else {
        Container::Other
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileDecoder;

impl Decode for FileDecoder {
    fn decode(&self, bytes: &[u8]) -> TrackResult<DecodedAudio> {
        let audio = match sniff(bytes) {
            Container::Wav => decode_wav(bytes)?,
            Container::Flac => decode_flac(bytes)?,
            Container::Other => decode_other(bytes)?,
        };

        if audio.channels == 0 || audio.sample_rate == 0 {
            return Err(TrackError::Decode(format!(
                "invalid stream: {} channels at {} Hz",
                audio.channels, audio.sample_rate
            )));
        }

        log::debug!(
            "Decoded {} samples, {} channels, {} Hz, {:.2}s",
            audio.samples.len(),
            audio.channels,
            audio.sample_rate,
            audio.duration_seconds
        );
        Ok(audio)
    }
}

fn decode_wav(bytes: &[u8]) -> TrackResult<DecodedAudio> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| TrackError::Decode(format!("WAV: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>(),
    }
    .map_err(|e| TrackError::Decode(format!("WAV: {e}")))?;

    Ok(DecodedAudio::new(samples, spec.channels, spec.sample_rate))
}

fn decode_flac(bytes: &[u8]) -> TrackResult<DecodedAudio> {
    let mut reader = claxon::FlacReader::new(Cursor::new(bytes))
        .map_err(|e| TrackError::Decode(format!("FLAC: {e}")))?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample.clamp(1, 32) - 1)) as f32;

    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<Result<_, _>>()
        .map_err(|e| TrackError::Decode(format!("FLAC: {e}")))?;

    Ok(DecodedAudio::new(
        samples,
        info.channels as u16,
        info.sample_rate,
    ))
}

fn decode_other(bytes: &[u8]) -> TrackResult<DecodedAudio> {
    let decoder = rodio::Decoder::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| TrackError::Decode(e.to_string()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();

    Ok(DecodedAudio::new(samples, channels, sample_rate))
}
