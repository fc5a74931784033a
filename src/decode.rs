//! Decode capability: raw file bytes in, PCM samples out.

use crate::error::TrackResult;

/// Decoded PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
    pub duration_seconds: f64,
}

impl DecodedAudio {
    /// Build from interleaved samples, deriving the duration
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        let frames = samples.len() / channels.max(1) as usize;
        let duration_seconds = if sample_rate > 0 {
            frames as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            channels,
            sample_rate,
            duration_seconds,
        }
    }

    /// Samples of the first channel only
    pub fn first_channel(&self) -> Vec<f32> {
        self.samples
            .iter()
            .step_by(self.channels.max(1) as usize)
            .copied()
            .collect()
    }
}

pub trait Decode {
    /// Decode a complete audio file held in memory.
    ///
    /// Fails with `TrackError::Decode` on malformed or unsupported data.
    fn decode(&self, bytes: &[u8]) -> TrackResult<DecodedAudio>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_channel_of_stereo() {
        let audio = DecodedAudio::new(vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 2, 3);
        assert_eq!(audio.first_channel(), vec![0.1, 0.2, 0.3]);
        assert_eq!(audio.duration_seconds, 1.0);
    }

    #[test]
    fn test_first_channel_of_mono() {
        let audio = DecodedAudio::new(vec![0.5, 0.25], 1, 4);
        assert_eq!(audio.first_channel(), vec![0.5, 0.25]);
        assert_eq!(audio.duration_seconds, 0.5);
    }

    #[test]
    fn test_zero_rate_has_zero_duration() {
        let audio = DecodedAudio::new(vec![0.5; 8], 1, 0);
        assert_eq!(audio.duration_seconds, 0.0);
    }
}
