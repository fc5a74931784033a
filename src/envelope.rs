//! Amplitude envelope extraction for track lane visualization.
//!
//! An envelope is a coarse, fixed-time-window summary of a track's loudness.
//! It is computed once when a track is loaded and never recomputed: each bin
//! holds the root-mean-square energy of one 100 ms window of the first
//! channel, so a multi-minute file collapses to a few thousand values that are
//! cheap to redraw on every frame.

use crate::error::{TrackError, TrackResult};
use serde::Serialize;

/// Nominal length of one envelope window in seconds
pub const WINDOW_SECONDS: f64 = 0.1;

/// Per-window RMS energies covering a whole track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// One non-negative energy value per window, in temporal order
    bins: Vec<f32>,
    /// Exact duration covered by one full window
    window_seconds: f64,
    /// Duration of the decoded audio in seconds
    total_duration_seconds: f64,
}

impl Envelope {
    /// Build an envelope from precomputed bins.
    ///
    /// Used by tests and by callers that already hold bin data; values are not
    /// validated beyond what the type guarantees.
    pub fn from_bins(bins: Vec<f32>, window_seconds: f64, total_duration_seconds: f64) -> Self {
        Self {
            bins,
            window_seconds,
            total_duration_seconds,
        }
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_seconds
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration_seconds
    }

    /// Largest bin value, or 0.0 for an empty envelope
    pub fn max_bin(&self) -> f32 {
        self.bins.iter().copied().fold(0.0, f32::max)
    }
}

/// Number of samples in one envelope window for the given rate.
///
/// Rates below 10 Hz would yield a zero-length window; those use one sample
/// per window instead.
pub fn window_len(sample_rate: u32) -> usize {
    ((sample_rate as f64 * WINDOW_SECONDS).floor() as usize).max(1)
}

/// Compute the RMS envelope of a single channel of samples.
///
/// # Arguments
/// * `samples` - Mono samples, normally in [-1.0, 1.0]
/// * `sample_rate` - Samples per second of `samples`
///
/// # Returns
/// An envelope with `ceil(samples.len() / window_len(sample_rate))` bins. The
/// final bin covers whatever is left over and is averaged over its own length.
///
/// # Errors
/// `TrackError::InvalidAudioData` when `samples` is empty or `sample_rate` is 0.
pub fn extract(samples: &[f32], sample_rate: u32) -> TrackResult<Envelope> {
    if samples.is_empty() {
        return Err(TrackError::InvalidAudioData("no samples".to_string()));
    }
    if sample_rate == 0 {
        return Err(TrackError::InvalidAudioData(
            "sample rate must be positive".to_string(),
        ));
    }

    let window = window_len(sample_rate);
    let bins = samples
        .chunks(window)
        .map(|chunk| {
            let sum: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
            let rms = (sum / chunk.len() as f64).sqrt() as f32;
            // NaN/inf input samples must not leak into the lane
            if rms.is_finite() { rms } else { 0.0 }
        })
        .collect();

    Ok(Envelope {
        bins,
        window_seconds: window as f64 / sample_rate as f64,
        total_duration_seconds: samples.len() as f64 / sample_rate as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_len() {
        assert_eq!(window_len(44100), 4410);
        assert_eq!(window_len(48000), 4800);
        assert_eq!(window_len(22050), 2205);
        assert_eq!(window_len(8), 1);
    }

    #[test]
    fn test_extract_rejects_empty_samples() {
        let result = extract(&[], 44100);
        assert!(matches!(result, Err(TrackError::InvalidAudioData(_))));
    }

    #[test]
    fn test_extract_rejects_zero_sample_rate() {
        let result = extract(&[0.5; 10], 0);
        assert!(matches!(result, Err(TrackError::InvalidAudioData(_))));
    }

    #[test]
    fn test_bin_count_is_ceiling_of_windows() {
        // 1000 Hz -> 100 samples per window
        for (len, expected) in [(1, 1), (99, 1), (100, 1), (101, 2), (250, 3), (1000, 10)] {
            let samples = vec![0.1; len];
            let envelope = extract(&samples, 1000).unwrap();
            assert_eq!(envelope.len(), expected, "len {len}");
        }
    }

    #[test]
    fn test_constant_signal_rms() {
        let samples = vec![0.5; 300];
        let envelope = extract(&samples, 1000).unwrap();
        for &bin in envelope.bins() {
            assert!((bin - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rms_ignores_sign() {
        let samples: Vec<f32> = (0..100)
            .map(|i| if i % 2 == 0 { 0.8 } else { -0.8 })
            .collect();
        let envelope = extract(&samples, 1000).unwrap();
        assert_eq!(envelope.len(), 1);
        assert!((envelope.bins()[0] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_partial_last_window_averages_own_length() {
        // 150 samples at 1000 Hz: one full window of zeros, half a window of 0.6
        let mut samples = vec![0.0; 100];
        samples.extend(vec![0.6; 50]);
        let envelope = extract(&samples, 1000).unwrap();
        assert_eq!(envelope.len(), 2);
        assert_eq!(envelope.bins()[0], 0.0);
        assert!((envelope.bins()[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_single_spike_is_smoothed() {
        let mut samples = vec![0.0; 100];
        samples[42] = 1.0;
        let envelope = extract(&samples, 1000).unwrap();
        assert!((envelope.bins()[0] - 0.1).abs() < 1e-6); // sqrt(1/100)
    }

    #[test]
    fn test_bins_are_non_negative_and_finite() {
        let samples = vec![0.3, -0.9, f32::NAN, 0.2, f32::INFINITY, -0.1, 0.0, 0.7];
        let envelope = extract(&samples, 20).unwrap(); // 2 samples per window
        assert_eq!(envelope.len(), 4);
        assert!(envelope.bins().iter().all(|b| b.is_finite() && *b >= 0.0));
    }

    #[test]
    fn test_durations() {
        let samples = vec![0.0; 44100 * 3 + 10];
        let envelope = extract(&samples, 44100).unwrap();
        assert!((envelope.window_seconds() - 0.1).abs() < 1e-12);
        assert!((envelope.total_duration_seconds() - (3.0 + 10.0 / 44100.0)).abs() < 1e-9);
        let expected =
            (envelope.total_duration_seconds() / envelope.window_seconds()).ceil() as usize;
        assert_eq!(envelope.len(), expected);
    }

    #[test]
    fn test_max_bin() {
        let envelope = Envelope::from_bins(vec![0.1, 0.7, 0.3], 0.1, 0.3);
        assert_eq!(envelope.max_bin(), 0.7);

        let empty = Envelope::from_bins(Vec::new(), 0.1, 0.0);
        assert_eq!(empty.max_bin(), 0.0);
    }
}
