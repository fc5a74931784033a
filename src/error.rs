//! Error types for track loading and track-addressed operations.

use crate::registry::TrackId;
use thiserror::Error;

/// Errors that can occur while loading or addressing a track
#[derive(Error, Debug)]
pub enum TrackError {
    /// File bytes could not be decoded into samples
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Extractor was handed empty or otherwise unusable input
    #[error("Invalid audio data: {0}")]
    InvalidAudioData(String),

    /// The track was removed before the operation reached it
    #[error("Track {0} is no longer loaded")]
    StaleReference(TrackId),

    /// Reading the source file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for track operations
pub type TrackResult<T> = Result<T, TrackError>;
