//! Background track loading.
//!
//! Reading, decoding and envelope extraction for a file run on the rayon
//! thread pool so the UI loop keeps drawing while tracks load. Several files
//! can be in flight at once; finished loads are queued on a channel and picked
//! up by the UI with `poll`. A track only reaches the registry once its load
//! has fully succeeded.

use crate::decode::{Decode, DecodedAudio};
use crate::envelope::{self, Envelope};
use crate::error::{TrackError, TrackResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

/// A decoded track with its finished envelope
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    pub name: String,
    pub audio: DecodedAudio,
    pub envelope: Envelope,
}

/// Result of one load request
#[derive(Debug)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub result: TrackResult<LoadedAudio>,
}

/// Decode `bytes` and extract the envelope of the first channel
pub fn load_bytes<D: Decode + ?Sized>(
    decoder: &D,
    name: String,
    bytes: &[u8],
) -> TrackResult<LoadedAudio> {
    if bytes.is_empty() {
        return Err(TrackError::InvalidAudioData("file is empty".to_string()));
    }
    let audio = decoder.decode(bytes)?;
    let envelope = envelope::extract(&audio.first_channel(), audio.sample_rate)?;
    Ok(LoadedAudio {
        name,
        audio,
        envelope,
    })
}

/// Read and load a file from disk
pub fn load_file<D: Decode + ?Sized>(decoder: &D, path: &Path) -> TrackResult<LoadedAudio> {
    let bytes = fs::read(path)?;
    load_bytes(decoder, display_name(path), &bytes)
}

/// Default display name for a track loaded from `path`
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub struct EnvelopeLoader<D> {
    decoder: Arc<D>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    pending: usize,
}

impl<D: Decode + Send + Sync + 'static> EnvelopeLoader<D> {
    pub fn new(decoder: D) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            decoder: Arc::new(decoder),
            tx,
            rx,
            pending: 0,
        }
    }

    /// Queue a file for loading
    pub fn request(&mut self, path: PathBuf) {
        log::info!("Loading {}", path.display());
        self.pending += 1;

        let decoder = Arc::clone(&self.decoder);
        let tx = self.tx.clone();
        rayon::spawn(move || {
            let result = load_file(decoder.as_ref(), &path);
            if let Err(e) = &result {
                log::warn!("Failed to load {}: {e}", path.display());
            }
            // Receiver gone means the app is shutting down
            let _ = tx.send(LoadOutcome { path, result });
        });
    }

    /// Number of requests that have not been picked up yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Collect every load that has finished since the last call
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        let outcomes: Vec<LoadOutcome> = self.rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(outcomes.len());
        outcomes
    }
}
