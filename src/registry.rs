//! Ordered collection of loaded tracks.
//!
//! Each track is a single record carrying its playback handle, drawing
//! surface and envelope together, so removing a track can never leave a
//! surface or envelope behind at a shifted index. Ids come from a counter that
//! only moves forward and are never handed out twice.

use crate::coordinator::playback_ratio;
use crate::envelope::Envelope;
use crate::playback::PlaybackHandle;
use crate::render::{Palette, render};
use crate::surface::DrawingSurface;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a track for as long as the registry lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(u64);

impl TrackId {
    /// Rebuild an id from its raw value, e.g. one read back from a log
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Track<H, S> {
    id: TrackId,
    pub name: String,
    pub handle: H,
    pub surface: S,
    envelope: Envelope,
    volume: f32,
}

impl<H: PlaybackHandle, S> Track<H, S> {
    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the track gain, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume = volume;
        self.handle.set_volume(volume);
    }

    /// Played fraction from the handle position, see `playback_ratio`
    pub fn playback_ratio(&self) -> f64 {
        playback_ratio(
            self.handle.current_time(),
            self.handle.duration(),
            self.envelope.total_duration_seconds(),
        )
    }
}

impl<H: PlaybackHandle, S: DrawingSurface> Track<H, S> {
    /// Repaint this track's lane with the playhead at `ratio`
    pub fn render(&mut self, ratio: f64, palette: &Palette) {
        render(&mut self.surface, &self.envelope, ratio, palette);
    }
}

pub struct TrackRegistry<H, S> {
    tracks: Vec<Track<H, S>>,
    next_id: u64,
}

impl<H: PlaybackHandle, S> Default for TrackRegistry<H, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: PlaybackHandle, S> TrackRegistry<H, S> {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a track and return its new id.
    ///
    /// The handle's current volume becomes the track volume.
    pub fn add(&mut self, name: String, handle: H, surface: S, envelope: Envelope) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;

        let mut track = Track {
            id,
            name,
            volume: 1.0,
            handle,
            surface,
            envelope,
        };
        let volume = track.handle.volume();
        track.set_volume(volume);

        log::info!(
            "Added track {} '{}' ({} bins, {:.2}s)",
            id,
            track.name,
            track.envelope.len(),
            track.envelope.total_duration_seconds()
        );
        self.tracks.push(track);
        id
    }

    /// Remove a track, pausing its playback first.
    ///
    /// Returns `None` if the id is not (or no longer) present.
    pub fn remove(&mut self, id: TrackId) -> Option<Track<H, S>> {
        let idx = self.position(id)?;
        let mut track = self.tracks.remove(idx);
        track.handle.pause();
        log::info!("Removed track {} '{}'", id, track.name);
        Some(track)
    }

    pub fn get(&self, id: TrackId) -> Option<&Track<H, S>> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track<H, S>> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Tracks in insertion order
    pub fn list(&self) -> &[Track<H, S>] {
        &self.tracks
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track<H, S>> {
        self.tracks.iter_mut()
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Handle {
        playing: bool,
        volume: f32,
    }

    impl PlaybackHandle for Handle {
        fn play(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
        }
        fn current_time(&self) -> f64 {
            0.0
        }
        fn set_current_time(&mut self, _seconds: f64) {}
        fn duration(&self) -> Option<f64> {
            None
        }
        fn volume(&self) -> f32 {
            self.volume
        }
        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }
    }

    fn envelope(bins: usize) -> Envelope {
        Envelope::from_bins(vec![0.5; bins], 0.1, bins as f64 * 0.1)
    }

    fn add(registry: &mut TrackRegistry<Handle, usize>, bins: usize) -> TrackId {
        let handle = Handle {
            volume: 1.0,
            ..Default::default()
        };
        registry.add(format!("t{bins}"), handle, bins, envelope(bins))
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut registry = TrackRegistry::new();
        let a = add(&mut registry, 1);
        let b = add(&mut registry, 2);
        let c = add(&mut registry, 3);

        assert_eq!(registry.ids(), vec![a, b, c]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(b).unwrap().name, "t2");
    }

    #[test]
    fn test_remove_keeps_records_together() {
        let mut registry = TrackRegistry::new();
        let ids: Vec<_> = (1..=5).map(|n| add(&mut registry, n)).collect();

        registry.remove(ids[1]);
        registry.remove(ids[3]);

        // Every surviving record still has its own surface and envelope
        for track in registry.list() {
            assert_eq!(track.surface, track.envelope().len());
            assert_eq!(track.name, format!("t{}", track.surface));
        }
        assert_eq!(registry.ids(), vec![ids[0], ids[2], ids[4]]);
    }

    #[test]
    fn test_remove_pauses_playback() {
        let mut registry = TrackRegistry::new();
        let id = add(&mut registry, 4);
        registry.get_mut(id).unwrap().handle.play();

        let removed = registry.remove(id).unwrap();
        assert!(!removed.handle.playing);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn test_remove_unknown_id_is_none() {
        let mut registry = TrackRegistry::new();
        let id = add(&mut registry, 1);
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut registry = TrackRegistry::new();
        let a = add(&mut registry, 1);
        registry.remove(a);
        let b = add(&mut registry, 1);
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_set_volume_clamps() {
        let mut registry = TrackRegistry::new();
        let id = add(&mut registry, 1);
        let track = registry.get_mut(id).unwrap();

        track.set_volume(1.8);
        assert_eq!(track.volume(), 1.0);
        assert_eq!(track.handle.volume, 1.0);

        track.set_volume(-0.2);
        assert_eq!(track.volume(), 0.0);

        track.set_volume(f32::NAN);
        assert_eq!(track.volume(), 0.0);

        track.set_volume(0.3);
        assert_eq!(track.handle.volume, 0.3);
    }

    #[test]
    fn test_track_id_display() {
        let mut registry = TrackRegistry::new();
        let id = add(&mut registry, 1);
        assert_eq!(id.to_string(), "#1");
        assert_eq!(id.as_u64(), 1);
    }
}
