//! Synchronized playback and the per-frame render loop.
//!
//! The coordinator owns the track registry and a frame scheduler. While it is
//! `Running` it holds the token of the one outstanding frame; every delivered
//! frame re-renders each lane at its track's current position and requests
//! the next one. Pausing cancels the outstanding token and returns to `Idle`,
//! after which no lane is touched until playback starts again.

use crate::envelope::Envelope;
use crate::error::{TrackError, TrackResult};
use crate::frame::{FrameScheduler, FrameToken};
use crate::playback::{PlaybackHandle, known_duration};
use crate::registry::{Track, TrackId, TrackRegistry};
use crate::render::{Palette, clamp_ratio};
use crate::surface::DrawingSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running(FrameToken),
}

/// Fraction of a track that has been played.
///
/// Uses the handle's duration when it is known, otherwise the duration the
/// envelope was decoded with. A position past the end, a non-finite position
/// or an unusable duration all yield 0.
pub fn playback_ratio(current_time: f64, handle_duration: Option<f64>, fallback: f64) -> f64 {
    let duration = handle_duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(fallback);
    if !(duration.is_finite() && duration > 0.0) || !current_time.is_finite() {
        return 0.0;
    }
    if current_time > duration {
        return 0.0;
    }
    clamp_ratio(current_time / duration)
}

/// Convert a horizontal click offset into a ratio of `width`
pub fn click_ratio(offset_x: f64, width: f64) -> f64 {
    if width > 0.0 {
        clamp_ratio(offset_x / width)
    } else {
        0.0
    }
}

pub struct PlaybackCoordinator<H, S, F> {
    registry: TrackRegistry<H, S>,
    scheduler: F,
    state: LoopState,
    palette: Palette,
}

impl<H, S, F> PlaybackCoordinator<H, S, F>
where
    H: PlaybackHandle,
    S: DrawingSurface,
    F: FrameScheduler,
{
    pub fn new(scheduler: F, palette: Palette) -> Self {
        Self {
            registry: TrackRegistry::new(),
            scheduler,
            state: LoopState::Idle,
            palette,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running(_))
    }

    pub fn registry(&self) -> &TrackRegistry<H, S> {
        &self.registry
    }

    pub fn tracks(&self) -> &[Track<H, S>] {
        self.registry.list()
    }

    /// Mutable access to tracks, e.g. for resizing their surfaces
    pub fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track<H, S>> {
        self.registry.iter_mut()
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Register a fully loaded track and paint its lane once at position 0.
    pub fn add_track(&mut self, name: String, handle: H, surface: S, envelope: Envelope) -> TrackId {
        let id = self.registry.add(name, handle, surface, envelope);
        let palette = self.palette;
        if let Some(track) = self.registry.get_mut(id) {
            track.render(0.0, &palette);
        }
        id
    }

    /// Remove a track; its playback is paused as part of removal.
    pub fn remove_track(&mut self, id: TrackId) -> TrackResult<Track<H, S>> {
        self.registry
            .remove(id)
            .ok_or(TrackError::StaleReference(id))
    }

    pub fn rename_track(&mut self, id: TrackId, name: String) -> TrackResult<()> {
        let track = self
            .registry
            .get_mut(id)
            .ok_or(TrackError::StaleReference(id))?;
        track.name = name;
        Ok(())
    }

    /// Start every track and, if idle, the render loop.
    pub fn play_all(&mut self) {
        for track in self.registry.iter_mut() {
            track.handle.play();
        }
        if self.state == LoopState::Idle {
            let token = self.scheduler.request_frame();
            self.state = LoopState::Running(token);
            log::debug!("Frame loop started");
        }
    }

    /// Pause every track and cancel the outstanding frame.
    pub fn pause_all(&mut self) {
        for track in self.registry.iter_mut() {
            track.handle.pause();
        }
        if let LoopState::Running(token) = self.state {
            self.scheduler.cancel_frame(token);
            self.state = LoopState::Idle;
            log::debug!("Frame loop stopped");
        }
    }

    /// Handle one display refresh.
    ///
    /// Renders every lane and requests the next frame. Returns `false` without
    /// touching anything when `token` is not the outstanding frame.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        if self.state != LoopState::Running(token) {
            return false;
        }
        self.render_all();
        let next = self.scheduler.request_frame();
        self.state = LoopState::Running(next);
        true
    }

    /// Repaint every lane once at its current position, outside the loop.
    ///
    /// Used after layout changes so lanes match their new size while idle.
    pub fn refresh(&mut self) {
        self.render_all();
    }

    fn render_all(&mut self) {
        let palette = self.palette;
        for track in self.registry.iter_mut() {
            let ratio = track.playback_ratio();
            track.render(ratio, &palette);
        }
    }

    /// Move every track to `ratio` of its own duration.
    ///
    /// Tracks whose duration is not known yet are left where they are.
    pub fn seek(&mut self, ratio: f64) {
        let ratio = clamp_ratio(ratio);
        for track in self.registry.iter_mut() {
            match known_duration(&track.handle) {
                Some(duration) => track.handle.set_current_time(ratio * duration),
                None => log::debug!("Skipping seek for {}: duration unknown", track.id()),
            }
        }
        log::debug!("Seek all tracks to {:.1}%", ratio * 100.0);
    }

    /// Seek all tracks from a click at `offset_x` pixels into a lane.
    pub fn seek_from_click(&mut self, id: TrackId, offset_x: f64) -> TrackResult<()> {
        let width = self
            .registry
            .get(id)
            .map(|t| t.surface.size().0)
            .ok_or(TrackError::StaleReference(id))?;
        self.seek(click_ratio(offset_x, width as f64));
        Ok(())
    }

    /// Set one track's gain; other tracks are unaffected.
    pub fn set_volume(&mut self, id: TrackId, volume: f32) -> TrackResult<()> {
        let track = self
            .registry
            .get_mut(id)
            .ok_or(TrackError::StaleReference(id))?;
        track.set_volume(volume);
        Ok(())
    }

    /// Nudge one track's gain by `delta`, clamped to [0, 1].
    pub fn adjust_volume(&mut self, id: TrackId, delta: f32) -> TrackResult<f32> {
        let track = self
            .registry
            .get_mut(id)
            .ok_or(TrackError::StaleReference(id))?;
        track.set_volume(track.volume() + delta);
        Ok(track.volume())
    }
}
