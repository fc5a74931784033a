//! Playback capability consumed by the coordinator.

/// Per-track transport and gain control.
///
/// Times are in seconds. Implementations may not know their duration right
/// away; `duration()` returns `None` (or a non-finite value) until it does.
pub trait PlaybackHandle {
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> Option<f64>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
}

/// Duration if it is known and usable for ratio math
pub fn known_duration<H: PlaybackHandle + ?Sized>(handle: &H) -> Option<f64> {
    handle.duration().filter(|d| d.is_finite() && *d > 0.0)
}
