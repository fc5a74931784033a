//! Display-refresh scheduling for the playback loop.
//!
//! The coordinator asks for one frame at a time and receives a token for it.
//! Whoever drives the display (the terminal event loop here) delivers the
//! token back through `PlaybackCoordinator::on_frame` once the frame is due.
//! Cancelling revokes the token, and a revoked token that still arrives is
//! ignored by the coordinator, so pausing can never cause a late render.

use std::time::{Duration, Instant};

/// Identifies one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

pub trait FrameScheduler {
    /// Schedule a callback for the next refresh
    fn request_frame(&mut self) -> FrameToken;

    /// Revoke a previously requested frame if it has not fired yet
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Fixed-rate scheduler polled by an event loop.
///
/// Holds at most one pending frame, mirroring how a browser only ever runs a
/// single outstanding animation-frame callback per loop.
pub struct FrameClock {
    interval: Duration,
    next_token: u64,
    pending: Option<(FrameToken, Instant)>,
    last_fired: Option<Instant>,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_token: 0,
            pending: None,
            last_fired: None,
        }
    }

    pub fn with_rate(frames_per_second: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / frames_per_second.max(1) as f64))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending frame is due, if any
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|(_, due)| due.saturating_duration_since(now))
    }

    /// Hand out the pending token once its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<FrameToken> {
        match self.pending {
            Some((token, due)) if now >= due => {
                self.pending = None;
                self.last_fired = Some(now);
                Some(token)
            }
            _ => None,
        }
    }

    fn schedule_from(&mut self, now: Instant) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        // Continue the cadence of the previous frame, or fire right away
        let due = match self.last_fired {
            Some(last) if last + self.interval > now => last + self.interval,
            _ => now,
        };
        self.pending = Some((token, due));
        token
    }
}

impl FrameScheduler for FrameClock {
    fn request_frame(&mut self) -> FrameToken {
        self.schedule_from(Instant::now())
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if matches!(self.pending, Some((pending, _)) if pending == token) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rate() {
        let clock = FrameClock::with_rate(50);
        assert_eq!(clock.interval(), Duration::from_millis(20));

        // Zero is treated as one frame per second
        let clock = FrameClock::with_rate(0);
        assert_eq!(clock.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_first_frame_is_due_immediately() {
        let mut clock = FrameClock::new(Duration::from_millis(16));
        let now = Instant::now();
        let token = clock.schedule_from(now);

        assert_eq!(clock.take_due(now), Some(token));
        assert!(!clock.is_pending());
        assert_eq!(clock.take_due(now), None);
    }

    #[test]
    fn test_next_frame_waits_one_interval() {
        let mut clock = FrameClock::new(Duration::from_millis(16));
        let start = Instant::now();
        clock.schedule_from(start);
        clock.take_due(start);

        let token = clock.schedule_from(start);
        assert_eq!(clock.take_due(start + Duration::from_millis(5)), None);
        assert_eq!(
            clock.time_until_due(start + Duration::from_millis(5)),
            Some(Duration::from_millis(11))
        );
        assert_eq!(clock.take_due(start + Duration::from_millis(16)), Some(token));
    }

    #[test]
    fn test_cancel_revokes_pending_frame() {
        let mut clock = FrameClock::new(Duration::from_millis(16));
        let token = clock.request_frame();
        clock.cancel_frame(token);

        assert!(!clock.is_pending());
        assert_eq!(clock.take_due(Instant::now() + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_cancel_ignores_other_tokens() {
        let mut clock = FrameClock::new(Duration::from_millis(16));
        let old = clock.request_frame();
        let current = clock.request_frame();
        assert_ne!(old, current);

        clock.cancel_frame(old);
        assert!(clock.is_pending());
    }
}
