//! tracklane: several audio tracks played in lock-step, each drawn as an
//! amplitude envelope lane with a moving playhead.
//!
//! The library holds everything that does not need a terminal or a sound
//! card: envelope extraction, lane rendering onto a pixel surface, the track
//! registry and the playback coordinator that ties them to a frame clock.
//! The `player` feature adds the file decoders used by the binary.

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod loader;
pub mod playback;
pub mod registry;
pub mod render;
pub mod surface;
pub mod utils;

#[cfg(feature = "player")]
pub mod media;

pub use coordinator::PlaybackCoordinator;
pub use envelope::Envelope;
pub use error::{TrackError, TrackResult};
pub use registry::{TrackId, TrackRegistry};
