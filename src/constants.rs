//! Project-wide constants used across multiple modules.

/// Directory name under the user's config dir
pub const APP_DIR_NAME: &str = "tracklane";

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Directories to skip while browsing for tracks
pub const SKIP_DIRECTORIES: &[&str] = &["node_modules", ".git", "target"];

/// Audio file extensions offered by the track picker
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg"];

/// Bar characters used by `tracklane envelope` output
pub const ENVELOPE_BAR_CHARS: &[char] = &[' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
