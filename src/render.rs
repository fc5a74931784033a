//! Envelope lane renderer.
//!
//! Paints an envelope as a bottom-anchored bar chart, shades the already
//! played region and draws the playhead. Every call starts from a cleared
//! surface and reads the surface size fresh, so it can run once per frame
//! without accumulating artifacts and follows lane resizes automatically.

use crate::envelope::Envelope;
use crate::surface::{DrawingSurface, Rgba};
use serde::{Deserialize, Serialize};

/// Colors used to paint one lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgba,
    pub bar: Rgba,
    pub played_overlay: Rgba,
    pub playhead: Rgba,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        background: Rgba::rgb(255, 255, 255),
        bar: Rgba::rgb(13, 110, 253),
        played_overlay: Rgba::rgba(0, 0, 0, 0.1),
        playhead: Rgba::rgb(255, 0, 0),
    };

    pub const DARK: Palette = Palette {
        background: Rgba::rgb(33, 37, 41),
        bar: Rgba::rgb(61, 139, 253),
        played_overlay: Rgba::rgba(255, 255, 255, 0.12),
        playhead: Rgba::rgb(255, 64, 64),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::LIGHT
    }
}

/// Clamp a playback ratio into [0, 1]; NaN becomes 0
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

/// Draw `envelope` with the playhead at `playback_ratio` of the surface width.
pub fn render<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    envelope: &Envelope,
    playback_ratio: f64,
    palette: &Palette,
) {
    let (width, height) = surface.size();
    surface.clear(palette.background);
    if width == 0 || height == 0 {
        return;
    }

    let width = width as f32;
    let height = height as f32;
    let bins = envelope.bins();

    // All-silent envelopes have no meaningful scale; leave the bars flat
    let max = envelope.max_bin();
    if !bins.is_empty() && max > 0.0 {
        let bar_width = width / bins.len() as f32;
        for (idx, &value) in bins.iter().enumerate() {
            let bar_height = (value / max) * height;
            surface.fill_rect(
                idx as f32 * bar_width,
                height - bar_height,
                bar_width,
                bar_height,
                palette.bar,
            );
        }
    }

    let playhead_x = clamp_ratio(playback_ratio) as f32 * width;
    surface.fill_rect(0.0, 0.0, playhead_x, height, palette.played_overlay);
    surface.stroke_line(playhead_x, 0.0, playhead_x, height, palette.playhead);
}
