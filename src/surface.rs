//! Immediate-mode 2D drawing surfaces.
//!
//! The renderer only talks to the `DrawingSurface` trait, so the same drawing
//! code paints into a terminal lane at runtime and into a plain pixel buffer in
//! tests. `Raster` is the in-memory implementation used by both.

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA color, alpha in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Source-over composite of `self` onto an opaque `dst`
    pub fn over(self, dst: Rgba) -> Rgba {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |s: u8, d: u8| -> u8 { (s as f32 * a + d as f32 * (1.0 - a)).round() as u8 };
        Rgba {
            r: mix(self.r, dst.r),
            g: mix(self.g, dst.g),
            b: mix(self.b, dst.b),
            a: 1.0,
        }
    }
}

/// Drawing primitives the envelope renderer needs
pub trait DrawingSurface {
    /// Current size in pixels, queried on every render
    fn size(&self) -> (u32, u32);

    /// Reset every pixel to `color`
    fn clear(&mut self, color: Rgba);

    /// Fill an axis-aligned rectangle; partially transparent colors blend
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);

    /// Draw a one-pixel line between two points
    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba);
}

/// Fixed-size RGBA pixel buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::rgb(0, 0, 0); (width as usize) * (height as usize)],
        }
    }

    /// Change the pixel dimensions; contents are discarded when they differ
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            self.pixels
                .get(y as usize * self.width as usize + x as usize)
                .copied()
        } else {
            None
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        if let Some(px) = self.pixels.get_mut(idx) {
            *px = color.over(*px);
        }
    }

    /// Pixel indices in [0, limit) touched by the span [start, start + len).
    ///
    /// Partially covered pixels count, so spans narrower than a pixel still
    /// land somewhere.
    fn span(start: f32, len: f32, limit: u32) -> (u32, u32) {
        if len <= 0.0 {
            return (0, 0);
        }
        let lo = start.max(0.0).floor();
        let hi = (start + len).min(limit as f32).ceil();
        if hi <= lo {
            return (0, 0);
        }
        (lo as u32, hi as u32)
    }
}

impl DrawingSurface for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        let opaque = Rgba { a: 1.0, ..color };
        self.pixels.fill(opaque);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return;
        }
        let (x0, x1) = Self::span(x, width, self.width);
        let (y0, y1) = Self::span(y, height, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        if self.width == 0 || self.height == 0 {
            return;
        }

        // Points on the far edge land on the last pixel row/column
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let (ax, ay) = (x0.clamp(0.0, max_x), y0.clamp(0.0, max_y));
        let (bx, by) = (x1.clamp(0.0, max_x), y1.clamp(0.0, max_y));

        let steps = (bx - ax).abs().max((by - ay).abs()).ceil() as u32;
        if steps == 0 {
            self.blend(ax as u32, ay as u32, color);
            return;
        }
        let mut last = None;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let px = (ax + (bx - ax) * t) as u32;
            let py = (ay + (by - ay) * t) as u32;
            // Blend each pixel once so translucent strokes don't darken
            if last != Some((px, py)) {
                self.blend(px, py, color);
                last = Some((px, py));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    const RED: Rgba = Rgba::rgb(255, 0, 0);

    #[test]
    fn test_over_opaque_replaces() {
        assert_eq!(RED.over(WHITE), RED);
    }

    #[test]
    fn test_over_translucent_blends() {
        let half_black = Rgba::rgba(0, 0, 0, 0.5);
        let out = half_black.over(WHITE);
        assert_eq!((out.r, out.g, out.b), (128, 128, 128));
        assert_eq!(out.a, 1.0);
    }

    #[test]
    fn test_clear() {
        let mut raster = Raster::new(3, 2);
        raster.clear(WHITE);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(raster.pixel(x, y), Some(WHITE));
            }
        }
        assert_eq!(raster.pixel(3, 0), None);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut raster = Raster::new(4, 4);
        raster.clear(BLACK);
        raster.fill_rect(2.0, -5.0, 100.0, 7.0, RED);

        assert_eq!(raster.pixel(1, 0), Some(BLACK));
        assert_eq!(raster.pixel(2, 0), Some(RED));
        assert_eq!(raster.pixel(3, 1), Some(RED));
        assert_eq!(raster.pixel(3, 2), Some(BLACK));
    }

    #[test]
    fn test_fill_rect_covers_partial_pixels() {
        let mut raster = Raster::new(4, 4);
        raster.clear(BLACK);
        raster.fill_rect(1.25, 3.5, 0.1, 0.25, RED);

        assert_eq!(raster.pixel(1, 3), Some(RED));
        assert_eq!(raster.pixel(0, 3), Some(BLACK));
        assert_eq!(raster.pixel(2, 3), Some(BLACK));
        assert_eq!(raster.pixel(1, 2), Some(BLACK));
    }

    #[test]
    fn test_fill_rect_zero_size_draws_nothing() {
        let mut raster = Raster::new(4, 4);
        raster.clear(BLACK);
        let before = raster.clone();
        raster.fill_rect(1.0, 1.0, 0.0, 3.0, RED);
        raster.fill_rect(1.0, 1.0, 2.0, 0.0, RED);
        assert_eq!(raster, before);
    }

    #[test]
    fn test_vertical_line_on_right_edge_stays_inside() {
        let mut raster = Raster::new(5, 3);
        raster.clear(BLACK);
        raster.stroke_line(5.0, 0.0, 5.0, 3.0, RED);
        for y in 0..3 {
            assert_eq!(raster.pixel(4, y), Some(RED));
            assert_eq!(raster.pixel(3, y), Some(BLACK));
        }
    }

    #[test]
    fn test_resize_discards_content() {
        let mut raster = Raster::new(2, 2);
        raster.clear(WHITE);
        raster.resize(2, 2);
        assert_eq!(raster.pixel(0, 0), Some(WHITE));

        raster.resize(3, 1);
        assert_eq!(raster.size(), (3, 1));
        assert_eq!(raster.pixel(0, 0), Some(BLACK));
    }
}
