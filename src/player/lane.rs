//! Terminal drawing surface for one track lane.
//!
//! A lane is a pixel raster two pixels tall per terminal row. The renderer
//! paints into the raster; `LaneView` then blits it into a ratatui buffer
//! using the upper half block glyph, with the foreground taking the top pixel
//! and the background the bottom one.

use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};
use tracklane::surface::{DrawingSurface, Raster, Rgba};

const HALF_BLOCK: &str = "▀";

#[derive(Debug, Clone)]
pub struct LaneSurface {
    raster: Raster,
}

impl LaneSurface {
    /// Surface covering `cols` x `rows` terminal cells
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            raster: Raster::new(cols as u32, rows as u32 * 2),
        }
    }

    /// Match the surface to a new cell area.
    ///
    /// Returns `true` when the size changed; the content is then blank until
    /// the next render.
    pub fn fit(&mut self, cols: u16, rows: u16) -> bool {
        let size = (cols as u32, rows as u32 * 2);
        if self.raster.size() == size {
            return false;
        }
        self.raster.resize(size.0, size.1);
        true
    }

    pub fn view(&self) -> LaneView<'_> {
        LaneView { lane: self }
    }
}

impl DrawingSurface for LaneSurface {
    fn size(&self) -> (u32, u32) {
        self.raster.size()
    }

    fn clear(&mut self, color: Rgba) {
        self.raster.clear(color);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.raster.fill_rect(x, y, width, height, color);
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        self.raster.stroke_line(x0, y0, x1, y1, color);
    }
}

fn to_color(px: Rgba) -> Color {
    Color::Rgb(px.r, px.g, px.b)
}

pub struct LaneView<'a> {
    lane: &'a LaneSurface,
}

impl Widget for LaneView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let raster = &self.lane.raster;
        let cols = area.width.min(raster.width() as u16);
        let rows = area.height.min((raster.height() / 2) as u16);

        for row in 0..rows {
            for col in 0..cols {
                let (Some(top), Some(bottom)) = (
                    raster.pixel(col as u32, row as u32 * 2),
                    raster.pixel(col as u32, row as u32 * 2 + 1),
                ) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(HALF_BLOCK)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }
    }
}
