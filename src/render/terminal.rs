//! Character-cell surface for terminal output.
//!
//! One terminal column spans one grid cell width and one terminal row spans
//! one cell height, so the grid maps onto the terminal one block per
//! character at any pixel ratio. Gradients collapse to their dominant color composited over a
//! dark backdrop; row separators become underlines and cross-outs a slash.

#![allow(missing_docs)]

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};

use crate::render::surface::{BackingSize, Font, LinearGradient, Point, Rect, Rgba, Size, Surface};

/// Logical pixels per terminal column.
pub const PX_PER_COL: f64 = 9.0;
/// Logical pixels per terminal row.
pub const PX_PER_ROW: f64 = 24.0;
/// Color translucent fills are composited over.
pub const BACKDROP: Rgba = Rgba::rgb(16, 16, 16);
const CROSS_GLYPH: char = '╱';
/// Absorbs rounding of the backing size at fractional ratios.
const SCALE_SLACK: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermCell {
    pub ch: char,
    pub fg: Option<Rgba>,
    pub bg: Option<Rgba>,
    pub underline: bool,
}

impl Default for TermCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            underline: false,
        }
    }
}

/// In-memory character grid implementing [`Surface`].
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    cols: u16,
    logical_height: f64,
    /// Backing pixels per logical pixel, inferred from the last resize.
    scale: f64,
    rows: Vec<Vec<TermCell>>,
}

impl TerminalSurface {
    #[must_use]
    pub fn new(cols: u16) -> Self {
        Self {
            cols,
            logical_height: PX_PER_ROW,
            scale: 1.0,
            rows: Vec::new(),
        }
    }

    /// Track a terminal resize. Takes effect at the next render.
    pub fn set_columns(&mut self, cols: u16) {
        self.cols = cols;
    }

    #[must_use]
    pub fn height_rows(&self) -> u16 {
        u16::try_from(self.rows.len()).unwrap_or(u16::MAX)
    }

    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> Option<&TermCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Row contents without styling, trailing blanks trimmed.
    #[must_use]
    pub fn plain_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let line: String = row.iter().map(|c| c.ch).collect();
                line.trim_end().to_string()
            })
            .collect()
    }

    /// Queue the surface at a fixed screen position.
    pub fn draw_at<W: Write>(&self, out: &mut W, col: u16, row: u16) -> io::Result<()> {
        for (idx, cells) in self.rows.iter().enumerate() {
            let y = row.saturating_add(u16::try_from(idx).unwrap_or(u16::MAX));
            queue!(out, MoveTo(col, y))?;
            queue_row(out, cells)?;
        }
        Ok(())
    }

    /// Write the surface as consecutive lines at the cursor.
    pub fn write_lines<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for cells in &self.rows {
            queue_row(out, cells)?;
            queue!(out, Print("\n"))?;
        }
        out.flush()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / self.col_px()).floor() as usize;
        let row = (y / self.row_px()).floor() as usize;
        (row < self.rows.len() && col < usize::from(self.cols)).then_some((col, row))
    }

    fn col_px(&self) -> f64 {
        PX_PER_COL * self.scale
    }

    fn row_px(&self) -> f64 {
        PX_PER_ROW * self.scale
    }

    /// First column at or after `col` that is blank and follows a blank, so
    /// text wider than its pixel advance does not run into earlier text.
    fn free_column(&self, col: usize, row: usize) -> usize {
        let occupied = |c: usize| self.cell(c, row).is_some_and(|cell| cell.ch != ' ');
        let mut start = col;
        while occupied(start) || (start > 0 && occupied(start - 1)) {
            start += 1;
        }
        start
    }

    fn cell_mut(&mut self, col: usize, row: usize) -> Option<&mut TermCell> {
        self.rows.get_mut(row).and_then(|r| r.get_mut(col))
    }
}

fn to_color(c: Rgba) -> Color {
    let solid = c.over(BACKDROP);
    Color::Rgb {
        r: solid.r,
        g: solid.g,
        b: solid.b,
    }
}

fn queue_row<W: Write>(out: &mut W, cells: &[TermCell]) -> io::Result<()> {
    for cell in cells {
        if let Some(bg) = cell.bg {
            queue!(out, SetBackgroundColor(to_color(bg)))?;
        }
        if let Some(fg) = cell.fg {
            queue!(out, SetForegroundColor(to_color(fg)))?;
        }
        if cell.underline {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        queue!(out, Print(cell.ch), SetAttribute(Attribute::Reset))?;
    }
    Ok(())
}

impl Surface for TerminalSurface {
    fn is_available(&self) -> bool {
        self.cols > 0
    }

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    fn logical_size(&self) -> Option<Size> {
        Some(Size::new(
            f64::from(self.cols) * PX_PER_COL,
            self.logical_height,
        ))
    }

    fn set_logical_height(&mut self, height: f64) {
        self.logical_height = height;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn set_backing_size(&mut self, size: BackingSize) {
        let logical_width = f64::from(self.cols) * PX_PER_COL;
        self.scale = if logical_width > 0.0 && size.width > 0 {
            f64::from(size.width) / logical_width
        } else {
            1.0
        };
        let rows = (f64::from(size.height) / self.row_px() - SCALE_SLACK).ceil() as usize;
        let cols = usize::from(self.cols);
        self.rows = vec![vec![TermCell::default(); cols]; rows];
    }

    fn fill_rect(&mut self, rect: Rect, fill: &LinearGradient) {
        let Some(color) = fill.dominant_color() else {
            return;
        };
        if let Some((col, row)) = self.locate(rect.x, rect.y)
            && let Some(cell) = self.cell_mut(col, row)
        {
            cell.bg = Some(color);
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba) {
        if (from.y - to.y).abs() < f64::EPSILON {
            let Some((start, row)) = self.locate(from.x, from.y) else {
                return;
            };
            let end = self
                .locate((to.x - self.col_px() / 2.0).max(from.x), to.y)
                .map_or(start, |(c, _)| c);
            for col in start..=end {
                if let Some(cell) = self.cell_mut(col, row) {
                    cell.underline = true;
                }
            }
        } else {
            let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
            if let Some((col, row)) = self.locate(mid.x, mid.y)
                && let Some(cell) = self.cell_mut(col, row)
                && cell.ch == ' '
            {
                cell.ch = CROSS_GLYPH;
                cell.fg = Some(color);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn fill_text(&mut self, text: &str, at: Point, max_width: Option<f64>, _font: Font, color: Rgba) {
        let Some((col, row)) = self.locate(at.x, at.y) else {
            return;
        };
        let limit = max_width.map_or(usize::MAX, |w| (w / self.col_px()).floor().max(0.0) as usize);
        let start = self.free_column(col, row);
        for (offset, ch) in text.chars().take(limit).enumerate() {
            if let Some(cell) = self.cell_mut(start + offset, row) {
                cell.ch = ch;
                cell.fg = Some(color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Entity, Snapshot, StatusCode};
    use crate::render::geometry::GeometryResolver;
    use crate::render::grid::GridRenderer;
    use crate::render::legend::LegendRenderer;

    #[test]
    fn grid_maps_one_cell_per_column() {
        let mut grid = GridRenderer::new(TerminalSurface::new(40), GeometryResolver::default());
        let snap = Snapshot::new(vec![Entity::new("osmosis", "osmosis-1", 5).with_blocks([
            StatusCode::Proposed,
            StatusCode::Signed,
            StatusCode::Missed,
        ])]);
        assert!(grid.render(&snap).is_painted());
        let surface = grid.surface();
        let lines = surface.plain_lines();
        assert!(lines[1].starts_with("osmosis"), "{lines:?}");
        // Gutter is 120px, i.e. 13 columns.
        assert!(surface.cell(13, 1).and_then(|c| c.bg).is_some());
        assert!(surface.cell(14, 1).is_some_and(|c| c.underline));
        assert_eq!(surface.cell(15, 1).map(|c| c.ch), Some(CROSS_GLYPH));
        assert!(surface.cell(16, 1).and_then(|c| c.bg).is_none());
    }

    #[test]
    fn long_labels_are_cut_at_text_max() {
        let mut grid = GridRenderer::new(TerminalSurface::new(40), GeometryResolver::default());
        let snap = Snapshot::new(vec![Entity::new("a-very-long-chain-name", "x", 1)]);
        grid.render(&snap);
        assert_eq!(grid.surface().plain_lines()[1], "a-very-long-");
    }

    #[test]
    fn legend_is_two_rows_tall() {
        let mut legend = LegendRenderer::new(TerminalSurface::new(80), GeometryResolver::default());
        legend.render();
        assert_eq!(legend.surface().height_rows(), 2);
        assert!(legend.surface().plain_lines()[0].contains("proposer"));
    }

    #[test]
    fn legend_labels_do_not_overlap() {
        let mut legend = LegendRenderer::new(TerminalSurface::new(80), GeometryResolver::default());
        legend.render();
        let line = &legend.surface().plain_lines()[0];
        for entry in crate::render::legend::LEGEND_ENTRIES {
            assert!(line.contains(entry.label), "{} missing from {line:?}", entry.label);
        }
    }

    #[test]
    fn pixel_ratio_does_not_move_cells() {
        let snap = Snapshot::new(vec![
            Entity::new("juno", "juno-1", 3).with_blocks([StatusCode::Signed; 6]),
        ]);
        let painted = |ratio: Option<f64>| {
            let resolver = GeometryResolver::default().with_ratio_override(ratio);
            let mut grid = GridRenderer::new(TerminalSurface::new(80), resolver);
            grid.render(&snap);
            let surface = grid.surface();
            let cols: Vec<usize> = (0..80)
                .filter(|&c| surface.cell(c, 1).and_then(|cell| cell.bg).is_some())
                .collect();
            (surface.height_rows(), surface.plain_lines(), cols)
        };
        let baseline = painted(None);
        assert_eq!(baseline.2, (13..19).collect::<Vec<_>>());
        assert_eq!(painted(Some(2.0)), baseline);
        assert_eq!(painted(Some(1.5)), baseline);
    }

    #[test]
    fn zero_width_terminal_is_unavailable() {
        assert!(!TerminalSurface::new(0).is_available());
    }

    #[test]
    fn write_lines_emits_one_line_per_row() {
        let mut grid = GridRenderer::new(TerminalSurface::new(20), GeometryResolver::default());
        grid.render(&Snapshot::new(vec![Entity::new("a", "a", 1)]));
        let mut out = Vec::new();
        grid.surface().write_lines(&mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.matches('\n').count(), usize::from(grid.surface().height_rows()));
    }
}
