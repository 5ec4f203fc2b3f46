//! Signing-grid renderer: one row per entity, one cell per recent block.
//!
//! Every call repaints the whole surface. The backing height is fixed from the
//! row count first, then geometry is resolved against the resized surface.

#![allow(missing_docs)]

use crate::core::model::Snapshot;
use crate::render::encoder::{
    CROSS_OUT_COLOR, LABEL_COLOR, RowParity, SEPARATOR_COLOR, cross_out_stroke, encode,
};
use crate::render::geometry::{Geometry, GeometryResolver};
use crate::render::surface::{Font, LinearGradient, Point, Rect, Surface};

/// Vertical space per row as a multiple of the cell height.
pub const ROW_HEIGHT_FACTOR: f64 = 1.2;
/// Extra logical height below the last row.
pub const BOTTOM_MARGIN: f64 = 30.0;
/// Left edge of row labels.
pub const LABEL_X: f64 = 5.0;
/// Label baseline sits this far above the bottom of its row.
const LABEL_BASELINE_LIFT: f64 = 6.0;
/// Row label font size at scale 1.0.
pub const LABEL_FONT_PX: f64 = 16.0;

/// Result of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The surface had no drawing context; nothing was touched.
    Skipped,
    Painted { rows: usize, cells: usize },
}

impl RenderOutcome {
    #[must_use]
    pub const fn is_painted(self) -> bool {
        matches!(self, Self::Painted { .. })
    }
}

/// Logical surface height needed for `rows` rows.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grid_height(rows: usize, cell_height: f64) -> f64 {
    rows as f64 * cell_height * ROW_HEIGHT_FACTOR + BOTTOM_MARGIN
}

/// Cell rectangle for column `i` of row `j`. Row 0 starts one cell below the top.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cell_rect(geometry: &Geometry, i: usize, j: usize) -> Rect {
    Rect::new(
        (i as f64).mul_add(geometry.cell_width, geometry.text_gutter),
        (j as f64 + 1.0) * geometry.cell_height,
        geometry.cell_width,
        geometry.cell_height,
    )
}

/// Paints snapshots onto the surface it owns.
#[derive(Debug)]
pub struct GridRenderer<S> {
    surface: S,
    resolver: GeometryResolver,
    renders: u64,
}

impl<S: Surface> GridRenderer<S> {
    #[must_use]
    pub fn new(surface: S, resolver: GeometryResolver) -> Self {
        Self {
            surface,
            resolver,
            renders: 0,
        }
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub const fn geometry(&self) -> Geometry {
        self.resolver.current()
    }

    /// Number of passes that actually painted.
    #[must_use]
    pub const fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn render(&mut self, snapshot: &Snapshot) -> RenderOutcome {
        if !self.surface.is_available() {
            return RenderOutcome::Skipped;
        }
        let base = self.resolver.metrics();
        self.surface
            .set_logical_height(grid_height(snapshot.len(), base.cell_height));
        let g = self.resolver.resolve(&mut self.surface);
        let font = Font::sans(LABEL_FONT_PX * g.scale);

        let mut cells = 0;
        for (j, entity) in snapshot.entities.iter().enumerate() {
            let parity = RowParity::of(j);
            #[allow(clippy::cast_precision_loss)]
            let baseline = (j as f64 + 2.0).mul_add(g.cell_height, -LABEL_BASELINE_LIFT);
            self.surface.fill_text(
                &entity.name,
                Point::new(LABEL_X, baseline),
                Some(g.text_max),
                font,
                LABEL_COLOR,
            );

            for (i, code) in entity.blocks.iter().enumerate() {
                let enc = encode(*code, parity);
                let rect = cell_rect(&g, i, j);
                self.surface
                    .fill_rect(rect, &LinearGradient::horizontal(rect, enc.stops));

                let sep_y = rect.bottom() - 0.5;
                self.surface.stroke_line(
                    Point::new(rect.x, sep_y),
                    Point::new(rect.right(), sep_y),
                    SEPARATOR_COLOR,
                );

                if enc.cross_out {
                    let (from, to) = cross_out_stroke(rect, g.scale);
                    self.surface.stroke_line(from, to, CROSS_OUT_COLOR);
                }
                cells += 1;
            }
        }

        self.renders += 1;
        RenderOutcome::Painted {
            rows: snapshot.len(),
            cells,
        }
    }
}
