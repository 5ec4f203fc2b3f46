//! Static legend: one sample cell per status code followed by its label.

#![allow(missing_docs)]

use crate::core::model::StatusCode;
use crate::render::encoder::{CROSS_OUT_COLOR, LEGEND_TEXT_COLOR, RowParity, cross_out_stroke, encode};
use crate::render::geometry::GeometryResolver;
use crate::render::grid::{RenderOutcome, ROW_HEIGHT_FACTOR};
use crate::render::surface::{Font, LinearGradient, Point, Rect, Surface};

/// Legend label font size at scale 1.0.
pub const LEGEND_FONT_PX: f64 = 14.0;

/// One legend slot: the sample code, its caption, and the logical advance
/// from the caption start to the next sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub code: StatusCode,
    pub label: &'static str,
    pub advance: f64,
}

pub const LEGEND_ENTRIES: [LegendEntry; 6] = [
    LegendEntry {
        code: StatusCode::Proposed,
        label: "proposer",
        advance: 65.0,
    },
    LegendEntry {
        code: StatusCode::Signed,
        label: "signed",
        advance: 50.0,
    },
    LegendEntry {
        code: StatusCode::PrecommitMiss,
        label: "miss/precommit",
        advance: 110.0,
    },
    LegendEntry {
        code: StatusCode::PrevoteMiss,
        label: "miss/prevote",
        advance: 90.0,
    },
    LegendEntry {
        code: StatusCode::Missed,
        label: "missed",
        advance: 59.0,
    },
    LegendEntry {
        code: StatusCode::NoData,
        label: "no data",
        advance: 0.0,
    },
];

/// Paints the legend onto the surface it owns. Holds no data state.
#[derive(Debug)]
pub struct LegendRenderer<S> {
    surface: S,
    resolver: GeometryResolver,
}

impl<S: Surface> LegendRenderer<S> {
    #[must_use]
    pub fn new(surface: S, resolver: GeometryResolver) -> Self {
        Self { surface, resolver }
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn render(&mut self) -> RenderOutcome {
        if !self.surface.is_available() {
            return RenderOutcome::Skipped;
        }
        let base = self.resolver.metrics();
        self.surface
            .set_logical_height(base.cell_height * ROW_HEIGHT_FACTOR);
        let g = self.resolver.resolve(&mut self.surface);
        let font = Font::sans(LEGEND_FONT_PX * g.scale);
        let baseline = g.cell_height / ROW_HEIGHT_FACTOR;

        let mut x = g.text_gutter;
        for entry in LEGEND_ENTRIES {
            let enc = encode(entry.code, RowParity::Even);
            let rect = Rect::new(x, 0.0, g.cell_width, g.cell_height);
            self.surface
                .fill_rect(rect, &LinearGradient::horizontal(rect, enc.stops));
            if enc.cross_out {
                let (from, to) = cross_out_stroke(rect, g.scale);
                self.surface.stroke_line(from, to, CROSS_OUT_COLOR);
            }
            x += g.cell_width * 1.5;
            self.surface.fill_text(
                entry.label,
                Point::new(x, baseline),
                None,
                font,
                LEGEND_TEXT_COLOR,
            );
            x += entry.advance * g.scale;
        }

        RenderOutcome::Painted {
            rows: 1,
            cells: LEGEND_ENTRIES.len(),
        }
    }
}
