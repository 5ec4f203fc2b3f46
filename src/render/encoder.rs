//! Status-code → cell fill encoding.
//!
//! Total over [`StatusCode`]: every code, including `NoData`, maps to a
//! non-empty gradient. Misses additionally request a cross-out stroke so the
//! outcome does not rely on color alone.

#![allow(missing_docs)]

use crate::core::model::StatusCode;
use crate::render::surface::{GradientStop, Point, Rect, Rgba};

/// Even/odd row index; only the signed encoding depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowParity {
    Even,
    Odd,
}

impl RowParity {
    #[must_use]
    pub const fn of(row: usize) -> Self {
        if row % 2 == 0 { Self::Even } else { Self::Odd }
    }
}

/// Fill and decoration for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEncoding {
    pub stops: &'static [GradientStop],
    pub cross_out: bool,
}

// ──────────────────── palette ────────────────────

pub const SEPARATOR_COLOR: Rgba = Rgba::rgb(51, 51, 51);
pub const CROSS_OUT_COLOR: Rgba = Rgba::rgb(255, 255, 255);
pub const LABEL_COLOR: Rgba = Rgba::rgb(255, 255, 255);
pub const LEGEND_TEXT_COLOR: Rgba = Rgba::rgb(128, 128, 128);

/// Opacity of the signed band on even rows.
pub const SIGNED_EVEN_ALPHA: f32 = 0.4;
/// Opacity of the signed band on odd rows.
pub const SIGNED_ODD_ALPHA: f32 = 0.1;

static PROPOSED: [GradientStop; 3] = [
    GradientStop::new(0.0, Rgba::rgb(123, 255, 66)),
    GradientStop::new(0.3, Rgba::rgb(240, 255, 128)),
    GradientStop::new(0.8, Rgba::rgb(169, 250, 149)),
];

static SIGNED_EVEN: [GradientStop; 3] = [
    GradientStop::new(0.0, Rgba::rgba(0, 0, 0, SIGNED_EVEN_ALPHA)),
    GradientStop::new(0.9, Rgba::rgba(0, 0, 0, SIGNED_EVEN_ALPHA)),
    GradientStop::new(1.0, Rgba::rgb(186, 186, 186)),
];

static SIGNED_ODD: [GradientStop; 3] = [
    GradientStop::new(0.0, Rgba::rgba(0, 0, 0, SIGNED_ODD_ALPHA)),
    GradientStop::new(0.9, Rgba::rgba(0, 0, 0, SIGNED_ODD_ALPHA)),
    GradientStop::new(1.0, Rgba::rgb(186, 186, 186)),
];

static PRECOMMIT_MISS: [GradientStop; 3] = [
    GradientStop::new(0.0, Rgba::rgb(0x85, 0xc0, 0xf9)),
    GradientStop::new(0.8, Rgba::rgb(0x85, 0xc0, 0xf9)),
    GradientStop::new(1.0, Rgba::rgb(0x0b, 0x26, 0x41)),
];

static PREVOTE_MISS: [GradientStop; 3] = [
    GradientStop::new(0.0, Rgba::rgb(0x38, 0x1a, 0x34)),
    GradientStop::new(0.2, Rgba::rgb(0xd0, 0x6e, 0xc7)),
    GradientStop::new(1.0, Rgba::rgb(0xd0, 0x6e, 0xc7)),
];

static MISSED: [GradientStop; 1] = [GradientStop::new(0.0, Rgba::rgb(0xc1, 0x56, 0x00))];

static NO_DATA: [GradientStop; 1] = [GradientStop::new(0.0, Rgba::rgba(127, 127, 127, 0.3))];

// ──────────────────── encoder ────────────────────

/// Encode one block outcome for a row of the given parity.
#[must_use]
pub fn encode(code: StatusCode, parity: RowParity) -> CellEncoding {
    match code {
        StatusCode::Proposed => flat(&PROPOSED),
        StatusCode::Signed => match parity {
            RowParity::Even => flat(&SIGNED_EVEN),
            RowParity::Odd => flat(&SIGNED_ODD),
        },
        StatusCode::PrecommitMiss => flat(&PRECOMMIT_MISS),
        StatusCode::PrevoteMiss => flat(&PREVOTE_MISS),
        StatusCode::Missed => CellEncoding {
            stops: &MISSED,
            cross_out: true,
        },
        StatusCode::NoData => flat(&NO_DATA),
    }
}

/// Encode a raw server code; unmapped values render as no-data.
#[must_use]
pub fn encode_raw(raw: i64, parity: RowParity) -> CellEncoding {
    encode(StatusCode::from_raw(raw), parity)
}

const fn flat(stops: &'static [GradientStop]) -> CellEncoding {
    CellEncoding {
        stops,
        cross_out: false,
    }
}

/// Endpoints of the cross-out stroke for a cell: a short rising diagonal
/// across the middle half of the cell.
#[must_use]
pub fn cross_out_stroke(cell: Rect, scale: f64) -> (Point, Point) {
    let mid = cell.y + cell.height / 2.0;
    let inset = cell.width / 4.0;
    (
        Point::new(cell.x + 1.0 + inset, mid + scale),
        Point::new(cell.right() - inset - 1.0, mid - scale),
    )
}
