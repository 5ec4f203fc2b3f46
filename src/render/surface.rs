//! Render-surface seam: colors, gradients, geometry primitives, the
//! [`Surface`] trait, and a display-list [`RecordingSurface`].
//!
//! A surface is anything with a logical size, a device pixel ratio, a
//! resizable backing store, and a small canvas-like drawing vocabulary.
//! Coordinates passed to the drawing methods are backing-store pixels.

#![allow(missing_docs)]

use std::fmt;

// ──────────────────── color ────────────────────

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `0.0..=1.0`.
    pub a: f32,
}

impl Rgba {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Composite over an opaque backdrop.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::suboptimal_flops
    )]
    pub fn over(self, backdrop: Self) -> Self {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| -> u8 {
            (f32::from(fg) * a + f32::from(bg) * (1.0 - a))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::rgb(
            mix(self.r, backdrop.r),
            mix(self.g, backdrop.g),
            mix(self.b, backdrop.b),
        )
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if (self.a - 1.0).abs() < f32::EPSILON {
            write!(f, "rgb({},{},{})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

/// One color stop of a linear gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient axis, `0.0..=1.0`.
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    #[must_use]
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

// ──────────────────── geometry ────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Left-to-right linear gradient fill spanning `from.x..to.x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub from: Point,
    pub to: Point,
    pub stops: Vec<GradientStop>,
}

impl LinearGradient {
    #[must_use]
    pub fn horizontal(rect: Rect, stops: &[GradientStop]) -> Self {
        Self {
            from: Point::new(rect.x, rect.y),
            to: Point::new(rect.right(), rect.y),
            stops: stops.to_vec(),
        }
    }

    /// Color of the stop covering the largest share of the axis.
    ///
    /// Single-color backends (terminals) use this in place of the gradient.
    #[must_use]
    pub fn dominant_color(&self) -> Option<Rgba> {
        let mut best: Option<(f32, Rgba)> = None;
        for (idx, stop) in self.stops.iter().enumerate() {
            let next = self.stops.get(idx + 1).map_or(1.0, |s| s.offset);
            let span = (next - stop.offset).max(0.0);
            if best.is_none_or(|(b, _)| span > b) {
                best = Some((span, stop.color));
            }
        }
        best.map(|(_, c)| c)
    }
}

/// Font request for text drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    /// Size in backing-store pixels.
    pub size_px: f64,
    pub family: &'static str,
}

impl Font {
    #[must_use]
    pub const fn sans(size_px: f64) -> Self {
        Self {
            size_px,
            family: "sans-serif",
        }
    }
}

/// Backing-store dimensions in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackingSize {
    pub width: u32,
    pub height: u32,
}

// ──────────────────── surface ────────────────────

/// Drawing target owned by one renderer.
///
/// Setting the backing size clears the surface, as a canvas does.
pub trait Surface {
    /// Whether a drawing context is available. Renders are skipped otherwise.
    fn is_available(&self) -> bool;

    /// Current device pixel ratio of the environment the surface is shown in.
    fn device_pixel_ratio(&self) -> f64;

    /// Rendered (CSS-like) size, if the surface can report one.
    fn logical_size(&self) -> Option<Size>;

    /// Request a new rendered height in logical units.
    fn set_logical_height(&mut self, height: f64);

    /// Resize (and clear) the backing store.
    fn set_backing_size(&mut self, size: BackingSize);

    fn fill_rect(&mut self, rect: Rect, fill: &LinearGradient);

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba);

    /// Draw text with its baseline at `at`, scaled down to fit `max_width`.
    fn fill_text(&mut self, text: &str, at: Point, max_width: Option<f64>, font: Font, color: Rgba);
}

// ──────────────────── recording surface ────────────────────

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        fill: LinearGradient,
    },
    StrokeLine {
        from: Point,
        to: Point,
        color: Rgba,
    },
    FillText {
        text: String,
        at: Point,
        max_width: Option<f64>,
        font: Font,
        color: Rgba,
    },
}

/// In-memory surface that records a display list.
///
/// Used by tests and by offline rendering; equality of two display lists
/// stands in for equality of pixel output.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    available: bool,
    device_pixel_ratio: f64,
    logical: Option<Size>,
    backing: BackingSize,
    ops: Vec<DrawOp>,
    clears: u64,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            available: true,
            device_pixel_ratio,
            logical: Some(Size::new(width, height)),
            backing: BackingSize::default(),
            ops: Vec::new(),
            clears: 0,
        }
    }

    /// A surface with no drawing context.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0.0, 0.0, 1.0)
        }
    }

    /// A surface that cannot report its rendered size.
    #[must_use]
    pub fn without_size(device_pixel_ratio: f64) -> Self {
        Self {
            logical: None,
            ..Self::new(0.0, 0.0, device_pixel_ratio)
        }
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio;
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    #[must_use]
    pub const fn backing(&self) -> BackingSize {
        self.backing
    }

    /// Number of times the backing store was reset.
    #[must_use]
    pub const fn clears(&self) -> u64 {
        self.clears
    }

    /// Filled rectangles, in paint order.
    pub fn fills(&self) -> impl Iterator<Item = (&Rect, &LinearGradient)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillRect { rect, fill } => Some((rect, fill)),
            _ => None,
        })
    }

    /// Stroked lines, in paint order.
    pub fn lines(&self) -> impl Iterator<Item = (Point, Point, Rgba)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::StrokeLine { from, to, color } => Some((*from, *to, *color)),
            _ => None,
        })
    }

    /// Text runs, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn is_available(&self) -> bool {
        self.available
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn logical_size(&self) -> Option<Size> {
        self.logical
    }

    fn set_logical_height(&mut self, height: f64) {
        if let Some(size) = self.logical.as_mut() {
            size.height = height;
        }
    }

    fn set_backing_size(&mut self, size: BackingSize) {
        self.backing = size;
        self.ops.clear();
        self.clears += 1;
    }

    fn fill_rect(&mut self, rect: Rect, fill: &LinearGradient) {
        self.ops.push(DrawOp::FillRect {
            rect,
            fill: fill.clone(),
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba) {
        self.ops.push(DrawOp::StrokeLine { from, to, color });
    }

    fn fill_text(&mut self, text: &str, at: Point, max_width: Option<f64>, font: Font, color: Rgba) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            at,
            max_width,
            font,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_display_matches_css_syntax() {
        assert_eq!(Rgba::rgb(51, 51, 51).to_string(), "rgb(51,51,51)");
        assert_eq!(Rgba::rgba(0, 0, 0, 0.4).to_string(), "rgba(0,0,0,0.4)");
    }

    #[test]
    fn over_composites_translucent_colors() {
        let half_black = Rgba::rgba(0, 0, 0, 0.5);
        assert_eq!(half_black.over(Rgba::rgb(200, 100, 50)), Rgba::rgb(100, 50, 25));
        assert_eq!(Rgba::rgb(1, 2, 3).over(Rgba::rgb(9, 9, 9)), Rgba::rgb(1, 2, 3));
    }

    #[test]
    fn dominant_color_picks_widest_band() {
        let fill = LinearGradient::horizontal(
            Rect::new(0.0, 0.0, 9.0, 24.0),
            &[
                GradientStop::new(0.0, Rgba::rgb(1, 1, 1)),
                GradientStop::new(0.2, Rgba::rgb(2, 2, 2)),
                GradientStop::new(1.0, Rgba::rgb(3, 3, 3)),
            ],
        );
        assert_eq!(fill.dominant_color(), Some(Rgba::rgb(2, 2, 2)));
    }

    #[test]
    fn backing_resize_clears_display_list() {
        let mut surface = RecordingSurface::new(100.0, 50.0, 1.0);
        surface.stroke_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Rgba::rgb(0, 0, 0));
        assert_eq!(surface.ops().len(), 1);
        surface.set_backing_size(BackingSize {
            width: 100,
            height: 50,
        });
        assert!(surface.ops().is_empty());
        assert_eq!(surface.clears(), 1);
    }
}
