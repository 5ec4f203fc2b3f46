//! Device-pixel-ratio aware layout constants and backing-store sizing.
//!
//! The pixel ratio depends on the display the surface is shown on and may
//! change between renders, so callers resolve geometry at the start of every
//! render pass. The resolver owns the current scale; nothing else mutates it.

#![allow(missing_docs)]

use crate::render::surface::{BackingSize, Size, Surface};

/// Logical size assumed when a surface cannot report one.
pub const DEFAULT_LOGICAL_SIZE: Size = Size::new(960.0, 240.0);

/// Base (ratio 1.0) cell and label metrics, in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cell_width: f64,
    pub cell_height: f64,
    /// Horizontal space reserved for row labels.
    pub text_gutter: f64,
    /// Width row labels are truncated to.
    pub text_max: f64,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell_width: 9.0,
            cell_height: 24.0,
            text_gutter: 120.0,
            text_max: 115.0,
        }
    }
}

/// Layout resolved for one render pass, in backing-store pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub scale: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub text_gutter: f64,
    pub text_max: f64,
    pub logical: Size,
    pub backing: BackingSize,
}

impl Geometry {
    /// Geometry at scale 1.0 for the default logical size.
    #[must_use]
    pub fn unscaled(metrics: CellMetrics) -> Self {
        Self::at_scale(metrics, 1.0, DEFAULT_LOGICAL_SIZE)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn at_scale(metrics: CellMetrics, scale: f64, logical: Size) -> Self {
        let px = |v: f64| (v * scale).round().max(0.0) as u32;
        Self {
            scale,
            cell_width: metrics.cell_width * scale,
            cell_height: metrics.cell_height * scale,
            text_gutter: metrics.text_gutter * scale,
            text_max: metrics.text_max * scale,
            logical,
            backing: BackingSize {
                width: px(logical.width),
                height: px(logical.height),
            },
        }
    }
}

/// Owns the base metrics and the scale of the most recent resolution.
#[derive(Debug, Clone)]
pub struct GeometryResolver {
    metrics: CellMetrics,
    ratio_override: Option<f64>,
    current: Geometry,
}

impl Default for GeometryResolver {
    fn default() -> Self {
        Self::new(CellMetrics::default())
    }
}

impl GeometryResolver {
    #[must_use]
    pub fn new(metrics: CellMetrics) -> Self {
        Self {
            metrics,
            ratio_override: None,
            current: Geometry::unscaled(metrics),
        }
    }

    /// Pin the pixel ratio regardless of what the surface reports.
    #[must_use]
    pub fn with_ratio_override(mut self, ratio: Option<f64>) -> Self {
        self.ratio_override = ratio;
        self
    }

    #[must_use]
    pub const fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Geometry from the most recent [`Self::resolve`] call.
    #[must_use]
    pub const fn current(&self) -> Geometry {
        self.current
    }

    /// Forget the last resolution and return to scale 1.0.
    pub fn reset(&mut self) {
        self.current = Geometry::unscaled(self.metrics);
    }

    /// Read the surface's ratio and size, resize its backing store, and
    /// return the derived layout constants.
    pub fn resolve<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Geometry {
        let ratio = sanitize_ratio(
            self.ratio_override
                .unwrap_or_else(|| surface.device_pixel_ratio()),
        );
        let logical = surface
            .logical_size()
            .filter(|s| s.width.is_finite() && s.height.is_finite())
            .filter(|s| s.width > 0.0 && s.height > 0.0)
            .unwrap_or(DEFAULT_LOGICAL_SIZE);
        let geometry = Geometry::at_scale(self.metrics, ratio, logical);
        surface.set_backing_size(geometry.backing);
        self.current = geometry;
        geometry
    }
}

fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}
