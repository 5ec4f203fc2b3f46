//! Drawing: surface seam, layout, status encoding, grid and legend painters.

pub mod encoder;
pub mod geometry;
pub mod grid;
pub mod legend;
pub mod surface;
#[cfg(feature = "cli")]
pub mod terminal;
