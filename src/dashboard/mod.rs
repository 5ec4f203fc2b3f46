//! Dashboard state: change tracking, the log feed, summary rows, and the
//! composition that owns them alongside the renderers.

pub mod bootstrap;
pub mod change_tracker;
pub mod log_ring;
pub mod summary;
pub mod view;
