//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use validator_dash::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DashError, Result};
pub use crate::core::model::{Entity, LogEntry, Snapshot, StatusCode, Visibility};

// Render
pub use crate::render::encoder::{CellEncoding, RowParity, encode};
pub use crate::render::geometry::{CellMetrics, Geometry, GeometryResolver};
pub use crate::render::grid::{GridRenderer, RenderOutcome};
pub use crate::render::legend::LegendRenderer;
pub use crate::render::surface::{RecordingSurface, Surface};

// Dashboard
pub use crate::dashboard::change_tracker::ChangeTracker;
pub use crate::dashboard::log_ring::{LOG_CAPACITY, LogRing};
pub use crate::dashboard::view::Dashboard;

// Channel
pub use crate::channel::manager::{ChannelSink, LiveChannel, RECONNECT_DELAY};
pub use crate::channel::runner::ChannelRunner;
pub use crate::channel::scheduler::{Scheduler, SystemScheduler, VirtualScheduler};
pub use crate::channel::transport::Transport;

// Diagnostics
pub use crate::logger::diagnostics::{DiagnosticEvent, DiagnosticSink};
