#![forbid(unsafe_code)]

//! Validator dashboard (vdash): renders a validator signing grid, a legend,
//! a summary table, and a live log feed from a push channel.
//!
//! The core is surface-agnostic:
//! 1. **Render**: geometry resolution, status encoding, grid and legend painting
//! 2. **Dashboard**: change tracking, the 256-line log feed, summary rows
//! 3. **Channel**: live-channel state machine with a fixed reconnect delay
//!
//! # Library usage
//!
//! ```rust,no_run
//! use validator_dash::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use validator_dash::core::config::Config;
//! use validator_dash::render::grid::GridRenderer;
//! ```

pub mod prelude;

pub mod channel;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod dashboard;
pub mod logger;
pub mod render;
