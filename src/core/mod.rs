//! Core types: errors, configuration, the wire data model.

pub mod config;
pub mod errors;
pub mod model;
