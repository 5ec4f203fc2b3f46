//! Terminal front end: bootstrap fetch, terminal lifecycle, the summary
//! table, and the interactive watch loop.
#![allow(missing_docs)]

pub mod fetch;
pub mod render;
pub mod signals;
pub mod table;
pub mod terminal_guard;
pub mod watch;
