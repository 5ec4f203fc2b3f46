//! Live push channel: state machine, scheduler, transports, and the runner
//! that ties them together.

pub mod manager;
pub mod runner;
pub mod scheduler;
pub mod transport;
#[cfg(feature = "cli")]
pub mod websocket;
