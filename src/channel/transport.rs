//! Transport seam for the live channel, plus a scripted transport for tests
//! and offline replay.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::time::Duration;

use crate::core::errors::{DashError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One text frame.
    Message(String),
    /// The connection ended; no further events until the next `connect`.
    Closed { reason: String },
}

/// A push connection delivering text frames.
pub trait Transport {
    /// Open a new connection, replacing any previous one. An `Err` is a
    /// failed attempt and is handled like a close.
    fn connect(&mut self) -> Result<()>;

    /// Wait at most `timeout` for the next event. `None` means nothing
    /// arrived in time.
    fn poll(&mut self, timeout: Duration) -> Option<TransportEvent>;
}

/// Outcome of one scripted connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedConnection {
    Refused(String),
    /// Accepted; the frames are delivered in order, then the link stays
    /// idle unless the script ends with a close.
    Accepted(Vec<TransportEvent>),
}

impl ScriptedConnection {
    #[must_use]
    pub fn refused(reason: impl Into<String>) -> Self {
        Self::Refused(reason.into())
    }

    #[must_use]
    pub fn accepted<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Accepted(
            frames
                .into_iter()
                .map(|f| TransportEvent::Message(f.into()))
                .collect(),
        )
    }

    /// Append a close after the scripted frames.
    #[must_use]
    pub fn then_close(self, reason: impl Into<String>) -> Self {
        match self {
            Self::Accepted(mut events) => {
                events.push(TransportEvent::Closed {
                    reason: reason.into(),
                });
                Self::Accepted(events)
            }
            refused @ Self::Refused(_) => refused,
        }
    }
}

/// Replays a fixed list of connection attempts. Attempts beyond the script
/// are refused.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: VecDeque<ScriptedConnection>,
    live: Option<VecDeque<TransportEvent>>,
    connects: usize,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = ScriptedConnection>) -> Self {
        Self {
            script: script.into_iter().collect(),
            live: None,
            connects: 0,
        }
    }

    pub fn push(&mut self, connection: ScriptedConnection) {
        self.script.push_back(connection);
    }

    /// Connection attempts made so far.
    #[must_use]
    pub const fn connects(&self) -> usize {
        self.connects
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.live.is_some()
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> Result<()> {
        self.connects += 1;
        self.live = None;
        match self.script.pop_front() {
            Some(ScriptedConnection::Accepted(events)) => {
                self.live = Some(events.into());
                Ok(())
            }
            Some(ScriptedConnection::Refused(reason)) => Err(DashError::Transport { details: reason }),
            None => Err(DashError::Transport {
                details: "connection refused".to_string(),
            }),
        }
    }

    fn poll(&mut self, _timeout: Duration) -> Option<TransportEvent> {
        let event = self.live.as_mut()?.pop_front()?;
        if matches!(event, TransportEvent::Closed { .. }) {
            self.live = None;
        }
        Some(event)
    }
}
