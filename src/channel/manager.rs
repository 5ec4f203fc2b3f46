//! Live channel state machine.
//!
//! ```text
//! Disconnected ──start──▶ Connecting ──Opened──▶ Open
//!                              ▲                  │
//!                   ReconnectDue│            Closed│ (also while Connecting)
//!                              │                  ▼
//!                         ReconnectWait ◀── schedule fixed delay
//! ```
//!
//! The machine performs no IO. Transitions return a [`ChannelCmd`] for the
//! runner to execute, and inbound frames are dispatched to a [`ChannelSink`].
//! Retries never stop and the delay never grows.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Serialize;

use crate::core::model::{InboundMessage, LogEntry, Snapshot, Visibility};
use crate::logger::diagnostics::DiagnosticEvent;

/// Delay between a close and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Prefix of the log line pushed on every close; the close reason follows.
pub const CONNECTION_LOST_PREFIX: &str = "Socket is closed, retrying /ws ...";

/// Receiver of everything the channel produces.
pub trait ChannelSink {
    /// Consulted for every `update` frame.
    fn visibility(&self) -> Visibility;

    fn on_log(&mut self, entry: LogEntry);

    /// Only called while visible.
    fn on_update(&mut self, snapshot: Snapshot);

    /// A preformatted log line originating from the channel itself.
    fn on_log_line(&mut self, line: String);

    fn on_diagnostic(&mut self, event: DiagnosticEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    /// Closed; a reconnect timer is armed.
    ReconnectWait,
}

impl ChannelState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::ReconnectWait => "reconnecting",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    /// Orderly close, transport error, or failed connection attempt.
    Closed { reason: String },
    ReconnectDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCmd {
    None,
    Connect,
    ScheduleReconnect(Duration),
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Logged,
    Rendered,
    /// `update` while hidden; not buffered.
    Dropped,
    /// Unknown `msgType`.
    Ignored,
    DecodeFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub connect_attempts: u64,
    pub opened: u64,
    pub closed: u64,
    pub reconnects_scheduled: u64,
    pub logs: u64,
    pub updates_rendered: u64,
    pub updates_dropped: u64,
    pub ignored: u64,
    pub decode_failures: u64,
}

#[derive(Debug, Clone)]
pub struct LiveChannel {
    state: ChannelState,
    reconnect_delay: Duration,
    stats: ChannelStats,
}

impl Default for LiveChannel {
    fn default() -> Self {
        Self::new(RECONNECT_DELAY)
    }
}

impl LiveChannel {
    #[must_use]
    pub const fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ChannelState::Disconnected,
            reconnect_delay,
            stats: ChannelStats {
                connect_attempts: 0,
                opened: 0,
                closed: 0,
                reconnects_scheduled: 0,
                logs: 0,
                updates_rendered: 0,
                updates_dropped: 0,
                ignored: 0,
                decode_failures: 0,
            },
        }
    }

    #[must_use]
    pub const fn state(&self) -> ChannelState {
        self.state
    }

    #[must_use]
    pub const fn stats(&self) -> ChannelStats {
        self.stats
    }

    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Leave `Disconnected`. Calling it again is a no-op.
    pub fn start(&mut self) -> ChannelCmd {
        if self.state == ChannelState::Disconnected {
            self.begin_connect()
        } else {
            ChannelCmd::None
        }
    }

    /// Apply one event. Events that make no sense in the current state are
    /// ignored, so a stray duplicate close cannot arm a second timer.
    pub fn handle<K: ChannelSink + ?Sized>(&mut self, event: ChannelEvent, sink: &mut K) -> ChannelCmd {
        match (self.state, event) {
            (ChannelState::Connecting, ChannelEvent::Opened) => {
                self.state = ChannelState::Open;
                self.stats.opened += 1;
                sink.on_diagnostic(DiagnosticEvent::Connected {
                    attempt: self.stats.connect_attempts,
                });
                ChannelCmd::None
            }
            (ChannelState::Open, ChannelEvent::Message(raw)) => {
                self.dispatch(&raw, sink);
                ChannelCmd::None
            }
            (ChannelState::Connecting | ChannelState::Open, ChannelEvent::Closed { reason }) => {
                self.state = ChannelState::ReconnectWait;
                self.stats.closed += 1;
                self.stats.reconnects_scheduled += 1;
                sink.on_log_line(format!("{CONNECTION_LOST_PREFIX}{reason}"));
                sink.on_diagnostic(DiagnosticEvent::TransportClosed { reason });
                sink.on_diagnostic(DiagnosticEvent::ReconnectScheduled {
                    delay_ms: u64::try_from(self.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
                    attempt: self.stats.connect_attempts + 1,
                });
                ChannelCmd::ScheduleReconnect(self.reconnect_delay)
            }
            (ChannelState::ReconnectWait, ChannelEvent::ReconnectDue) => self.begin_connect(),
            _ => ChannelCmd::None,
        }
    }

    /// Decode one frame and route it by `msgType`.
    pub fn dispatch<K: ChannelSink + ?Sized>(&mut self, raw: &str, sink: &mut K) -> Dispatch {
        match InboundMessage::from_json(raw) {
            Err(err) => {
                self.stats.decode_failures += 1;
                sink.on_diagnostic(DiagnosticEvent::decode_failed("live message", &err));
                Dispatch::DecodeFailed
            }
            Ok(InboundMessage::Log(entry)) => {
                self.stats.logs += 1;
                sink.on_log(entry);
                Dispatch::Logged
            }
            Ok(InboundMessage::Update(snapshot)) => {
                if sink.visibility().is_visible() {
                    self.stats.updates_rendered += 1;
                    sink.on_update(snapshot);
                    Dispatch::Rendered
                } else {
                    self.stats.updates_dropped += 1;
                    sink.on_diagnostic(DiagnosticEvent::UpdateDropped);
                    Dispatch::Dropped
                }
            }
            Ok(InboundMessage::Other) => {
                self.stats.ignored += 1;
                Dispatch::Ignored
            }
        }
    }

    fn begin_connect(&mut self) -> ChannelCmd {
        self.state = ChannelState::Connecting;
        self.stats.connect_attempts += 1;
        ChannelCmd::Connect
    }
}
