//! Diagnostic channel: typed events describing contained faults and
//! connection lifecycle, and the sinks that receive them.
//!
//! The background sink owns a [`JsonlWriter`] on a dedicated thread fed by a
//! bounded crossbeam channel. Sending never blocks; when the channel is full
//! the event is counted as dropped and reported on the next write.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::core::errors::{DashError, Result};
use crate::logger::jsonl::{EventKind, JsonlConfig, JsonlWriter, Record, Severity};

/// Default bounded channel capacity.
pub const CHANNEL_CAPACITY: usize = 512;

// ──────────────────── events ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A bootstrap payload or live frame could not be decoded.
    DecodeFailed { code: String, context: String, details: String },
    /// A bootstrap step never received its payload.
    FetchFailed { code: String, step: String, details: String },
    /// The live channel closed or errored.
    TransportClosed { reason: String },
    /// A reconnect attempt was scheduled.
    ReconnectScheduled { delay_ms: u64, attempt: u64 },
    /// The live channel opened.
    Connected { attempt: u64 },
    /// An update arrived while the dashboard was hidden.
    UpdateDropped,
    /// A surface had no drawing context.
    RenderSkipped { target: &'static str },
    /// A snapshot carried the same chain identifier more than once.
    DuplicateChainId { chain_id: String },
    Shutdown,
}

impl DiagnosticEvent {
    /// Decode failure built from a crate error.
    #[must_use]
    pub fn decode_failed(context: impl Into<String>, err: &DashError) -> Self {
        Self::DecodeFailed {
            code: err.code().to_string(),
            context: context.into(),
            details: err.to_string(),
        }
    }

    /// Failure of one bootstrap step: decode errors keep their kind, anything
    /// else means the payload was never fetched.
    #[must_use]
    pub fn step_failed(step: impl Into<String>, err: &DashError) -> Self {
        match err {
            DashError::Decode { .. } => Self::decode_failed(step, err),
            _ => Self::FetchFailed {
                code: err.code().to_string(),
                step: step.into(),
                details: err.to_string(),
            },
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::DecodeFailed { .. } | Self::DuplicateChainId { .. } => Severity::Error,
            Self::FetchFailed { .. }
            | Self::TransportClosed { .. }
            | Self::ReconnectScheduled { .. }
            | Self::RenderSkipped { .. } => Severity::Warning,
            Self::Connected { .. } | Self::UpdateDropped | Self::Shutdown => Severity::Info,
        }
    }

    #[must_use]
    pub fn to_record(&self) -> Record {
        match self {
            Self::DecodeFailed {
                code,
                context,
                details,
            } => {
                let mut r = Record::now(EventKind::DecodeFailed, self.severity());
                r.code = Some(code.clone());
                r.context = Some(context.clone());
                r.details = Some(details.clone());
                r
            }
            Self::FetchFailed {
                code,
                step,
                details,
            } => {
                let mut r = Record::now(EventKind::FetchFailed, self.severity());
                r.code = Some(code.clone());
                r.context = Some(step.clone());
                r.details = Some(details.clone());
                r
            }
            Self::TransportClosed { reason } => {
                let mut r = Record::now(EventKind::TransportClosed, self.severity());
                r.details = (!reason.is_empty()).then(|| reason.clone());
                r
            }
            Self::ReconnectScheduled { delay_ms, attempt } => {
                let mut r = Record::now(EventKind::ReconnectScheduled, self.severity());
                r.delay_ms = Some(*delay_ms);
                r.attempt = Some(*attempt);
                r
            }
            Self::Connected { attempt } => {
                let mut r = Record::now(EventKind::Connected, self.severity());
                r.attempt = Some(*attempt);
                r
            }
            Self::UpdateDropped => Record::now(EventKind::UpdateDropped, self.severity()),
            Self::RenderSkipped { target } => {
                let mut r = Record::now(EventKind::RenderSkipped, self.severity());
                r.context = Some((*target).to_string());
                r
            }
            Self::DuplicateChainId { chain_id } => {
                let mut r = Record::now(EventKind::DuplicateChainId, self.severity());
                r.chain_id = Some(chain_id.clone());
                r
            }
            Self::Shutdown => Record::now(EventKind::Shutdown, self.severity()),
        }
    }
}

// ──────────────────── sinks ────────────────────

/// Receiver of diagnostic events. Must not block.
pub trait DiagnosticSink {
    fn emit(&self, event: DiagnosticEvent);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// Keeps events in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiagnostics {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl MemoryDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn count(&self, pred: impl Fn(&DiagnosticEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for MemoryDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn emit(&self, event: DiagnosticEvent) {
        (**self).emit(event);
    }
}

// ──────────────────── background logger ────────────────────

#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub jsonl: JsonlConfig,
    pub channel_capacity: usize,
    /// Mirror each event to stderr as a tagged line.
    pub stderr_echo: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            jsonl: JsonlConfig::default(),
            channel_capacity: CHANNEL_CAPACITY,
            stderr_echo: false,
        }
    }
}

/// Cloneable, `Send` handle to the logger thread.
#[derive(Debug, Clone)]
pub struct DiagnosticsHandle {
    tx: Sender<DiagnosticEvent>,
    dropped: Arc<AtomicU64>,
    stderr_muted: Arc<AtomicBool>,
}

impl DiagnosticsHandle {
    /// Events lost to back-pressure and not yet reported.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Hold back the stderr mirror, e.g. while a full-screen UI owns the
    /// terminal. The JSONL file is unaffected.
    pub fn set_stderr_muted(&self, muted: bool) {
        self.stderr_muted.store(muted, Ordering::Relaxed);
    }

    #[must_use]
    pub fn stderr_muted(&self) -> bool {
        self.stderr_muted.load(Ordering::Relaxed)
    }

    /// Ask the logger thread to flush and exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(DiagnosticEvent::Shutdown);
    }
}

impl DiagnosticSink for DiagnosticsHandle {
    fn emit(&self, event: DiagnosticEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Start the logger thread.
pub fn spawn_diagnostics(
    config: DiagnosticsConfig,
) -> Result<(DiagnosticsHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded(config.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let muted = Arc::new(AtomicBool::new(false));
    let handle = DiagnosticsHandle {
        tx,
        dropped: Arc::clone(&dropped),
        stderr_muted: Arc::clone(&muted),
    };
    let join = thread::Builder::new()
        .name("vdash-diagnostics".to_string())
        .spawn(move || logger_thread_main(&rx, config, &dropped, &muted))
        .map_err(|e| DashError::Runtime {
            details: format!("failed to spawn diagnostics thread: {e}"),
        })?;
    Ok((handle, join))
}

fn logger_thread_main(
    rx: &Receiver<DiagnosticEvent>,
    config: DiagnosticsConfig,
    dropped: &AtomicU64,
    muted: &AtomicBool,
) {
    let mut writer = JsonlWriter::open(config.jsonl);
    while let Ok(event) = rx.recv() {
        let lost = dropped.swap(0, Ordering::Relaxed);
        if lost > 0 {
            let mut warn = Record::now(EventKind::EventsLost, Severity::Warning);
            warn.details = Some(format!("{lost} diagnostic events dropped under back-pressure"));
            writer.write(&warn);
        }
        if let Some(line) = echo_line(&event, config.stderr_echo, muted) {
            eprintln!("{line}");
        }
        let stop = matches!(event, DiagnosticEvent::Shutdown);
        writer.write(&event.to_record());
        if stop {
            break;
        }
        if rx.is_empty() {
            writer.flush();
        }
    }
    writer.flush();
}

fn echo_line(event: &DiagnosticEvent, enabled: bool, muted: &AtomicBool) -> Option<String> {
    (enabled && !muted.load(Ordering::Relaxed)).then(|| format!("[VDASH-DIAG] {event:?}"))
}
