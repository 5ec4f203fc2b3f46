//! One-shot ingestion of the three bootstrap payloads: the log-panel flag,
//! the initial snapshot, and the log history.
//!
//! Payloads arrive as raw JSON text (or a fetch error). Each step is
//! independent: a failure is reported to the diagnostic channel and the
//! remaining steps still run.

#![allow(missing_docs)]

use crate::core::errors::{DashError, Result};
use crate::core::model::{LogEntry, LogFeatureFlag, Snapshot};
use crate::dashboard::view::Dashboard;
use crate::logger::diagnostics::DiagnosticEvent;
use crate::render::grid::RenderOutcome;
use crate::render::surface::Surface;

/// Raw bootstrap responses, already fetched.
#[derive(Debug)]
pub struct BootstrapPayloads {
    pub logs_enabled: Result<String>,
    pub state: Result<String>,
    pub logs: Result<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// `None` when the flag could not be read; the panel stays as it was.
    pub log_panel_enabled: Option<bool>,
    pub state: Option<RenderOutcome>,
    pub log_lines: usize,
    pub failures: usize,
}

/// Apply the log-panel flag. An unreadable flag leaves the panel enabled.
pub fn apply_feature_flag<S: Surface>(dash: &mut Dashboard<S>, raw: &str) -> Result<bool> {
    let flag = LogFeatureFlag::from_json(raw)?;
    dash.set_log_panel_enabled(flag.enabled);
    Ok(flag.enabled)
}

/// Decode and render the initial snapshot.
pub fn apply_initial_state<S: Surface>(dash: &mut Dashboard<S>, raw: &str) -> Result<RenderOutcome> {
    let snapshot = Snapshot::from_json(raw)?;
    Ok(dash.apply_snapshot(&snapshot))
}

/// Replay the served history (newest first) oldest-first, so the newest
/// line ends on top. Returns the number of lines pushed.
pub fn replay_log_history<S: Surface>(dash: &mut Dashboard<S>, raw: &str) -> Result<usize> {
    let history = LogEntry::history_from_json(raw)?;
    for entry in history.iter().rev() {
        dash.push_log(entry);
    }
    Ok(history.len())
}

/// Run all three steps in order, containing failures.
pub fn bootstrap<S: Surface>(dash: &mut Dashboard<S>, payloads: BootstrapPayloads) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    match payloads
        .logs_enabled
        .and_then(|raw| apply_feature_flag(dash, &raw))
    {
        Ok(enabled) => report.log_panel_enabled = Some(enabled),
        Err(err) => fail(dash, &mut report, "logs enabled flag", &err),
    }

    match payloads.state.and_then(|raw| apply_initial_state(dash, &raw)) {
        Ok(outcome) => report.state = Some(outcome),
        Err(err) => fail(dash, &mut report, "initial state", &err),
    }

    match payloads.logs.and_then(|raw| replay_log_history(dash, &raw)) {
        Ok(lines) => report.log_lines = lines,
        Err(err) => fail(dash, &mut report, "log history", &err),
    }

    report
}

fn fail<S: Surface>(dash: &Dashboard<S>, report: &mut BootstrapReport, step: &str, err: &DashError) {
    report.failures += 1;
    dash.emit(DiagnosticEvent::step_failed(step, err));
}
