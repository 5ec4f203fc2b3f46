//! Append-only JSONL sink for diagnostic records.
//!
//! One self-contained JSON object per line, assembled in memory and written
//! with a single `write_all` so tailing readers never see half a record.
//!
//! When a path stops working the writer degrades instead of failing:
//! primary path, then fallback path, then stderr with a `[VDASH-JSONL]`
//! prefix, then silent discard.

#![allow(missing_docs)]

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};

const BUFFER_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DecodeFailed,
    /// A startup fetch did not return a payload.
    FetchFailed,
    TransportClosed,
    ReconnectScheduled,
    Connected,
    UpdateDropped,
    RenderSkipped,
    DuplicateChainId,
    /// Diagnostic events lost to back-pressure.
    EventsLost,
    Shutdown,
}

/// One JSONL line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Record {
    /// Record stamped with the current UTC time.
    #[must_use]
    pub fn now(event: EventKind, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            severity,
            code: None,
            context: None,
            chain_id: None,
            delay_ms: None,
            attempt: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the current file would exceed this size.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1 ..= <path>.N`.
    pub max_rotated_files: u32,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("vdash").join("diagnostics.jsonl"),
            fallback_path: None,
            max_size_bytes: 8 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Where records currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Stderr => "stderr",
            Self::Discard => "discard",
        })
    }
}

pub struct JsonlWriter {
    config: JsonlConfig,
    file: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the primary path, degrading immediately if it is unusable.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            file: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&writer.config.path) {
            Ok((file, size)) => writer.attach(file, size, WriterState::Primary),
            Err(_) => writer.open_fallback(),
        }
        writer
    }

    pub fn write(&mut self, record: &Record) {
        match serde_json::to_string(record) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[VDASH-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    #[must_use]
    pub const fn state(&self) -> WriterState {
        self.state
    }

    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    // ──────────────────── internals ────────────────────

    fn attach(&mut self, file: File, size: u64, state: WriterState) {
        self.file = Some(BufWriter::with_capacity(BUFFER_BYTES, file));
        self.state = state;
        self.bytes_written = size;
    }

    fn current_path(&self) -> Option<&Path> {
        match self.state {
            WriterState::Primary => Some(&self.config.path),
            WriterState::Fallback => self.config.fallback_path.as_deref(),
            WriterState::Stderr | WriterState::Discard => None,
        }
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.file.is_some() && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }
        match self.state {
            WriterState::Primary | WriterState::Fallback => {
                let ok = self
                    .file
                    .as_mut()
                    .is_some_and(|f| f.write_all(line.as_bytes()).is_ok());
                if ok {
                    self.bytes_written += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[VDASH-JSONL] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    fn open_fallback(&mut self) {
        let Some(fallback) = self.config.fallback_path.clone() else {
            self.fall_to_stderr("primary path failed and no fallback configured");
            return;
        };
        match open_append(&fallback) {
            Ok((file, size)) => {
                let _ = writeln!(
                    io::stderr(),
                    "[VDASH-JSONL] primary path failed, using fallback: {}",
                    fallback.display()
                );
                self.attach(file, size, WriterState::Fallback);
            }
            Err(_) => self.fall_to_stderr("primary and fallback paths failed"),
        }
    }

    fn fall_to_stderr(&mut self, why: &str) {
        self.file = None;
        self.state = WriterState::Stderr;
        let _ = writeln!(io::stderr(), "[VDASH-JSONL] {why}, using stderr");
    }

    fn degrade(&mut self) {
        self.file = None;
        match self.state {
            WriterState::Primary => self.open_fallback(),
            WriterState::Fallback => self.fall_to_stderr("fallback write failed"),
            WriterState::Stderr | WriterState::Discard => self.state = WriterState::Discard,
        }
    }

    fn rotate(&mut self) {
        self.flush();
        self.file = None;
        let Some(base) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        let keep = self.config.max_rotated_files;
        if keep == 0 {
            let _ = fs::remove_file(&base);
        } else {
            let _ = fs::remove_file(rotated_name(&base, keep));
            for generation in (1..keep).rev() {
                let _ = fs::rename(rotated_name(&base, generation), rotated_name(&base, generation + 1));
            }
            let _ = fs::rename(&base, rotated_name(&base, 1));
        }
        match open_append(&base) {
            Ok((file, _)) => {
                let state = self.state;
                self.attach(file, 0, state);
            }
            Err(_) => self.degrade(),
        }
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| DashError::io(parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DashError::io(path, e))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `diag.jsonl` → `diag.jsonl.2`.
fn rotated_name(base: &Path, generation: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}
