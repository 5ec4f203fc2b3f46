#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use validator_dash::channel::manager::ChannelSink;
use validator_dash::core::model::{LogEntry, Snapshot, Visibility};
use validator_dash::logger::diagnostics::DiagnosticEvent;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_vdash") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "vdash.exe" } else { "vdash" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve vdash binary path for integration test"),
    }
}

/// Run the CLI with an isolated HOME so no user config leaks in, and keep a
/// transcript of the run for failure messages.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("vdash-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");
    let home = tempfile::tempdir().expect("create isolated home");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("HOME", home.path())
        .env_remove("VDASH_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1")
        .output()
        .expect("execute vdash command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    let _ = writeln!(log_content, "case={case_name}");
    let _ = writeln!(log_content, "bin={}", bin_path.display());
    let _ = writeln!(log_content, "args={args:?}");
    let _ = writeln!(log_content, "status={}", output.status);
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

// ──────────────────── fixtures ────────────────────

/// `{"Status":[...]}` with one entity per `(name, chain_id, height, blocks)`.
pub fn snapshot_json(entities: &[(&str, &str, u64, &[i64])]) -> String {
    let rows: Vec<serde_json::Value> = entities
        .iter()
        .map(|(name, chain_id, height, blocks)| {
            serde_json::json!({
                "name": name,
                "chain_id": chain_id,
                "height": height,
                "blocks": blocks,
            })
        })
        .collect();
    serde_json::json!({ "Status": rows }).to_string()
}

pub fn update_frame(entities: &[(&str, &str, u64, &[i64])]) -> String {
    let mut value: serde_json::Value =
        serde_json::from_str(&snapshot_json(entities)).expect("fixture json");
    value["msgType"] = serde_json::Value::from("update");
    value.to_string()
}

pub fn log_frame(ts: i64, msg: &str) -> String {
    serde_json::json!({ "msgType": "log", "ts": ts, "msg": msg }).to_string()
}

/// Sink that records everything the live channel hands it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub visibility: Visibility,
    pub logs: Vec<LogEntry>,
    pub updates: Vec<Snapshot>,
    pub lines: Vec<String>,
    pub diagnostics: Vec<DiagnosticEvent>,
}

impl ChannelSink for RecordingSink {
    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn on_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    fn on_update(&mut self, snapshot: Snapshot) {
        self.updates.push(snapshot);
    }

    fn on_log_line(&mut self, line: String) {
        self.lines.push(line);
    }

    fn on_diagnostic(&mut self, event: DiagnosticEvent) {
        self.diagnostics.push(event);
    }
}
