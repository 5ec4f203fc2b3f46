//! CLI smoke tests against the built binary.

mod common;

use std::fs;

use serde_json::Value;

fn json_line(stdout: &str) -> Value {
    serde_json::from_str(stdout.lines().next().unwrap_or_default()).expect("json output")
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: vdash [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_validate_reports_derived_channel_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "[bootstrap]\nbase_url = \"https://dash.example.com\"\n").expect("write config");

    let result = common::run_cli_case(
        "config_validate_reports_derived_channel_url",
        &["--config", path.to_str().expect("utf8 path"), "--json", "config", "validate"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["valid"], true);
    assert_eq!(payload["channel_url"], "wss://dash.example.com/ws");
}

#[test]
fn invalid_config_exits_with_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "[channel]\nreconnect_delay_ms = 0\n").expect("write config");

    let result = common::run_cli_case(
        "invalid_config_exits_with_user_error",
        &["--config", path.to_str().expect("utf8 path"), "--json", "config", "validate"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["code"], "VD-1001");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let result = common::run_cli_case(
        "missing_explicit_config_is_an_error",
        &["--config", "/nonexistent/vdash.toml", "config", "show"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("vdash:"));
}

#[test]
fn render_snapshot_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        common::snapshot_json(&[("Juno", "juno-1", 42, &[4, 3, 0]), ("Akash", "akashnet-2", 7, &[])]),
    )
    .expect("write snapshot");

    let result = common::run_cli_case(
        "render_snapshot_as_json",
        &["--json", "render", "--snapshot", path.to_str().expect("utf8 path")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["renders"], 1);
    let rows = payload["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["chain_id"], "juno-1");
    assert_eq!(rows[0]["height"], 42);
}

#[test]
fn render_rejects_malformed_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    fs::write(&path, "{not json").expect("write snapshot");

    let result = common::run_cli_case(
        "render_rejects_malformed_snapshot",
        &["render", "--snapshot", path.to_str().expect("utf8 path")],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn legend_lists_every_status() {
    let result = common::run_cli_case("legend_lists_every_status", &["--json", "legend"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["cells"], 6);
    let text = payload["lines"].to_string();
    for label in ["proposer", "signed", "miss/precommit", "miss/prevote", "missed", "no data"] {
        assert!(text.contains(label), "{label} missing from {text}");
    }
}
