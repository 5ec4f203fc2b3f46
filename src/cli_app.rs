//! Top-level CLI definition and dispatch.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use validator_dash::cli::render::{DEFAULT_COLUMNS, render_snapshot, terminal_dashboard, write_static};
use validator_dash::cli::watch::{WatchOptions, WatchSummary, run_watch};
use validator_dash::core::config::Config;
use validator_dash::core::errors::DashError;
use validator_dash::core::model::Snapshot;
use validator_dash::render::grid::RenderOutcome;

/// Validator dashboard: signing grid, legend, summary table, and live log.
#[derive(Debug, Parser)]
#[command(
    name = "vdash",
    author,
    version,
    about = "Validator signing dashboard",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Follow the live channel in an interactive dashboard.
    Watch(WatchArgs),
    /// Render a saved state snapshot once and exit.
    Render(RenderArgs),
    /// Print the status legend.
    Legend(LegendArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct WatchArgs {
    /// Skip the initial state, log history, and log-flag fetch.
    #[arg(long)]
    no_bootstrap: bool,
    /// Override the live channel URL (ws:// or wss://).
    #[arg(long, value_name = "URL")]
    url: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Snapshot JSON file (`{"Status": [...]}`), or `-` for stdin.
    #[arg(long, value_name = "FILE")]
    snapshot: PathBuf,
    /// Output width in columns.
    #[arg(long, default_value_t = DEFAULT_COLUMNS, value_name = "COLS")]
    width: u16,
}

#[derive(Debug, Clone, Args)]
struct LegendArgs {
    /// Output width in columns.
    #[arg(long, default_value_t = DEFAULT_COLUMNS, value_name = "COLS")]
    width: u16,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<DashError> for CliError {
    fn from(err: DashError) -> Self {
        match err {
            DashError::InvalidConfig { .. }
            | DashError::MissingConfig { .. }
            | DashError::ConfigParse { .. }
            | DashError::Decode { .. } => Self::User(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Watch(args) => run_watch_command(cli, args),
        Command::Render(args) => run_render(cli, args),
        Command::Legend(args) => run_legend(cli, args),
        Command::Config(args) => run_config(cli, args),
    }
}

fn run_watch_command(cli: &Cli, args: &WatchArgs) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &args.url {
        config.channel.url.clone_from(url);
        config.validate()?;
    }

    let summary = run_watch(
        &config,
        &WatchOptions {
            skip_bootstrap: args.no_bootstrap,
        },
    )?;

    match output_mode(cli) {
        OutputMode::Human => print_watch_summary(&summary),
        OutputMode::Json => {
            let payload = json!({
                "command": "watch",
                "url": summary.url,
                "stats": serde_json::to_value(summary.stats)?,
                "bootstrap_failures": summary.bootstrap.as_ref().map(|r| r.failures),
                "dropped_diagnostics": summary.dropped_diagnostics,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_watch_summary(summary: &WatchSummary) {
    let stats = &summary.stats;
    println!("{} {}", "Disconnected from".bold(), summary.url);
    println!(
        "  connections: {} opened / {} attempted, {} reconnects scheduled",
        stats.opened, stats.connect_attempts, stats.reconnects_scheduled
    );
    println!(
        "  updates: {} rendered, {} dropped while unfocused; {} log lines",
        stats.updates_rendered, stats.updates_dropped, stats.logs
    );
    if stats.decode_failures > 0 {
        println!(
            "  {}",
            format!("{} frames failed to decode", stats.decode_failures).yellow()
        );
    }
    if let Some(report) = &summary.bootstrap
        && report.failures > 0
    {
        println!(
            "  {}",
            format!("{} bootstrap steps failed", report.failures).yellow()
        );
    }
}

fn run_render(cli: &Cli, args: &RenderArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let raw = if args.snapshot.as_os_str() == "-" {
        io::read_to_string(io::stdin())?
    } else {
        fs::read_to_string(&args.snapshot).map_err(|e| {
            CliError::User(format!("read snapshot {}: {e}", args.snapshot.display()))
        })?
    };
    let snapshot = Snapshot::from_json(&raw)?;
    let dash = render_snapshot(&config, &snapshot, args.width);

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            write_static(&mut stdout, &dash)?;
        }
        OutputMode::Json => {
            let painted = dash.grid().render_count();
            let rows: Vec<Value> = dash
                .rows()
                .iter()
                .map(|row| {
                    json!({
                        "chain_id": row.chain_id,
                        "name": row.name,
                        "height": row.height,
                        "moniker": row.moniker,
                        "status": row.bond.label(),
                        "signed": row.signing.to_string(),
                        "missed": row.missed,
                        "window": row.window,
                        "threshold": row.threshold,
                        "nodes": row.nodes.to_string(),
                        "alerts": row.alert.as_ref().map(|a| a.active_alerts),
                    })
                })
                .collect();
            let payload = json!({
                "command": "render",
                "renders": painted,
                "rows": rows,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_legend(cli: &Cli, args: &LegendArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut dash = terminal_dashboard(&config, args.width);
    let outcome = dash.render_legend();

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            dash.legend().surface().write_lines(&mut stdout)?;
        }
        OutputMode::Json => {
            let cells = match outcome {
                RenderOutcome::Painted { cells, .. } => cells,
                RenderOutcome::Skipped => 0,
            };
            let payload = json!({
                "command": "legend",
                "cells": cells,
                "lines": dash.legend().surface().plain_lines(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                let channel_url = config.channel_url()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Channel: {channel_url}");
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "source": config.paths.config_file.to_string_lossy(),
                            "channel_url": channel_url,
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(err) => {
                if output_mode(cli) == OutputMode::Json {
                    let payload = json!({
                        "command": "config validate",
                        "valid": false,
                        "code": err.code(),
                        "error": err.to_string(),
                    });
                    write_json_line(&payload)?;
                }
                Err(err.into())
            }
        },
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("VDASH_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode.map(str::to_ascii_lowercase).as_deref() {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ if stdout_is_tty => OutputMode::Human,
        _ => OutputMode::Json,
    }
}
