//! Interactive dashboard: bootstrap, then follow the live channel until
//! quit or SIGTERM/SIGINT.
//!
//! Everything runs on the main thread. Each tick drains pending terminal
//! input, then lets the channel runner wait briefly on the socket. Terminal
//! focus stands in for page visibility: updates arriving while unfocused are
//! dropped and the log panel catches up on refocus.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::channel::manager::{ChannelState, ChannelStats, LiveChannel};
use crate::channel::runner::ChannelRunner;
use crate::channel::scheduler::SystemScheduler;
use crate::channel::websocket::WebSocketTransport;
use crate::cli::fetch::fetch_bootstrap;
use crate::cli::render::terminal_dashboard;
use crate::cli::signals::ShutdownSignal;
use crate::cli::table;
use crate::cli::terminal_guard::TerminalGuard;
use crate::core::config::Config;
use crate::core::errors::{DashError, Result};
use crate::core::model::Visibility;
use crate::dashboard::bootstrap::{BootstrapReport, bootstrap};
use crate::dashboard::view::Dashboard;
use crate::logger::diagnostics::spawn_diagnostics;
use crate::render::terminal::TerminalSurface;

type TermDashboard = Dashboard<TerminalSurface>;
type Runner = ChannelRunner<WebSocketTransport, SystemScheduler>;

#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Start from an empty dashboard instead of fetching state and history.
    pub skip_bootstrap: bool,
}

#[derive(Debug)]
pub struct WatchSummary {
    pub url: String,
    pub stats: ChannelStats,
    pub bootstrap: Option<BootstrapReport>,
    pub dropped_diagnostics: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputAction {
    None,
    Redraw,
    Quit,
}

pub fn run_watch(config: &Config, options: &WatchOptions) -> Result<WatchSummary> {
    let url = config.channel_url()?;
    let payloads = if options.skip_bootstrap {
        None
    } else {
        Some(fetch_bootstrap(config)?)
    };

    let (diagnostics, join) = spawn_diagnostics(config.diagnostics_config())?;
    let signal = ShutdownSignal::register();

    let (cols, _) = TerminalGuard::terminal_size();
    let mut dash = terminal_dashboard(config, cols).with_diagnostics(Box::new(diagnostics.clone()));
    dash.render_legend();
    let report = payloads.map(|p| bootstrap(&mut dash, p));

    let mut runner = ChannelRunner::new(
        LiveChannel::new(config.reconnect_delay()),
        WebSocketTransport::new(url.clone()).with_connect_timeout(config.connect_timeout()),
        SystemScheduler::new(),
    );

    let outcome = TerminalGuard::new()
        .map_err(|e| DashError::Runtime {
            details: format!("terminal setup failed: {e}"),
        })
        .and_then(|guard| {
            diagnostics.set_stderr_muted(true);
            let result = event_loop(&mut runner, &mut dash, &signal, config, &url);
            drop(guard);
            diagnostics.set_stderr_muted(false);
            result
        });

    runner.transport_mut().close();
    let dropped_diagnostics = diagnostics.dropped_events();
    diagnostics.shutdown();
    if join.join().is_err() {
        eprintln!("[VDASH-WATCH] diagnostics thread panicked");
    }
    outcome?;

    Ok(WatchSummary {
        url,
        stats: runner.channel().stats(),
        bootstrap: report,
        dropped_diagnostics,
    })
}

fn event_loop(
    runner: &mut Runner,
    dash: &mut TermDashboard,
    signal: &ShutdownSignal,
    config: &Config,
    url: &str,
) -> Result<()> {
    let mut stdout = io::stdout();
    runner.start(dash);
    let mut dirty = true;

    while !signal.should_shutdown() {
        while event::poll(Duration::ZERO).map_err(terminal_error)? {
            let input = event::read().map_err(terminal_error)?;
            match apply_input(dash, &input) {
                InputAction::Quit => return Ok(()),
                InputAction::Redraw => dirty = true,
                InputAction::None => {}
            }
        }

        if runner.step(dash, config.poll_interval()) {
            dirty = true;
        }

        if dirty {
            let status = status_line(url, runner.channel().state(), dash.visibility());
            let (_, screen_rows) = TerminalGuard::terminal_size();
            draw_frame(&mut stdout, dash, &status, screen_rows).map_err(terminal_error)?;
            dirty = false;
        }
    }
    Ok(())
}

fn apply_input(dash: &mut TermDashboard, input: &Event) -> InputAction {
    match input {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => InputAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputAction::Quit
            }
            _ => InputAction::None,
        },
        Event::FocusLost => {
            dash.set_visibility(Visibility::Hidden);
            InputAction::Redraw
        }
        Event::FocusGained => {
            dash.set_visibility(Visibility::Visible);
            InputAction::Redraw
        }
        Event::Resize(cols, _) => {
            dash.grid_mut().surface_mut().set_columns(*cols);
            dash.legend_mut().surface_mut().set_columns(*cols);
            dash.render_legend();
            InputAction::Redraw
        }
        _ => InputAction::None,
    }
}

fn status_line(url: &str, state: ChannelState, visibility: Visibility) -> String {
    let mut line = format!("vdash  {url}  [{}]", state.label());
    if !visibility.is_visible() {
        line.push_str("  (unfocused: updates paused)");
    }
    line
}

/// Status line, grid, legend, table, then as much of the log as fits.
fn draw_frame<W: Write>(
    out: &mut W,
    dash: &TermDashboard,
    status: &str,
    screen_rows: u16,
) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All), Print(status))?;

    let mut row: u16 = 1;
    let grid = dash.grid().surface();
    grid.draw_at(out, 0, row)?;
    row = row.saturating_add(grid.height_rows());
    let legend = dash.legend().surface();
    legend.draw_at(out, 0, row)?;
    row = row.saturating_add(legend.height_rows()).saturating_add(1);

    let mut lines = vec![table::header()];
    lines.extend(dash.rows().iter().map(table::format_row));
    if dash.log_panel_enabled() {
        lines.push(String::new());
        lines.extend(dash.log().text().lines().map(str::to_string));
    }
    for line in lines {
        if row >= screen_rows {
            break;
        }
        queue!(out, MoveTo(0, row), Print(line))?;
        row += 1;
    }
    out.flush()
}

fn terminal_error(e: io::Error) -> DashError {
    DashError::Runtime {
        details: format!("terminal i/o: {e}"),
    }
}
