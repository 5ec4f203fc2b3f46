//! One-shot rendering of a snapshot to plain terminal output.

#![allow(missing_docs)]

use std::io::{self, Write};

use crate::cli::table;
use crate::core::config::Config;
use crate::core::model::Snapshot;
use crate::dashboard::view::Dashboard;
use crate::render::geometry::GeometryResolver;
use crate::render::terminal::TerminalSurface;

pub const DEFAULT_COLUMNS: u16 = 120;

/// Dashboard drawing onto two character grids `cols` wide.
#[must_use]
pub fn terminal_dashboard(config: &Config, cols: u16) -> Dashboard<TerminalSurface> {
    let resolver = GeometryResolver::new(config.cell_metrics())
        .with_ratio_override(config.render.device_pixel_ratio);
    Dashboard::new(TerminalSurface::new(cols), TerminalSurface::new(cols), resolver)
}

#[must_use]
pub fn render_snapshot(config: &Config, snapshot: &Snapshot, cols: u16) -> Dashboard<TerminalSurface> {
    let mut dash = terminal_dashboard(config, cols);
    dash.render_legend();
    dash.apply_snapshot(snapshot);
    dash
}

/// Grid, legend, then the summary table, as consecutive lines.
pub fn write_static<W: Write>(out: &mut W, dash: &Dashboard<TerminalSurface>) -> io::Result<()> {
    dash.grid().surface().write_lines(out)?;
    dash.legend().surface().write_lines(out)?;
    writeln!(out)?;
    writeln!(out, "{}", table::header())?;
    for row in dash.rows() {
        writeln!(out, "{}", table::format_row(row))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Entity, StatusCode};

    #[test]
    fn snapshot_renders_grid_legend_and_table() {
        let snapshot = Snapshot::new(vec![
            Entity::new("juno", "juno-1", 10).with_blocks([StatusCode::Signed; 4]),
            Entity::new("akash", "akashnet-2", 20).with_blocks([StatusCode::Missed]),
        ]);
        let dash = render_snapshot(&Config::default(), &snapshot, 80);
        let grid = dash.grid().surface().plain_lines();
        assert!(grid[1].starts_with("juno"), "{grid:?}");
        assert!(grid[2].starts_with("akash"), "{grid:?}");
        assert!(dash.legend().surface().plain_lines()[0].contains("signed"));
        assert_eq!(dash.rows().len(), 2);

        let mut out = Vec::new();
        write_static(&mut out, &dash).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("juno (juno-1)"));
        assert!(text.contains("akash (akashnet-2)"));
    }
}
