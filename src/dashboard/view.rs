//! The dashboard composition: grid and legend renderers, summary rows,
//! change tracker, and log feed, behind one owner.
//!
//! All mutation happens through `&mut self` on one thread, so none of the
//! parts needs its own synchronisation.

#![allow(missing_docs)]

use chrono::{FixedOffset, Local};

use crate::channel::manager::ChannelSink;
use crate::core::model::{LogEntry, Snapshot, Visibility};
use crate::dashboard::change_tracker::ChangeTracker;
use crate::dashboard::log_ring::LogRing;
use crate::dashboard::summary::{self, SummaryRow};
use crate::logger::diagnostics::{DiagnosticEvent, DiagnosticSink, NullDiagnostics};
use crate::render::geometry::GeometryResolver;
use crate::render::grid::{GridRenderer, RenderOutcome};
use crate::render::legend::LegendRenderer;
use crate::render::surface::Surface;

pub struct Dashboard<S> {
    grid: GridRenderer<S>,
    legend: LegendRenderer<S>,
    tracker: ChangeTracker,
    log: LogRing,
    rows: Vec<SummaryRow>,
    visibility: Visibility,
    log_panel_enabled: bool,
    /// Pinned zone for log timestamps; `None` follows the local zone.
    utc_offset: Option<FixedOffset>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl<S: Surface> Dashboard<S> {
    /// Build with both surfaces sharing one set of cell metrics.
    #[must_use]
    pub fn new(grid_surface: S, legend_surface: S, resolver: GeometryResolver) -> Self {
        Self {
            grid: GridRenderer::new(grid_surface, resolver.clone()),
            legend: LegendRenderer::new(legend_surface, resolver),
            tracker: ChangeTracker::new(),
            log: LogRing::new(),
            rows: Vec::new(),
            visibility: Visibility::Visible,
            log_panel_enabled: true,
            utc_offset: None,
            diagnostics: Box::new(NullDiagnostics),
        }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Pin log timestamps to one offset instead of the local zone.
    #[must_use]
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    // ──────────────────── accessors ────────────────────

    #[must_use]
    pub const fn grid(&self) -> &GridRenderer<S> {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridRenderer<S> {
        &mut self.grid
    }

    #[must_use]
    pub const fn legend(&self) -> &LegendRenderer<S> {
        &self.legend
    }

    pub fn legend_mut(&mut self) -> &mut LegendRenderer<S> {
        &mut self.legend
    }

    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    #[must_use]
    pub const fn log(&self) -> &LogRing {
        &self.log
    }

    #[must_use]
    pub const fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub const fn log_panel_enabled(&self) -> bool {
        self.log_panel_enabled
    }

    // ──────────────────── operations ────────────────────

    /// Project the snapshot into summary rows, then repaint the grid.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> RenderOutcome {
        for chain_id in snapshot.duplicate_chain_ids() {
            self.diagnostics.emit(DiagnosticEvent::DuplicateChainId {
                chain_id: chain_id.to_string(),
            });
        }
        self.rows = summary::project(snapshot, &mut self.tracker);
        let outcome = self.grid.render(snapshot);
        if outcome == RenderOutcome::Skipped {
            self.diagnostics
                .emit(DiagnosticEvent::RenderSkipped { target: "grid" });
        }
        outcome
    }

    pub fn render_legend(&mut self) -> RenderOutcome {
        let outcome = self.legend.render();
        if outcome == RenderOutcome::Skipped {
            self.diagnostics
                .emit(DiagnosticEvent::RenderSkipped { target: "legend" });
        }
        outcome
    }

    /// Format and push one log entry. Returns whether the feed was redrawn.
    pub fn push_log(&mut self, entry: &LogEntry) -> bool {
        let line = match &self.utc_offset {
            Some(offset) => entry.display_line(offset),
            None => entry.display_line(&Local),
        };
        self.log.push(line, self.visibility)
    }

    pub fn push_log_line(&mut self, line: impl Into<String>) -> bool {
        self.log.push(line, self.visibility)
    }

    /// Record a visibility change. Becoming visible forces one log redraw
    /// to catch up on lines pushed while hidden.
    pub fn set_visibility(&mut self, visibility: Visibility) -> bool {
        let returning = !self.visibility.is_visible() && visibility.is_visible();
        self.visibility = visibility;
        if returning {
            self.log.render();
        }
        returning
    }

    pub fn set_log_panel_enabled(&mut self, enabled: bool) {
        self.log_panel_enabled = enabled;
    }

    pub fn emit(&self, event: DiagnosticEvent) {
        self.diagnostics.emit(event);
    }

    /// Forget tracked heights, log lines and summary rows.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.log.reset();
        self.rows.clear();
    }
}

impl<S: Surface> ChannelSink for Dashboard<S> {
    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn on_log(&mut self, entry: LogEntry) {
        self.push_log(&entry);
    }

    fn on_update(&mut self, snapshot: Snapshot) {
        self.apply_snapshot(&snapshot);
    }

    fn on_log_line(&mut self, line: String) {
        self.push_log_line(line);
    }

    fn on_diagnostic(&mut self, event: DiagnosticEvent) {
        self.diagnostics.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Entity, StatusCode};
    use crate::logger::diagnostics::MemoryDiagnostics;
    use crate::render::surface::RecordingSurface;

    fn dashboard() -> (Dashboard<RecordingSurface>, MemoryDiagnostics) {
        let diags = MemoryDiagnostics::new();
        let dash = Dashboard::new(
            RecordingSurface::new(960.0, 100.0, 1.0),
            RecordingSurface::new(960.0, 30.0, 1.0),
            GeometryResolver::default(),
        )
        .with_diagnostics(Box::new(diags.clone()))
        .with_utc_offset(FixedOffset::east_opt(0).unwrap());
        (dash, diags)
    }

    #[test]
    fn snapshot_updates_rows_and_grid() {
        let (mut dash, _) = dashboard();
        let snap = Snapshot::new(vec![
            Entity::new("A", "a", 100).with_blocks([StatusCode::Signed, StatusCode::Missed]),
        ]);
        assert!(dash.apply_snapshot(&snap).is_painted());
        assert_eq!(dash.rows().len(), 1);
        assert!(dash.rows()[0].height_changed);
        assert_eq!(dash.grid().surface().fills().count(), 2);
        dash.apply_snapshot(&snap);
        assert!(!dash.rows()[0].height_changed);
    }

    #[test]
    fn unpinned_timestamps_follow_the_local_zone_per_entry() {
        let mut dash = Dashboard::new(
            RecordingSurface::new(960.0, 100.0, 1.0),
            RecordingSurface::new(960.0, 30.0, 1.0),
            GeometryResolver::default(),
        );
        // Mid-January and mid-July straddle any daylight-saving switch.
        let winter = LogEntry::new(1_705_320_000, "winter");
        let summer = LogEntry::new(1_720_958_400, "summer");
        dash.push_log(&winter);
        dash.push_log(&summer);
        let expected = format!(
            "{}\n{}",
            summer.display_line(&Local),
            winter.display_line(&Local)
        );
        assert_eq!(dash.log().text(), expected);
    }

    #[test]
    fn duplicate_ids_are_reported_and_rendering_continues() {
        let (mut dash, diags) = dashboard();
        let snap = Snapshot::new(vec![Entity::new("A", "a", 1), Entity::new("A'", "a", 2)]);
        assert!(dash.apply_snapshot(&snap).is_painted());
        assert_eq!(
            diags.events(),
            vec![DiagnosticEvent::DuplicateChainId {
                chain_id: "a".to_string()
            }]
        );
    }

    #[test]
    fn unavailable_surface_is_reported() {
        let diags = MemoryDiagnostics::new();
        let mut dash = Dashboard::new(
            RecordingSurface::unavailable(),
            RecordingSurface::unavailable(),
            GeometryResolver::default(),
        )
        .with_diagnostics(Box::new(diags.clone()));
        assert_eq!(dash.apply_snapshot(&Snapshot::default()), RenderOutcome::Skipped);
        assert_eq!(dash.render_legend(), RenderOutcome::Skipped);
        assert_eq!(
            diags.count(|e| matches!(e, DiagnosticEvent::RenderSkipped { .. })),
            2
        );
    }

    #[test]
    fn log_entries_are_formatted_with_time() {
        let (mut dash, _) = dashboard();
        dash.push_log(&LogEntry::new(3_600, "tick"));
        dash.push_log(&LogEntry::new(0, "ignored"));
        assert_eq!(dash.log().text(), "\n01:00:00 - tick");
    }

    #[test]
    fn returning_to_visible_redraws_once() {
        let (mut dash, _) = dashboard();
        dash.push_log_line("before");
        dash.set_visibility(Visibility::Hidden);
        dash.push_log_line("while hidden");
        assert_eq!(dash.log().text(), "before");
        assert!(dash.set_visibility(Visibility::Visible));
        assert_eq!(dash.log().text(), "while hidden\nbefore");
        assert!(!dash.set_visibility(Visibility::Visible));
        assert_eq!(dash.log().redraw_count(), 2);
    }

    #[test]
    fn reset_clears_state() {
        let (mut dash, _) = dashboard();
        dash.apply_snapshot(&Snapshot::new(vec![Entity::new("A", "a", 1)]));
        dash.push_log_line("x");
        dash.reset();
        assert!(dash.rows().is_empty());
        assert!(dash.log().is_empty());
        assert!(dash.tracker().is_empty());
    }
}
