//! Plain-text rendering of the summary table.

#![allow(missing_docs)]

use colored::Colorize;

use crate::dashboard::summary::{BondStatus, SummaryRow};

const TITLE_WIDTH: usize = 32;

#[must_use]
pub fn header() -> String {
    format!(
        "{:<TITLE_WIDTH$} {:>10} {:<24} {:<10} {:>8} {:>11} {:>7} {:>7}",
        "chain", "height", "moniker", "status", "signed", "missed", "thresh", "nodes"
    )
    .bold()
    .to_string()
}

/// One table line. A changed height is highlighted; problem states are red.
#[must_use]
pub fn format_row(row: &SummaryRow) -> String {
    let title = clip(&row.title(), TITLE_WIDTH);
    let height = format!("{:>10}", row.height);
    let height = if row.height_changed {
        height.bold().to_string()
    } else {
        height
    };
    let moniker = format!("{:<24}", row.moniker);
    let moniker = if row.disconnected {
        moniker.red().to_string()
    } else {
        moniker
    };
    let bond = format!("{:<10}", row.bond.label());
    let bond = if row.bond.is_problem() {
        bond.red().to_string()
    } else if row.bond == BondStatus::Bonded {
        bond.green().to_string()
    } else {
        bond.yellow().to_string()
    };
    let missed = format!("{}/{}", row.missed, row.window);

    let mut line = format!(
        "{title:<TITLE_WIDTH$} {height} {moniker} {bond} {:>8} {missed:>11} {:>7} {:>7}",
        row.signing.to_string(),
        row.threshold,
        row.nodes.to_string(),
    );
    if let Some(alert) = &row.alert {
        let badge = match &alert.detail {
            Some(detail) => format!(" ! {} alerts: {detail}", alert.active_alerts),
            None => format!(" ! {} alerts", alert.active_alerts),
        };
        line.push_str(&badge.yellow().to_string());
    }
    line
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
