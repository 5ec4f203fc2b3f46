//! Typed projection of a snapshot into summary-table rows.
//!
//! Markup is left to the front end; this module only decides what each cell
//! says. Computing this projection is also where row heights pass through
//! the change tracker.

#![allow(missing_docs)]

use std::fmt;

use crate::core::model::{Entity, Snapshot};
use crate::dashboard::change_tracker::ChangeTracker;

/// Monikers longer than this are cut.
pub const MONIKER_MAX_CHARS: usize = 24;

/// Validator bonding state, one badge per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStatus {
    Tombstoned,
    Jailed,
    Bonded,
    Inactive,
    /// Node unreachable; the flags are stale.
    Unknown,
}

impl BondStatus {
    /// Tombstoned wins over jailed, jailed over bonded.
    #[must_use]
    pub fn of(entity: &Entity) -> Self {
        if entity.is_disconnected() {
            Self::Unknown
        } else if entity.tombstoned {
            Self::Tombstoned
        } else if entity.jailed {
            Self::Jailed
        } else if entity.bonded {
            Self::Bonded
        } else {
            Self::Inactive
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tombstoned => "Tombstoned",
            Self::Jailed => "Jailed",
            Self::Bonded => "Bonded",
            Self::Inactive => "Not active",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub const fn is_problem(self) -> bool {
        matches!(self, Self::Tombstoned | Self::Jailed)
    }
}

/// Signed-blocks percentage over the slashing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SigningText {
    /// Empty slashing window.
    NoData,
    Full,
    Percent(f64),
}

impl SigningText {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(missed: u64, window: u64) -> Self {
        if window == 0 {
            Self::NoData
        } else if missed == 0 {
            Self::Full
        } else {
            Self::Percent(100.0 - (missed as f64 / window as f64) * 100.0)
        }
    }
}

impl fmt::Display for SigningText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("error"),
            Self::Full => f.write_str("100%"),
            Self::Percent(p) => write!(f, "{p:.2}%"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHealth {
    pub healthy: u32,
    pub total: u32,
}

impl NodeHealth {
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        self.healthy < self.total
    }
}

impl fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.healthy, self.total)
    }
}

/// Warning marker shown when a chain has open alerts or a last error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertBadge {
    pub active_alerts: u32,
    pub detail: Option<String>,
}

impl AlertBadge {
    #[must_use]
    pub fn of(entity: &Entity) -> Option<Self> {
        let detail = entity.last_error().map(str::to_string);
        (entity.active_alerts > 0 || detail.is_some()).then(|| Self {
            active_alerts: entity.active_alerts,
            detail,
        })
    }
}

/// One summary-table row.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub chain_id: String,
    pub height: u64,
    /// Height differs from the previous projection; drives a brief highlight.
    pub height_changed: bool,
    pub moniker: String,
    pub disconnected: bool,
    pub bond: BondStatus,
    pub signing: SigningText,
    pub missed: u64,
    pub window: u64,
    pub threshold: String,
    pub nodes: NodeHealth,
    pub alert: Option<AlertBadge>,
}

impl SummaryRow {
    pub fn project(entity: &Entity, tracker: &mut ChangeTracker) -> Self {
        let height_changed = tracker.mark_and_check(&entity.chain_id, entity.height);
        let disconnected = entity.is_disconnected();
        let moniker = if disconnected {
            entity.moniker.clone()
        } else {
            entity.moniker.chars().take(MONIKER_MAX_CHARS).collect()
        };
        Self {
            name: entity.name.clone(),
            chain_id: entity.chain_id.clone(),
            height: entity.height,
            height_changed,
            moniker,
            disconnected,
            bond: BondStatus::of(entity),
            signing: SigningText::of(entity.missed, entity.window),
            missed: entity.missed,
            window: entity.window,
            threshold: threshold_text(entity.min_signed_per_window),
            nodes: NodeHealth {
                healthy: entity.healthy_nodes,
                total: entity.nodes,
            },
            alert: AlertBadge::of(entity),
        }
    }

    /// `"<name> (<chain id>)"`.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.chain_id)
    }
}

/// Project every entity in order, updating `tracker` as a side effect.
pub fn project(snapshot: &Snapshot, tracker: &mut ChangeTracker) -> Vec<SummaryRow> {
    snapshot
        .entities
        .iter()
        .map(|e| SummaryRow::project(e, tracker))
        .collect()
}

fn threshold_text(min_signed: f64) -> String {
    let pct = (min_signed * 100.0 * 100.0).round() / 100.0;
    format!("{pct}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        Entity::new("Osmosis", "osmosis-1", 10)
    }

    #[test]
    fn bond_precedence() {
        let mut e = entity();
        assert_eq!(BondStatus::of(&e), BondStatus::Inactive);
        e.bonded = true;
        assert_eq!(BondStatus::of(&e), BondStatus::Bonded);
        e.jailed = true;
        assert_eq!(BondStatus::of(&e), BondStatus::Jailed);
        e.tombstoned = true;
        assert_eq!(BondStatus::of(&e), BondStatus::Tombstoned);
        e.moniker = "not connected".to_string();
        assert_eq!(BondStatus::of(&e), BondStatus::Unknown);
    }

    #[test]
    fn signing_text_cases() {
        assert_eq!(SigningText::of(0, 0).to_string(), "error");
        assert_eq!(SigningText::of(5, 0).to_string(), "error");
        assert_eq!(SigningText::of(0, 100).to_string(), "100%");
        assert_eq!(SigningText::of(3, 10_000).to_string(), "99.97%");
        assert_eq!(SigningText::of(1, 3).to_string(), "66.67%");
    }

    #[test]
    fn threshold_is_a_percentage() {
        assert_eq!(threshold_text(0.05), "5%");
        assert_eq!(threshold_text(0.07), "7%");
        assert_eq!(threshold_text(0.125), "12.5%");
        assert_eq!(threshold_text(0.0), "0%");
    }

    #[test]
    fn alert_badge_rules() {
        let mut e = entity();
        assert!(AlertBadge::of(&e).is_none());
        e.active_alerts = 2;
        assert_eq!(
            AlertBadge::of(&e),
            Some(AlertBadge {
                active_alerts: 2,
                detail: None
            })
        );
        let e = entity().with_last_error("rpc timeout");
        assert_eq!(
            AlertBadge::of(&e).and_then(|b| b.detail),
            Some("rpc timeout".to_string())
        );
    }

    #[test]
    fn moniker_is_truncated_unless_disconnected() {
        let mut tracker = ChangeTracker::new();
        let mut e = entity();
        e.moniker = "x".repeat(40);
        assert_eq!(SummaryRow::project(&e, &mut tracker).moniker.chars().count(), 24);
        e.moniker = "not connected".to_string();
        let row = SummaryRow::project(&e, &mut tracker);
        assert!(row.disconnected);
        assert_eq!(row.moniker, "not connected");
    }

    #[test]
    fn nodes_degraded_when_some_unhealthy() {
        let n = NodeHealth {
            healthy: 1,
            total: 2,
        };
        assert!(n.is_degraded());
        assert_eq!(n.to_string(), "1 / 2");
    }

    #[test]
    fn projection_marks_height_changes() {
        let mut tracker = ChangeTracker::new();
        let snap = Snapshot::new(vec![entity()]);
        assert!(project(&snap, &mut tracker)[0].height_changed);
        assert!(!project(&snap, &mut tracker)[0].height_changed);
        let next = Snapshot::new(vec![Entity::new("Osmosis", "osmosis-1", 11)]);
        let rows = project(&next, &mut tracker);
        assert!(rows[0].height_changed);
        assert_eq!(rows[0].title(), "Osmosis (osmosis-1)");
    }
}
