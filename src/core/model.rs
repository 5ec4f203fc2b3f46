//! Wire-facing data model: entities, snapshots, log entries, status codes,
//! and the live-channel message envelope.
//!
//! Everything here is decoded from JSON produced by the dashboard server.
//! Decoding is tolerant where the display can degrade gracefully (unknown
//! status codes, missing scalar fields) and strict where the payload would be
//! meaningless (a snapshot without an entity list).

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::errors::{DashError, Result};

/// Moniker sentinel the server reports for an unreachable node.
pub const NOT_CONNECTED_MONIKER: &str = "not connected";

// ──────────────────── status codes ────────────────────

/// Outcome recorded for one historical block slot.
///
/// The five meaningful values map to the server's integer codes `0..=4`;
/// anything else (negative, out of range, non-integer, null) is [`Self::NoData`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Code 0: the validator's signature is absent from the block.
    Missed,
    /// Code 1: prevote was not included.
    PrevoteMiss,
    /// Code 2: precommit was not included.
    PrecommitMiss,
    /// Code 3: block signed.
    Signed,
    /// Code 4: block proposed by the validator.
    Proposed,
    /// No data for this slot.
    #[default]
    NoData,
}

impl StatusCode {
    /// Every variant, in legend order.
    pub const ALL: [Self; 6] = [
        Self::Proposed,
        Self::Signed,
        Self::PrecommitMiss,
        Self::PrevoteMiss,
        Self::Missed,
        Self::NoData,
    ];

    /// Map a raw server code; unmapped values fall through to `NoData`.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::Missed,
            1 => Self::PrevoteMiss,
            2 => Self::PrecommitMiss,
            3 => Self::Signed,
            4 => Self::Proposed,
            _ => Self::NoData,
        }
    }

    /// Raw server code, `None` for `NoData`.
    #[must_use]
    pub const fn raw(self) -> Option<i64> {
        match self {
            Self::Missed => Some(0),
            Self::PrevoteMiss => Some(1),
            Self::PrecommitMiss => Some(2),
            Self::Signed => Some(3),
            Self::Proposed => Some(4),
            Self::NoData => None,
        }
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StatusCodeVisitor)
    }
}

struct StatusCodeVisitor;

impl<'de> Visitor<'de> for StatusCodeVisitor {
    type Value = StatusCode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a block status code")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<StatusCode, E> {
        Ok(StatusCode::from_raw(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<StatusCode, E> {
        Ok(i64::try_from(v).map_or(StatusCode::NoData, StatusCode::from_raw))
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<StatusCode, E> {
        if v.is_finite() && v.trunc() == v && (0.0..=4.0).contains(&v) {
            Ok(StatusCode::from_raw(v as i64))
        } else {
            Ok(StatusCode::NoData)
        }
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> std::result::Result<StatusCode, E> {
        Ok(StatusCode::NoData)
    }

    fn visit_str<E: de::Error>(self, _v: &str) -> std::result::Result<StatusCode, E> {
        Ok(StatusCode::NoData)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<StatusCode, E> {
        Ok(StatusCode::NoData)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<StatusCode, E> {
        Ok(StatusCode::NoData)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<StatusCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(Self)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<StatusCode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(StatusCode::NoData)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<StatusCode, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(StatusCode::NoData)
    }
}

// ──────────────────── entity ────────────────────

/// One monitored chain/validator row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub name: String,
    /// Stable identity key; unique within a snapshot.
    pub chain_id: String,
    pub moniker: String,
    pub bonded: bool,
    pub jailed: bool,
    pub tombstoned: bool,
    pub missed: u64,
    pub window: u64,
    pub min_signed_per_window: f64,
    pub nodes: u32,
    pub healthy_nodes: u32,
    pub active_alerts: u32,
    pub height: u64,
    last_error: Option<String>,
    /// Recent block outcomes, newest first (drawn leftmost).
    pub blocks: Vec<StatusCode>,
}

impl Entity {
    /// Minimal entity for tests and offline rendering.
    #[must_use]
    pub fn new(name: impl Into<String>, chain_id: impl Into<String>, height: u64) -> Self {
        Self {
            name: name.into(),
            chain_id: chain_id.into(),
            height,
            ..Self::default()
        }
    }

    /// Builder-style block history setter.
    #[must_use]
    pub fn with_blocks(mut self, blocks: impl IntoIterator<Item = StatusCode>) -> Self {
        self.blocks = blocks.into_iter().collect();
        self
    }

    /// Builder-style last-error setter.
    #[must_use]
    pub fn with_last_error(mut self, err: impl Into<String>) -> Self {
        self.last_error = Some(err.into());
        self
    }

    /// Last error reported by the server; the empty string counts as none.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref().filter(|e| !e.is_empty())
    }

    /// Whether the server reported the node as unreachable.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.moniker == NOT_CONNECTED_MONIKER
    }
}

// ──────────────────── snapshot ────────────────────

/// A complete, ordered set of entities. Order is row order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "Status")]
    pub entities: Vec<Entity>,
}

impl Snapshot {
    #[must_use]
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Decode a bootstrap snapshot (`{"Status": [...]}`).
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| DashError::decode("snapshot", e.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Chain identifiers that appear more than once, in first-repeat order.
    #[must_use]
    pub fn duplicate_chain_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for entity in &self.entities {
            let id = entity.chain_id.as_str();
            if !seen.insert(id) && !dupes.contains(&id) {
                dupes.push(id);
            }
        }
        dupes
    }
}

// ──────────────────── log entries ────────────────────

/// One timestamped log line. `ts == 0` marks a blank separator line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Seconds since the Unix epoch.
    pub ts: i64,
    pub msg: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(ts: i64, msg: impl Into<String>) -> Self {
        Self {
            ts,
            msg: msg.into(),
        }
    }

    #[must_use]
    pub const fn is_separator(&self) -> bool {
        self.ts == 0
    }

    /// Display text: `"<time> - <msg>"` in `tz`, or empty for separators.
    #[must_use]
    pub fn display_line<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if self.is_separator() {
            return String::new();
        }
        match DateTime::from_timestamp(self.ts, 0) {
            Some(utc) => format!(
                "{} - {}",
                utc.with_timezone(tz).format("%H:%M:%S"),
                self.msg
            ),
            None => format!("{} - {}", self.ts, self.msg),
        }
    }

    /// Decode the log-history response (newest first, as served).
    pub fn history_from_json(raw: &str) -> Result<Vec<Self>> {
        serde_json::from_str(raw).map_err(|e| DashError::decode("log history", e.to_string()))
    }
}

// ──────────────────── live messages ────────────────────

/// Envelope of one live-channel frame, discriminated by `msgType`.
///
/// An object without `msgType` decodes as [`InboundMessage::Other`]; only
/// malformed JSON or a non-object frame is a decode failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "msgType", rename_all = "lowercase")]
pub enum InboundMessage {
    Log(LogEntry),
    Update(Snapshot),
    /// Any other discriminant; ignored by the dispatcher.
    #[serde(other)]
    Other,
}

impl InboundMessage {
    /// Decode one text frame.
    pub fn from_json(raw: &str) -> Result<Self> {
        let decode = |e: serde_json::Error| DashError::decode("live message", e.to_string());
        let value: serde_json::Value = serde_json::from_str(raw).map_err(decode)?;
        if value.is_object() && value.get("msgType").is_none() {
            return Ok(Self::Other);
        }
        Self::deserialize(value).map_err(decode)
    }
}

/// Response of the log-panel feature-flag endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LogFeatureFlag {
    pub enabled: bool,
}

impl LogFeatureFlag {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| DashError::decode("logs enabled flag", e.to_string()))
    }
}

// ──────────────────── visibility ────────────────────

/// Whether the dashboard is currently on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }
}
