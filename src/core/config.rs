//! Configuration: TOML file, `VDASH_*` environment overrides, defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::logger::diagnostics::{CHANNEL_CAPACITY, DiagnosticsConfig};
use crate::logger::jsonl::JsonlConfig;
use crate::render::geometry::CellMetrics;

/// Full configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub channel: ChannelConfig,
    pub bootstrap: BootstrapConfig,
    pub render: RenderConfig,
    pub diagnostics: DiagnosticsSection,
    pub paths: PathsConfig,
}

/// Live channel endpoint and timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChannelConfig {
    /// `ws://` or `wss://` URL. Empty derives it from `bootstrap.base_url`.
    pub url: String,
    pub reconnect_delay_ms: u64,
    /// Longest the event loop waits on the socket per tick.
    pub poll_interval_ms: u64,
    /// Bound on the TCP connect and again on the opening handshake.
    pub connect_timeout_ms: u64,
}

/// HTTP endpoints read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub base_url: String,
    pub state_path: String,
    pub logs_path: String,
    pub logs_enabled_path: String,
    pub request_timeout_ms: u64,
}

/// Base cell metrics and optional pixel-ratio pin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub cell_width: f64,
    pub cell_height: f64,
    pub text_gutter: f64,
    pub text_max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_pixel_ratio: Option<f64>,
}

/// Diagnostic JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsSection {
    pub jsonl_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub stderr_echo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_delay_ms: 3000,
            poll_interval_ms: 100,
            connect_timeout_ms: 3000,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8888".to_string(),
            state_path: "state".to_string(),
            logs_path: "logs".to_string(),
            logs_enabled_path: "logsenabled".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        let base = CellMetrics::default();
        Self {
            cell_width: base.cell_width,
            cell_height: base.cell_height,
            text_gutter: base.text_gutter,
            text_max: base.text_max,
            device_pixel_ratio: None,
        }
    }
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            jsonl_path: home_dir()
                .join(".local")
                .join("state")
                .join("vdash")
                .join("diagnostics.jsonl"),
            fallback_path: Some(env::temp_dir().join("vdash-diagnostics.jsonl")),
            max_size_bytes: 8 * 1024 * 1024,
            max_rotated_files: 3,
            stderr_echo: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("vdash").join("config.toml"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[VDASH-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Config {
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load from the default or an explicit path, then apply env overrides
    /// and validate. A missing default file yields defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    /// [`Self::load`] with an injectable environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|e| DashError::io(&path_buf, e))?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(DashError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// FNV-1a over the canonical JSON form; stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    pub fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("VDASH_CHANNEL_URL") {
            self.channel.url = raw;
        }
        if let Some(raw) = lookup("VDASH_CHANNEL_RECONNECT_DELAY_MS") {
            self.channel.reconnect_delay_ms = parse_env("VDASH_CHANNEL_RECONNECT_DELAY_MS", &raw)?;
        }
        if let Some(raw) = lookup("VDASH_CHANNEL_POLL_INTERVAL_MS") {
            self.channel.poll_interval_ms = parse_env("VDASH_CHANNEL_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("VDASH_CHANNEL_CONNECT_TIMEOUT_MS") {
            self.channel.connect_timeout_ms = parse_env("VDASH_CHANNEL_CONNECT_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("VDASH_BOOTSTRAP_BASE_URL") {
            self.bootstrap.base_url = raw;
        }
        if let Some(raw) = lookup("VDASH_BOOTSTRAP_REQUEST_TIMEOUT_MS") {
            self.bootstrap.request_timeout_ms =
                parse_env("VDASH_BOOTSTRAP_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("VDASH_RENDER_DEVICE_PIXEL_RATIO") {
            self.render.device_pixel_ratio = Some(parse_env("VDASH_RENDER_DEVICE_PIXEL_RATIO", &raw)?);
        }
        if let Some(raw) = lookup("VDASH_DIAGNOSTICS_JSONL_PATH") {
            self.diagnostics.jsonl_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("VDASH_DIAGNOSTICS_STDERR") {
            self.diagnostics.stderr_echo = parse_env("VDASH_DIAGNOSTICS_STDERR", &raw)?;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.channel.url = self.channel.url.trim().to_string();
        let base = self.bootstrap.base_url.trim();
        self.bootstrap.base_url = base.strip_suffix('/').unwrap_or(base).to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel.reconnect_delay_ms == 0 {
            return Err(invalid("channel.reconnect_delay_ms must be > 0"));
        }
        if self.channel.poll_interval_ms == 0 {
            return Err(invalid("channel.poll_interval_ms must be > 0"));
        }
        if self.channel.connect_timeout_ms == 0 {
            return Err(invalid("channel.connect_timeout_ms must be > 0"));
        }
        if !self.channel.url.is_empty() && !has_scheme(&self.channel.url, &["ws", "wss"]) {
            return Err(invalid(format!(
                "channel.url must start with ws:// or wss://, got {:?}",
                self.channel.url
            )));
        }
        if !has_scheme(&self.bootstrap.base_url, &["http", "https"]) {
            return Err(invalid(format!(
                "bootstrap.base_url must start with http:// or https://, got {:?}",
                self.bootstrap.base_url
            )));
        }
        if self.bootstrap.request_timeout_ms == 0 {
            return Err(invalid("bootstrap.request_timeout_ms must be > 0"));
        }

        let r = &self.render;
        for (name, value) in [
            ("render.cell_width", r.cell_width),
            ("render.cell_height", r.cell_height),
            ("render.text_gutter", r.text_gutter),
            ("render.text_max", r.text_max),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be a positive number, got {value}")));
            }
        }
        if r.text_max > r.text_gutter {
            return Err(invalid(format!(
                "render.text_max ({}) must not exceed render.text_gutter ({})",
                r.text_max, r.text_gutter
            )));
        }
        if let Some(ratio) = r.device_pixel_ratio
            && !(ratio.is_finite() && ratio > 0.0)
        {
            return Err(invalid(format!(
                "render.device_pixel_ratio must be > 0, got {ratio}"
            )));
        }
        if self.diagnostics.max_size_bytes == 0 {
            return Err(invalid("diagnostics.max_size_bytes must be > 0"));
        }
        Ok(())
    }

    // ──────────────────── derived views ────────────────────

    /// Live channel URL, derived from the base URL when not set:
    /// `http` becomes `ws`, `https` becomes `wss`, and `/ws` is appended.
    pub fn channel_url(&self) -> Result<String> {
        if !self.channel.url.is_empty() {
            return Ok(self.channel.url.clone());
        }
        let base = &self.bootstrap.base_url;
        let derived = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}/ws")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}/ws")
        } else {
            return Err(invalid(format!(
                "cannot derive channel url from bootstrap.base_url {base:?}"
            )));
        };
        Ok(derived)
    }

    /// Absolute URL of one bootstrap endpoint.
    #[must_use]
    pub fn bootstrap_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.bootstrap.base_url,
            endpoint.trim_start_matches('/')
        )
    }

    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.channel.reconnect_delay_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.channel.poll_interval_ms)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.channel.connect_timeout_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap.request_timeout_ms)
    }

    #[must_use]
    pub const fn cell_metrics(&self) -> CellMetrics {
        CellMetrics {
            cell_width: self.render.cell_width,
            cell_height: self.render.cell_height,
            text_gutter: self.render.text_gutter,
            text_max: self.render.text_max,
        }
    }

    #[must_use]
    pub fn diagnostics_config(&self) -> DiagnosticsConfig {
        DiagnosticsConfig {
            jsonl: JsonlConfig {
                path: self.diagnostics.jsonl_path.clone(),
                fallback_path: self.diagnostics.fallback_path.clone(),
                max_size_bytes: self.diagnostics.max_size_bytes,
                max_rotated_files: self.diagnostics.max_rotated_files,
            },
            channel_capacity: CHANNEL_CAPACITY,
            stderr_echo: self.diagnostics.stderr_echo,
        }
    }
}

fn invalid(details: impl Into<String>) -> DashError {
    DashError::InvalidConfig {
        details: details.into(),
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, rest)| schemes.contains(&scheme) && !rest.is_empty())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| DashError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
