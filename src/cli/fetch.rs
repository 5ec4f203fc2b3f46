//! Blocking HTTP fetch of the three bootstrap payloads.

#![allow(missing_docs)]

use reqwest::blocking::Client;

use crate::core::config::Config;
use crate::core::errors::{DashError, Result};
use crate::dashboard::bootstrap::BootstrapPayloads;

/// Fetch the log-panel flag, initial state, and log history. Only a client
/// construction failure is fatal; each request failure lands in its own slot.
pub fn fetch_bootstrap(config: &Config) -> Result<BootstrapPayloads> {
    let client = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| DashError::Transport {
            details: format!("http client: {e}"),
        })?;

    let endpoints = &config.bootstrap;
    Ok(BootstrapPayloads {
        logs_enabled: get_text(&client, &config.bootstrap_url(&endpoints.logs_enabled_path)),
        state: get_text(&client, &config.bootstrap_url(&endpoints.state_path)),
        logs: get_text(&client, &config.bootstrap_url(&endpoints.logs_path)),
    })
}

fn get_text(client: &Client, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::text)
        .map_err(|e| DashError::Transport {
            details: format!("GET {url}: {e}"),
        })
}
