//! Command-line and environment configuration.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use clap::Parser;
use overlay::consts::RECONNECT_DELAY_MS;
use overlay::viewport::Viewport;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::Uri;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:3000/ws";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid websocket url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid page url `{0}`")]
    InvalidPageUrl(String),
    #[error("invalid viewport `{0}`; expected WIDTHxHEIGHT")]
    InvalidViewport(String),
    #[error("reconnect delay must be positive")]
    ZeroReconnectDelay,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "wheel-overlay", about = "Stream overlay client for the spin wheel")]
pub struct Config {
    /// Controller websocket endpoint.
    #[arg(long, env = "WHEEL_OVERLAY_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Delay between a lost connection and the next attempt.
    #[arg(long, env = "WHEEL_OVERLAY_RECONNECT_MS", default_value_t = default_reconnect_ms())]
    pub reconnect_delay_ms: u64,

    /// Start in configuration mode (drag and resize enabled).
    #[arg(long, env = "WHEEL_OVERLAY_CONFIG_MODE", default_value_t = false)]
    pub config_mode: bool,

    /// Page URL the overlay was loaded from; `config=true` in its query
    /// enables configuration mode.
    #[arg(long)]
    pub page_url: Option<String>,

    /// Overlay surface size in CSS pixels.
    #[arg(long, default_value = "1920x1080", value_parser = parse_viewport)]
    pub viewport: Viewport,

    /// Do not read operator commands from stdin.
    #[arg(long, default_value_t = false)]
    pub no_console: bool,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn default_reconnect_ms() -> u64 {
    RECONNECT_DELAY_MS as u64
}

impl Config {
    /// Check everything clap cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::ZeroReconnectDelay);
        }
        if let Err(e) = self.url.as_str().into_client_request() {
            return Err(ConfigError::InvalidUrl { url: self.url.clone(), reason: e.to_string() });
        }
        if let Some(page) = &self.page_url {
            page_requests_config_mode(page)?;
        }
        Ok(())
    }

    /// Configuration mode at load: the flag, or `config=true` on the page URL.
    #[must_use]
    pub fn initial_config_mode(&self) -> bool {
        self.config_mode
            || self
                .page_url
                .as_deref()
                .is_some_and(|page| matches!(page_requests_config_mode(page), Ok(true)))
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn reconnect_delay(&self) -> f64 {
        self.reconnect_delay_ms as f64
    }
}

/// Whether the page URL's query string carries `config=true`.
pub fn page_requests_config_mode(page_url: &str) -> Result<bool, ConfigError> {
    let uri = page_url.parse::<Uri>().map_err(|_| ConfigError::InvalidPageUrl(page_url.to_owned()))?;
    Ok(uri
        .query()
        .is_some_and(|query| query.split('&').any(|pair| pair == "config=true")))
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_viewport(value: &str) -> Result<Viewport, ConfigError> {
    let invalid = || ConfigError::InvalidViewport(value.to_owned());
    let (w, h) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = w.trim().parse::<f64>().map_err(|_| invalid())?;
    let height = h.trim().parse::<f64>().map_err(|_| invalid())?;
    let viewport = Viewport::new(width, height);
    if viewport.is_valid() { Ok(viewport) } else { Err(invalid()) }
}
