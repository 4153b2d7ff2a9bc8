//! Podforge configuration loaded from `podforge.toml`.
//!
//! [`PodforgeConfig`] carries every configurable parameter. Values missing
//! from the file fall back to sensible defaults. The environment variables
//! `PODFORGE_BASE_URL` and `PODFORGE_USER_ID` take precedence over the file.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from `podforge.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PodforgeConfig {
    /// HTTP base URL of the podcast backend, e.g. `http://localhost:8080`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// WebSocket base URL for the generation progress endpoint.
    /// Derived from `base_url` when not set explicitly.
    #[serde(default)]
    pub ws_url: String,

    /// Opaque user identity supplied by the session layer.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Maximum consecutive connection losses tolerated before the progress
    /// channel is declared degraded.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Base delay in milliseconds for linear reconnect backoff.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_user_id() -> String {
    "dev-user-123".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    3
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

impl Default for PodforgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: String::new(),
            user_id: default_user_id(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
        }
    }
}

impl PodforgeConfig {
    /// Loads configuration from `podforge.toml` in the current directory.
    /// Falls back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("podforge.toml"))
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<PodforgeConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment variables take precedence over the file.
        if let Ok(url) = std::env::var("PODFORGE_BASE_URL")
            && !url.is_empty()
        {
            config.base_url = url;
        }
        if let Ok(user) = std::env::var("PODFORGE_USER_ID")
            && !user.is_empty()
        {
            config.user_id = user;
        }

        if config.ws_url.is_empty() {
            config.ws_url = derive_ws_url(&config.base_url);
        }

        Ok(config)
    }
}

/// Swap the scheme of an HTTP base URL for its WebSocket counterpart.
fn derive_ws_url(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    }
}
