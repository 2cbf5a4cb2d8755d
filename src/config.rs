//! App Configuration
//!
//! Build-time settings embedded from `config/app.json`. Missing fields fall
//! back to their defaults.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{DEFAULT_CACHE_KEY, DEFAULT_TTL};

const EMBEDDED_CONFIG: &str = include_str!("../config/app.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// What the catalog shows when a refresh fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Show the error; expired cache content is not used
    #[default]
    SurfaceError,
    /// Keep showing expired cache content
    ServeStale,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog proxy endpoint; another origin must allow it via CORS
    pub endpoint: String,
    /// Storage key for the cached payload
    pub cache_key: String,
    pub cache_ttl_ms: u64,
    pub fallback: FallbackPolicy,
    /// Must match the panel's CSS transition duration
    pub close_delay_ms: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/games".to_string(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl_ms: DEFAULT_TTL.as_millis() as u64,
            fallback: FallbackPolicy::default(),
            close_delay_ms: leptos_slide_panel::CLOSE_DELAY_MS,
        }
    }
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse { name: "app config", source })
    }

    /// Embedded config, or defaults if it does not parse
    pub fn load() -> Self {
        match Self::from_json(EMBEDDED_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                log::error!("[CONFIG] {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}
