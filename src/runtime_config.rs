// =============================================================================
// Runtime Configuration
// =============================================================================
//
// Loaded once at startup from an optional JSON file, with env-var overrides
// applied on top. Every field carries a serde default so that older config
// files missing new fields still deserialise.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::market_data::DEFAULT_CACHE_LIMIT;
use crate::types::Interval;

fn default_port() -> u16 {
    9001
}

fn default_cache_limit() -> usize {
    DEFAULT_CACHE_LIMIT
}

fn default_intervals() -> Vec<Interval> {
    Interval::ALL.to_vec()
}

/// Top-level configuration for the candela service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Port the HTTP API binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum trades retained per symbol in the recency cache.
    #[serde(default = "default_cache_limit")]
    pub cache_limit: usize,

    /// Candle intervals every ingested symbol is aggregated into.
    #[serde(default = "default_intervals")]
    pub intervals: Vec<Interval>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cache_limit: default_cache_limit(),
            intervals: default_intervals(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist or fails to parse, returns an error so the
    /// caller can fall back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            port = config.port,
            cache_limit = config.cache_limit,
            intervals = ?config.intervals,
            "config loaded"
        );

        Ok(config)
    }

    /// Apply `CANDELA_PORT`, `CANDELA_CACHE_LIMIT` and `CANDELA_INTERVALS`
    /// environment overrides on top of whatever was loaded. Unparseable
    /// values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("CANDELA_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %raw, "ignoring unparseable CANDELA_PORT"),
            }
        }

        if let Ok(raw) = std::env::var("CANDELA_CACHE_LIMIT") {
            match raw.parse::<usize>() {
                Ok(limit) => self.cache_limit = limit,
                Err(_) => warn!(value = %raw, "ignoring unparseable CANDELA_CACHE_LIMIT"),
            }
        }

        if let Ok(raw) = std::env::var("CANDELA_INTERVALS") {
            match parse_intervals(&raw) {
                Some(intervals) => self.intervals = intervals,
                None => warn!(value = %raw, "ignoring unparseable CANDELA_INTERVALS"),
            }
        }
    }
}

/// Parse a comma-separated interval list such as "1m,5m,1h". Returns `None`
/// if any entry is unknown or the list is empty.
fn parse_intervals(raw: &str) -> Option<Vec<Interval>> {
    let intervals: Option<Vec<Interval>> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Interval::parse)
        .collect();

    intervals.filter(|v| !v.is_empty())
}
