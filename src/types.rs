// =============================================================================
// Shared types used across the candela aggregation service
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single executed trade as delivered by the ingest endpoint.
///
/// Trades are immutable once constructed; the core never mutates them and
/// performs no validation of price/size positivity (that is an upstream
/// concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Globally unique identifier per execution. Used only by the gateway
    /// for deduplication.
    pub trade_id: String,
    /// Instrument symbol, e.g. "BTCUSDT".
    pub symbol: String,
    /// Execution time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub price: f64,
    pub size: f64,
}

/// OHLC summary of all trades falling into one aggregation bucket.
///
/// `timestamp` is the bucket's close time in ms epoch and uniquely
/// identifies the bucket for a given symbol and interval. `volume` is
/// cumulative notional: the sum of price * size over every trade folded in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle intervals the gateway exposes. The builder itself works with raw
/// millisecond widths and is agnostic to this enum; it exists so that query
/// parameters and config files deal in "1m"/"5m"/"15m"/"1h" strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl Interval {
    pub const ALL: [Interval; 4] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::OneHour,
    ];

    /// Bucket width in milliseconds.
    pub fn duration_ms(self) -> i64 {
        match self {
            Self::OneMinute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::FifteenMinutes => 900_000,
            Self::OneHour => 3_600_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
        }
    }

    /// Parse an interval string such as "1m". Returns `None` for anything
    /// outside the supported set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::OneMinute),
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "1h" => Some(Self::OneHour),
            _ => None,
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
