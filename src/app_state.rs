// =============================================================================
// Central Application State
// =============================================================================
//
// The single source of truth for the service. Request handlers share one
// `Arc<AppState>`; every collection inside carries its own lock per the
// ownership rules: one RwLock for the trade cache, one mutex per candle
// builder, one RwLock for registry creation, one mutex for the gateway's
// seen-trade-ID set.
// =============================================================================

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::market_data::{BuilderRegistry, TradeCache};
use crate::runtime_config::RuntimeConfig;
use crate::types::Trade;

/// Application state shared across all request handlers via `Arc<AppState>`.
pub struct AppState {
    /// Configuration is fixed at startup; no hot reload.
    pub config: RuntimeConfig,

    /// Bounded per-symbol recency cache of raw trades.
    pub trade_cache: TradeCache,

    /// Candle builders, one per (symbol, interval), created lazily.
    pub builders: BuilderRegistry,

    /// Trade IDs accepted over the process lifetime. The gateway dedups
    /// against this set before anything reaches the cache or the builders;
    /// the core itself performs no identifier-level dedup.
    seen_trade_ids: Mutex<HashSet<String>>,

    /// Monotonically increasing counter bumped on every accepted ingest.
    pub state_version: AtomicU64,

    /// Startup instant, for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        let trade_cache = TradeCache::new(config.cache_limit);

        Self {
            config,
            trade_cache,
            builders: BuilderRegistry::new(),
            seen_trade_ids: Mutex::new(HashSet::new()),
            state_version: AtomicU64::new(1),
            start_time: std::time::Instant::now(),
        }
    }

    /// Drop every trade whose ID has been seen before, recording the rest.
    /// Order is preserved. Duplicates within the batch also collapse to
    /// their first occurrence.
    pub fn dedup_trades(&self, trades: Vec<Trade>) -> Vec<Trade> {
        let mut seen = self.seen_trade_ids.lock();
        trades
            .into_iter()
            .filter(|t| seen.insert(t.trade_id.clone()))
            .collect()
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
