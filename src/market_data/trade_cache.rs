// =============================================================================
// Trade Cache -- bounded per-symbol recency window of raw trades
// =============================================================================

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::Trade;

/// Trades retained per symbol when no explicit limit is configured.
pub const DEFAULT_CACHE_LIMIT: usize = 50;

/// Per-symbol, capacity-bounded cache of the most recent trades, kept
/// sorted oldest to newest by execution timestamp.
///
/// One reader/writer lock guards the whole cache: pushes hold the exclusive
/// lock for the full batch, reads take the shared lock and hand back a copy.
/// Lock hold time grows with batch size times per-symbol length, which is
/// fine at tens of symbols and a 50-entry limit.
pub struct TradeCache {
    limit: usize,
    trades: RwLock<HashMap<String, Vec<Trade>>>,
}

impl TradeCache {
    /// A `limit` of zero falls back to [`DEFAULT_CACHE_LIMIT`].
    pub fn new(limit: usize) -> Self {
        let limit = if limit == 0 { DEFAULT_CACHE_LIMIT } else { limit };
        Self {
            limit,
            trades: RwLock::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Store a batch of trades, each considered independently.
    ///
    /// A trade that cannot improve recency (the cache is full and the trade
    /// is no newer than the oldest retained entry) is dropped. Otherwise it
    /// is inserted in timestamp order and the oldest entries are trimmed
    /// back to the limit, so the cache always keeps the newest trades it has
    /// ever been shown. Equal timestamps are both retained in call order.
    /// No identifier-level dedup happens here; that is the gateway's job.
    pub fn push_trades(&self, trades: &[Trade]) {
        let mut map = self.trades.write();

        for trade in trades {
            let entry = map
                .entry(trade.symbol.clone())
                .or_insert_with(|| Vec::with_capacity(self.limit));

            if entry.len() == self.limit && trade.timestamp <= entry[0].timestamp {
                // Too old to displace anything.
                continue;
            }

            // First position with a strictly newer timestamp; append if none.
            let pos = entry
                .iter()
                .position(|t| t.timestamp > trade.timestamp)
                .unwrap_or(entry.len());
            entry.insert(pos, trade.clone());

            if entry.len() > self.limit {
                let excess = entry.len() - self.limit;
                entry.drain(..excess);
            }
        }
    }

    /// Cached trades for `symbol`, oldest to newest.
    ///
    /// Always returns an owned copy so callers cannot mutate cache state;
    /// unknown symbols yield an empty vec rather than an error.
    pub fn get_trades(&self, symbol: &str) -> Vec<Trade> {
        let map = self.trades.read();
        map.get(symbol).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(symbol: &str, timestamp: i64) -> Trade {
        Trade {
            trade_id: format!("{symbol}-{timestamp}"),
            symbol: symbol.to_string(),
            timestamp,
            price: 100.0,
            size: 1.0,
        }
    }

    #[test]
    fn zero_limit_falls_back_to_default() {
        let cache = TradeCache::new(0);
        assert_eq!(cache.limit(), DEFAULT_CACHE_LIMIT);
    }

    #[test]
    fn unknown_symbol_returns_empty_vec() {
        let cache = TradeCache::new(10);
        assert!(cache.get_trades("NOPE").is_empty());
    }

    #[test]
    fn trades_come_back_oldest_to_newest() {
        let cache = TradeCache::new(10);
        cache.push_trades(&[trade("BTCUSDT", 30), trade("BTCUSDT", 10), trade("BTCUSDT", 20)]);

        let stored = cache.get_trades("BTCUSDT");
        let timestamps: Vec<i64> = stored.iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![10, 20, 30]);
    }

    #[test]
    fn symbols_are_isolated() {
        let cache = TradeCache::new(10);
        cache.push_trades(&[trade("BTCUSDT", 1), trade("ETHUSDT", 2)]);

        assert_eq!(cache.get_trades("BTCUSDT").len(), 1);
        assert_eq!(cache.get_trades("ETHUSDT").len(), 1);
    }

    #[test]
    fn full_cache_rejects_stale_trade() {
        // Capacity 2: [5, 10] cached. A trade at 1 is older than the oldest
        // entry, so the cache is left unchanged. A trade at 12 evicts 5.
        let cache = TradeCache::new(2);
        cache.push_trades(&[trade("BTCUSDT", 5), trade("BTCUSDT", 10)]);

        cache.push_trades(&[trade("BTCUSDT", 1)]);
        let timestamps: Vec<i64> = cache.get_trades("BTCUSDT").iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![5, 10]);

        cache.push_trades(&[trade("BTCUSDT", 12)]);
        let timestamps: Vec<i64> = cache.get_trades("BTCUSDT").iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![10, 12]);
    }

    #[test]
    fn full_cache_rejects_trade_equal_to_oldest() {
        let cache = TradeCache::new(2);
        cache.push_trades(&[trade("BTCUSDT", 5), trade("BTCUSDT", 10)]);

        cache.push_trades(&[trade("BTCUSDT", 5)]);
        let timestamps: Vec<i64> = cache.get_trades("BTCUSDT").iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![5, 10]);
    }

    #[test]
    fn mid_range_trade_displaces_oldest_when_full() {
        let cache = TradeCache::new(2);
        cache.push_trades(&[trade("BTCUSDT", 5), trade("BTCUSDT", 10)]);

        // 7 is newer than the oldest entry, so it gets inserted and 5 is
        // trimmed from the front.
        cache.push_trades(&[trade("BTCUSDT", 7)]);
        let timestamps: Vec<i64> = cache.get_trades("BTCUSDT").iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![7, 10]);
    }

    #[test]
    fn equal_timestamps_are_both_retained() {
        let cache = TradeCache::new(10);
        let a = Trade {
            trade_id: "a".into(),
            symbol: "BTCUSDT".into(),
            timestamp: 100,
            price: 1.0,
            size: 1.0,
        };
        let b = Trade {
            trade_id: "b".into(),
            symbol: "BTCUSDT".into(),
            timestamp: 100,
            price: 2.0,
            size: 1.0,
        };
        cache.push_trades(&[a, b]);

        let stored = cache.get_trades("BTCUSDT");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].trade_id, "a");
        assert_eq!(stored[1].trade_id, "b");
    }

    #[test]
    fn length_never_exceeds_limit_and_stays_sorted() {
        let cache = TradeCache::new(5);

        // Interleave in-order, reversed and duplicate-timestamp batches.
        cache.push_trades(&(0..8).map(|i| trade("BTCUSDT", i * 10)).collect::<Vec<_>>());
        cache.push_trades(&(0..8).rev().map(|i| trade("BTCUSDT", 5 + i * 10)).collect::<Vec<_>>());
        cache.push_trades(&[trade("BTCUSDT", 75), trade("BTCUSDT", 75)]);

        let stored = cache.get_trades("BTCUSDT");
        assert!(stored.len() <= 5);
        for pair in stored.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn trim_keeps_newest_trades() {
        let cache = TradeCache::new(3);
        cache.push_trades(&(0..10).map(|i| trade("BTCUSDT", i)).collect::<Vec<_>>());

        let timestamps: Vec<i64> = cache.get_trades("BTCUSDT").iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![7, 8, 9]);
    }
}
