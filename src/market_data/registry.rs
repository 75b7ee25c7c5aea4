// =============================================================================
// Builder Registry -- lazily creates one CandleBuilder per (symbol, interval)
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::market_data::candle_builder::CandleBuilder;
use crate::types::Interval;

/// Composite key identifying a unique candle series.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct BuilderKey {
    pub symbol: String,
    pub interval: Interval,
}

impl std::fmt::Display for BuilderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

/// Owns every live `CandleBuilder`, keyed by (symbol, interval).
///
/// Builders are created on first use. Creation goes through the write lock
/// with an `entry` insert, so concurrent first lookups for the same key
/// cannot construct two builders (and silently lose the trades folded into
/// the discarded one). The registry lives as long as the server that owns it.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: RwLock<HashMap<BuilderKey, Arc<CandleBuilder>>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for (symbol, interval), created on first use.
    pub fn get_or_create(&self, symbol: &str, interval: Interval) -> Arc<CandleBuilder> {
        let key = BuilderKey {
            symbol: symbol.to_string(),
            interval,
        };

        // Fast path: the builder usually already exists.
        if let Some(builder) = self.builders.read().get(&key) {
            return builder.clone();
        }

        self.builders
            .write()
            .entry(key)
            .or_insert_with(|| Arc::new(CandleBuilder::new(interval.duration_ms())))
            .clone()
    }

    /// Lookup without creating, for the read path: querying a pair that
    /// never traded should not allocate a builder.
    pub fn get(&self, symbol: &str, interval: Interval) -> Option<Arc<CandleBuilder>> {
        let key = BuilderKey {
            symbol: symbol.to_string(),
            interval,
        };
        self.builders.read().get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.builders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_before_create_returns_none() {
        let registry = BuilderRegistry::new();
        assert!(registry.get("BTCUSDT", Interval::OneMinute).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn get_or_create_reuses_the_same_builder() {
        let registry = BuilderRegistry::new();
        let first = registry.get_or_create("BTCUSDT", Interval::OneMinute);
        let second = registry.get_or_create("BTCUSDT", Interval::OneMinute);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_intervals_get_distinct_builders() {
        let registry = BuilderRegistry::new();
        let one_min = registry.get_or_create("BTCUSDT", Interval::OneMinute);
        let one_hour = registry.get_or_create("BTCUSDT", Interval::OneHour);

        assert!(!Arc::ptr_eq(&one_min, &one_hour));
        assert_eq!(one_min.bucket_ms(), 60_000);
        assert_eq!(one_hour.bucket_ms(), 3_600_000);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_first_use_creates_exactly_one_builder() {
        let registry = Arc::new(BuilderRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.get_or_create("ETHUSDT", Interval::FiveMinutes))
            })
            .collect();

        let builders: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.len(), 1);
        for builder in &builders[1..] {
            assert!(Arc::ptr_eq(&builders[0], builder));
        }
    }

    #[test]
    fn builder_key_display() {
        let key = BuilderKey {
            symbol: "BTCUSDT".to_string(),
            interval: Interval::FifteenMinutes,
        };
        assert_eq!(key.to_string(), "BTCUSDT@15m");
    }
}
