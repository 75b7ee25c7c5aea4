// =============================================================================
// Candle Builder -- folds a trade stream into OHLC candles for one
// (symbol, interval) pair
// =============================================================================
//
// The builder keeps exactly one open candle plus a map of closed candles
// keyed by close timestamp. Each incoming trade is classified against the
// open candle:
//
//   * same bucket      -> fold into the open candle in place
//   * newer bucket     -> retire the open candle into the closed map and
//                         start a fresh one from this trade
//   * older bucket     -> amend the matching closed candle, or synthesize a
//                         new closed one; the open candle is never touched
//
// Late trades may therefore retroactively move a closed candle's `close`.
// That behavior is deliberate: the caller's input ordering decides which
// trade counts as "most recent" for a bucket.
// =============================================================================

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::types::{Candle, Trade};

/// Builds OHLC candles from a stream of trades for a single bucket width.
///
/// All state sits behind one internal mutex, so a builder instance is safe
/// to share across request handlers. Fold operations never fail; degenerate
/// inputs (zero price/size) are accepted as-is.
pub struct CandleBuilder {
    /// Bucket width in milliseconds. Zero degenerates to identity bucketing:
    /// every trade maps to its own timestamp.
    bucket_ms: i64,
    state: Mutex<BuilderState>,
}

#[derive(Default)]
struct BuilderState {
    current: Option<Candle>,
    /// Candles already superseded by a newer bucket, keyed by close time.
    closed: HashMap<i64, Candle>,
}

impl CandleBuilder {
    pub fn new(bucket_ms: i64) -> Self {
        Self {
            bucket_ms,
            state: Mutex::new(BuilderState::default()),
        }
    }

    pub fn bucket_ms(&self) -> i64 {
        self.bucket_ms
    }

    /// Fold a batch of trades, one at a time, in the order given.
    ///
    /// No internal reordering happens: for late trades amending a closed
    /// candle, the batch order decides the final `close`.
    pub fn process_trades(&self, trades: &[Trade]) {
        let mut state = self.state.lock();
        for trade in trades {
            state.process_trade(self.bucket_ms, trade);
        }
    }

    /// Every candle the builder knows about, closed plus the open one,
    /// sorted ascending by close timestamp. Empty if no trade was ever
    /// processed.
    pub fn get_candles(&self) -> Vec<Candle> {
        let state = self.state.lock();

        let mut candles: Vec<Candle> = state.closed.values().copied().collect();
        if let Some(current) = state.current {
            candles.push(current);
        }

        candles.sort_unstable_by_key(|c| c.timestamp);
        candles
    }
}

impl BuilderState {
    fn process_trade(&mut self, bucket_ms: i64, trade: &Trade) {
        let close_time = bucket_close_time(trade.timestamp, bucket_ms);

        if let Some(current) = self.current.as_mut() {
            if close_time == current.timestamp {
                fold(current, trade);
                return;
            }

            if close_time < current.timestamp {
                // Late trade: it belongs to a bucket that has already closed
                // or was never seen. Never re-opens a bucket as current.
                let candle = self
                    .closed
                    .entry(close_time)
                    .or_insert_with(|| empty_candle(close_time));
                fold(candle, trade);
                return;
            }
        }

        // The trade starts a strictly newer bucket (or nothing is open yet).
        if let Some(prev) = self.current.take() {
            self.closed.insert(prev.timestamp, prev);
        }
        let mut candle = empty_candle(close_time);
        fold(&mut candle, trade);
        self.current = Some(candle);
    }
}

fn empty_candle(timestamp: i64) -> Candle {
    Candle {
        timestamp,
        open: 0.0,
        high: 0.0,
        low: 0.0,
        close: 0.0,
        volume: 0.0,
    }
}

/// Close timestamp of the bucket a trade falls into: truncate to the bucket
/// width, then advance one full width. A trade sitting exactly on a boundary
/// lands in the bucket *starting* there, not the one ending there.
fn bucket_close_time(timestamp: i64, bucket_ms: i64) -> i64 {
    if bucket_ms == 0 {
        // Degenerate width: identity bucketing, no division.
        return timestamp;
    }
    (timestamp / bucket_ms) * bucket_ms + bucket_ms
}

/// Incorporate one trade into a candle's running statistics.
///
/// An empty candle (detected by zero accumulated volume, not a flag) takes
/// all four prices from the trade. Otherwise high/low are updated through
/// mutually exclusive branches and `close` is overwritten unconditionally
/// last: reordered input changes only the min/max envelope, never which
/// trade is "most recent".
fn fold(candle: &mut Candle, trade: &Trade) {
    if candle.volume == 0.0 {
        candle.open = trade.price;
        candle.high = trade.price;
        candle.low = trade.price;
    } else if trade.price > candle.high {
        candle.high = trade.price;
    } else if trade.price < candle.low {
        candle.low = trade.price;
    }

    candle.volume += trade.price * trade.size;
    candle.close = trade.price;
}
