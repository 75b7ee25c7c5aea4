pub mod candle_builder;
pub mod registry;
pub mod trade_cache;

// Re-exports for convenient access (e.g. `use crate::market_data::TradeCache`).
pub use candle_builder::CandleBuilder;
pub use registry::{BuilderKey, BuilderRegistry};
pub use trade_cache::{TradeCache, DEFAULT_CACHE_LIMIT};
