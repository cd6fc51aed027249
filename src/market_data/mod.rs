pub mod series;
pub mod source;

// Re-export the core types for convenient access (e.g. `use crate::market_data::MarketSeries`).
pub use series::{MarketSeries, PriceRecord};
pub use source::MarketDataSource;
