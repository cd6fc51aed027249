// =============================================================================
// MarketDataSource — seam between the refresh cycle and a data vendor
// =============================================================================

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::market_data::MarketSeries;
use crate::types::OutputSize;

/// Anything that can produce a daily [`MarketSeries`] for a symbol.
///
/// Implemented by the Alpha Vantage client; tests substitute canned sources.
/// Object-safe so the scheduler can hold a `dyn MarketDataSource`.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch and normalise daily records for `symbol`.
    ///
    /// Implementations must return either a complete series or an error;
    /// never a partially parsed one.
    async fn fetch_daily(
        &self,
        symbol: &str,
        output_size: OutputSize,
    ) -> Result<MarketSeries, PipelineError>;
}
