// =============================================================================
// MarketSeries — normalised, date-ascending daily records for one symbol
// =============================================================================
//
// Providers hand back records in whatever order their payload uses (Alpha
// Vantage returns newest first). `MarketSeries::new` is the single entry point
// that establishes the invariants every consumer relies on:
//
//   - all records carry the series symbol,
//   - dates are strictly increasing (sorted, no duplicates).
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One trading day of price and volume data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub close_price: f64,
    pub volume: f64,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, symbol: impl Into<String>, close_price: f64, volume: f64) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            close_price,
            volume,
        }
    }
}

/// Ordered sequence of [`PriceRecord`]s for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSeries {
    symbol: String,
    records: Vec<PriceRecord>,
}

impl MarketSeries {
    /// Build a series from records in any order.
    ///
    /// Records are sorted ascending by date. A record for another symbol or a
    /// repeated date rejects the whole batch with `DataUnavailable`.
    pub fn new(
        symbol: impl Into<String>,
        mut records: Vec<PriceRecord>,
    ) -> Result<Self, PipelineError> {
        let symbol = symbol.into();

        if let Some(foreign) = records.iter().find(|r| r.symbol != symbol) {
            return Err(PipelineError::data_unavailable(
                &symbol,
                format!("record for foreign symbol '{}'", foreign.symbol),
            ));
        }

        records.sort_by_key(|r| r.date);

        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(PipelineError::data_unavailable(
                &symbol,
                format!("duplicate record for {}", pair[0].date),
            ));
        }

        Ok(Self { symbol, records })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.close_price).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.volume).collect()
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<&PriceRecord> {
        self.records.last()
    }
}
