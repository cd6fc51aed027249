// =============================================================================
// Pipeline Errors — fetch / normalise / indicator failures
// =============================================================================
//
// Every failure of a refresh cycle surfaces as one of these variants. None of
// them are retried; the scheduler records them and keeps serving the last
// good snapshot.
// =============================================================================

use thiserror::Error;

/// Errors produced by the fetch → normalise → indicator pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The provider answered, but not with a usable time series (invalid
    /// symbol, rate-limit notice, malformed record).
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Transport-level failure: timeout, connection refused, non-2xx status.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// VWAP requested at an index where no volume has accumulated yet.
    #[error("VWAP undefined at index {index}: cumulative volume is zero")]
    DivisionUndefined { index: usize },

    /// Caller supplied arguments the pipeline cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable code, used in the dashboard error log.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DataUnavailable { .. } => "DATA_UNAVAILABLE",
            Self::NetworkFailure(_) => "NETWORK_FAILURE",
            Self::DivisionUndefined { .. } => "DIVISION_UNDEFINED",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key; never let it reach a message.
        Self::NetworkFailure(err.without_url().to_string())
    }
}
