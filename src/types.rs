// =============================================================================
// Shared types used across the dashboard backend
// =============================================================================

use serde::{Deserialize, Serialize};

/// How much history the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// The most recent ~100 data points.
    #[default]
    Compact,
    /// The entire available history.
    Full,
}

impl OutputSize {
    /// Value of the provider's `outputsize` query parameter.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

/// Time-series granularity requested from the provider. Only daily-adjusted
/// bars are consumed today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    #[default]
    DailyAdjusted,
}

impl Granularity {
    /// Provider `function` parameter.
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
        }
    }

    /// Top-level key under which the provider nests the date → record map.
    pub fn series_key(&self) -> &'static str {
        match self {
            Self::DailyAdjusted => "Time Series (Daily)",
        }
    }
}
