// =============================================================================
// IndicatorEngine — MarketSeries → IndicatorSet
// =============================================================================
//
// Stateless: the engine only remembers which moving-average windows to
// compute. Every call derives a fresh `IndicatorSet`, so recomputing on each
// refresh cycle with the same input yields bit-identical output.
// =============================================================================

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::error::PipelineError;
use crate::indicators::{sma::moving_average, vwap::cumulative_vwap};
use crate::market_data::MarketSeries;

/// Name of a derived series (`MA_10`, `VWAP`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKey {
    MovingAverage(usize),
    Vwap,
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MovingAverage(w) => write!(f, "MA_{w}"),
            Self::Vwap => write!(f, "VWAP"),
        }
    }
}

impl Serialize for IndicatorKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One derived series, aligned with the source `MarketSeries`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub key: IndicatorKey,
    pub values: Vec<Option<f64>>,
}

/// Read-only set of derived series for one `MarketSeries`.
///
/// Moving averages keep the order in which their windows were configured;
/// VWAP comes last. Serialises as a JSON object `name → [value | null]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    series: Vec<IndicatorSeries>,
}

impl IndicatorSet {
    /// Look up a series by its display name, e.g. `"MA_10"` or `"VWAP"`.
    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series
            .iter()
            .find(|s| s.key.to_string() == name)
            .map(|s| s.values.as_slice())
    }

    pub fn get_key(&self, key: IndicatorKey) -> Option<&[Option<f64>]> {
        self.series
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.values.as_slice())
    }

    /// Moving-average series only, in configured order.
    pub fn moving_averages(&self) -> impl Iterator<Item = &IndicatorSeries> {
        self.series
            .iter()
            .filter(|s| matches!(s.key, IndicatorKey::MovingAverage(_)))
    }

    pub fn vwap(&self) -> Option<&[Option<f64>]> {
        self.get_key(IndicatorKey::Vwap)
    }

    pub fn names(&self) -> Vec<String> {
        self.series.iter().map(|s| s.key.to_string()).collect()
    }
}

impl Serialize for IndicatorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for s in &self.series {
            map.serialize_entry(&s.key, &s.values)?;
        }
        map.end()
    }
}

/// Computes moving averages for a fixed set of windows plus cumulative VWAP.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    windows: Vec<usize>,
}

impl IndicatorEngine {
    /// Create an engine for the given moving-average windows.
    ///
    /// Duplicate windows are computed once (first occurrence wins the slot).
    /// A zero window is rejected with `InvalidInput`.
    pub fn new(windows: &[usize]) -> Result<Self, PipelineError> {
        if windows.contains(&0) {
            return Err(PipelineError::InvalidInput(
                "moving-average window must be at least 1".into(),
            ));
        }

        let mut unique = Vec::with_capacity(windows.len());
        for &w in windows {
            if !unique.contains(&w) {
                unique.push(w);
            }
        }

        Ok(Self { windows: unique })
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// Derive every configured indicator from `series`.
    ///
    /// Fails only with `DivisionUndefined` when the series opens with
    /// zero-volume days.
    pub fn compute(&self, series: &MarketSeries) -> Result<IndicatorSet, PipelineError> {
        let closes = series.closes();
        let volumes = series.volumes();

        let mut out = Vec::with_capacity(self.windows.len() + 1);
        for &w in &self.windows {
            out.push(IndicatorSeries {
                key: IndicatorKey::MovingAverage(w),
                values: moving_average(&closes, w),
            });
        }

        let vwap = cumulative_vwap(&closes, &volumes)?;
        out.push(IndicatorSeries {
            key: IndicatorKey::Vwap,
            values: vwap.into_iter().map(Some).collect(),
        });

        debug!(
            symbol = series.symbol(),
            points = series.len(),
            windows = ?self.windows,
            "indicators computed"
        );

        Ok(IndicatorSet {
            series: out,
        })
    }
}
