// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions plus the `IndicatorEngine` that
// applies them to a `MarketSeries`. Output series are aligned index-for-index
// with their input; `None` marks positions where an indicator is undefined.

pub mod engine;
pub mod sma;
pub mod vwap;

pub use engine::{IndicatorEngine, IndicatorSet};
