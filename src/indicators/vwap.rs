// =============================================================================
// Cumulative Volume-Weighted Average Price (VWAP)
// =============================================================================
//
// VWAP_t = Σ_{j<=t} close_j * volume_j / Σ_{j<=t} volume_j
//
// Cumulative from the first element of the series, not per-day and not
// rolling. The price*volume products are a local running sum and are never
// stored on the series.
//
// Zero cumulative volume (only possible over a leading run of zero-volume
// days, since volumes are non-negative) fails with `DivisionUndefined` naming
// the first such index. NaN inputs propagate to every later value.
// =============================================================================

use crate::error::PipelineError;

/// Compute the cumulative VWAP series for paired `closes` and `volumes`.
///
/// Returns one value per input element; empty input yields an empty vec.
pub fn cumulative_vwap(closes: &[f64], volumes: &[f64]) -> Result<Vec<f64>, PipelineError> {
    if closes.len() != volumes.len() {
        return Err(PipelineError::InvalidInput(format!(
            "closes ({}) and volumes ({}) differ in length",
            closes.len(),
            volumes.len()
        )));
    }

    let mut result = Vec::with_capacity(closes.len());
    let mut cum_price_volume = 0.0;
    let mut cum_volume = 0.0;

    for (index, (&close, &volume)) in closes.iter().zip(volumes).enumerate() {
        cum_price_volume += close * volume;
        cum_volume += volume;

        if cum_volume == 0.0 {
            return Err(PipelineError::DivisionUndefined { index });
        }
        result.push(cum_price_volume / cum_volume);
    }

    Ok(result)
}
