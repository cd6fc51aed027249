// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = (close_{t-w+1} + ... + close_t) / w
//
// The output is aligned index-for-index with the input: positions where the
// window is not yet full are `None`. Each window is summed from scratch
// rather than with a running add/subtract, so every value is exactly the mean
// of its own `w` closes with no accumulated drift.
//
// NaN policy: a NaN close makes every window that contains it `Some(NaN)`.
// =============================================================================

/// Compute the SMA series for `closes` over a trailing `window`.
///
/// # Edge cases
/// - `window == 0` => all `None` (callers validate windows up front)
/// - `window > closes.len()` => all `None`, no error
/// - empty input => empty vec
pub fn moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; closes.len()];
    }

    let mut result = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i + 1 < window {
            result.push(None);
            continue;
        }
        let slice = &closes[i + 1 - window..=i];
        result.push(Some(slice.iter().sum::<f64>() / window as f64));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_empty_input() {
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn sma_window_two_scenario() {
        let ma = moving_average(&[10.0, 20.0, 30.0], 2);
        assert_eq!(ma, vec![None, Some(15.0), Some(25.0)]);
    }

    #[test]
    fn sma_window_longer_than_series_is_all_none() {
        let ma = moving_average(&[1.0, 2.0, 3.0], 10);
        assert_eq!(ma, vec![None, None, None]);
    }

    #[test]
    fn sma_window_zero_is_all_none() {
        assert_eq!(moving_average(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn sma_window_one_is_identity() {
        let closes = [3.5, 4.25, 1.0];
        let ma = moving_average(&closes, 1);
        assert_eq!(ma, vec![Some(3.5), Some(4.25), Some(1.0)]);
    }

    #[test]
    fn sma_matches_trailing_mean_exactly() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0).collect();
        for w in [1, 5, 10, 30, 50] {
            let ma = moving_average(&closes, w);
            assert_eq!(ma.len(), closes.len());
            for (i, v) in ma.iter().enumerate() {
                if i + 1 < w {
                    assert!(v.is_none(), "w={w} i={i} should be undefined");
                } else {
                    let expected = closes[i + 1 - w..=i].iter().sum::<f64>() / w as f64;
                    assert_eq!(*v, Some(expected), "w={w} i={i}");
                }
            }
        }
    }

    #[test]
    fn sma_propagates_nan_inside_window_only() {
        let closes = [1.0, f64::NAN, 3.0, 4.0, 5.0];
        let ma = moving_average(&closes, 2);
        assert_eq!(ma[0], None);
        assert!(ma[1].unwrap().is_nan());
        assert!(ma[2].unwrap().is_nan());
        assert_eq!(ma[3], Some(3.5));
        assert_eq!(ma[4], Some(4.5));
    }
}
