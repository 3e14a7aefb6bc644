//! Momentum ratio over one security's price path.

use crate::value::safe_ratio;

/// Momentum at every position of an ascending price path.
///
/// Position `t` holds `prices[t - skip] / prices[t - skip - lookback] - 1`
/// when `t >= lookback + skip` and the base price is positive and finite.
/// Every other position is `None`.
///
/// # Examples
///
/// ```
/// use ronda_factors::momentum::momentum_series;
///
/// let m = momentum_series(&[100.0, 110.0, 121.0], 1, 0);
/// assert_eq!(m[0], None);
/// assert!((m[2].unwrap() - 0.1).abs() < 1e-12);
/// ```
pub fn momentum_series(prices: &[f64], lookback: usize, skip: usize) -> Vec<Option<f64>> {
    let warmup = lookback + skip;
    (0..prices.len())
        .map(|t| {
            if t < warmup {
                return None;
            }
            let end = prices[t - skip];
            let start = prices[t - warmup];
            safe_ratio(end, start).map(|r| r - 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_three_security_scenario() {
        let a = momentum_series(&[100.0, 110.0, 121.0], 1, 0);
        let b = momentum_series(&[100.0, 95.0, 90.25], 1, 0);
        let c = momentum_series(&[100.0, 100.0, 100.0], 1, 0);

        assert_abs_diff_eq!(a[2].unwrap(), 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(b[2].unwrap(), -0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(c[2].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_skip_uses_lagged_end_price() {
        let prices = [10.0, 20.0, 40.0, 80.0];
        let m = momentum_series(&prices, 2, 1);
        assert_eq!(&m[..3], &[None, None, None]);
        // prices[2] / prices[0] - 1
        assert_abs_diff_eq!(m[3].unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_base_is_undefined() {
        let m = momentum_series(&[0.0, 5.0, -1.0, 2.0], 1, 0);
        assert_eq!(m[1], None);
        assert_abs_diff_eq!(m[2].unwrap(), -1.2, epsilon = 1e-12);
        assert_eq!(m[3], None);
    }

    #[test]
    fn test_short_series_is_all_undefined() {
        assert!(momentum_series(&[1.0, 2.0], 5, 1).iter().all(Option::is_none));
        assert!(momentum_series(&[], 1, 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_no_value_before_warmup(
            prices in prop::collection::vec(1.0f64..500.0, 0..80),
            lookback in 1usize..10,
            skip in 0usize..5,
        ) {
            let m = momentum_series(&prices, lookback, skip);
            prop_assert_eq!(m.len(), prices.len());
            for (t, value) in m.iter().enumerate() {
                if t < lookback + skip {
                    prop_assert!(value.is_none());
                } else {
                    let expected = prices[t - skip] / prices[t - skip - lookback] - 1.0;
                    prop_assert_eq!(*value, Some(expected));
                }
            }
        }

        #[test]
        fn prop_future_prices_do_not_change_history(
            prices in prop::collection::vec(1.0f64..500.0, 2..60),
            extra in prop::collection::vec(1.0f64..500.0, 1..20),
        ) {
            let base = momentum_series(&prices, 1, 1);
            let mut extended = prices.clone();
            extended.extend(extra);
            let longer = momentum_series(&extended, 1, 1);
            prop_assert_eq!(&longer[..base.len()], &base[..]);
        }
    }
}
