//! Cross-sectional statistics shared by factor math and the normalizer.
//!
//! All functions treat non-finite inputs as absent: they are excluded from
//! the statistics and come back as `NaN` at the same position.

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values at or below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeResult {
    /// Mean of the finite input values.
    pub mean: f64,
    /// Population standard deviation (N denominator) of the finite input values.
    pub std: f64,
    /// Number of finite values used.
    pub count: usize,
    /// Whether scaling was applied (false for degenerate cross-sections).
    pub applied: bool,
}

/// Standardize values to z-scores using the population standard deviation.
///
/// When fewer than two finite values exist, or the standard deviation is at
/// or below [`MIN_STD_THRESHOLD`], every finite position becomes `0.0` so a
/// degenerate cross-section never produces `NaN` scores.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::standardize;
///
/// let (z, result) = standardize(&[1.0, 2.0, 3.0]);
/// assert!(result.applied);
/// assert!((z.iter().sum::<f64>()).abs() < 1e-12);
/// ```
pub fn standardize(values: &[f64]) -> (Vec<f64>, StandardizeResult) {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let count = finite.len();

    if count == 0 {
        return (
            vec![f64::NAN; values.len()],
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                count,
                applied: false,
            },
        );
    }

    let mean = finite.iter().sum::<f64>() / count as f64;
    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
    let std = variance.sqrt();
    let applied = count >= 2 && std > MIN_STD_THRESHOLD;

    let standardized = values
        .iter()
        .map(|&x| match (x.is_finite(), applied) {
            (false, _) => f64::NAN,
            (true, true) => (x - mean) / std,
            (true, false) => 0.0,
        })
        .collect();

    (
        standardized,
        StandardizeResult {
            mean,
            std,
            count,
            applied,
        },
    )
}

/// Linear-interpolation quantile of an ascending, finite slice.
///
/// Returns `None` for an empty slice. `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Clip finite values to the `[lower, 1 - upper]` quantile band of the slice.
///
/// `lower` and `upper` are tail fractions, e.g. `0.01` each for 1%/99%.
pub fn winsorize(values: &mut [f64], lower: f64, upper: f64) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.len() < 2 {
        return;
    }
    sorted.sort_by(f64::total_cmp);

    let (Some(lo), Some(hi)) = (
        quantile_sorted(&sorted, lower),
        quantile_sorted(&sorted, 1.0 - upper),
    ) else {
        return;
    };

    for v in values.iter_mut().filter(|v| v.is_finite()) {
        *v = v.clamp(lo, hi);
    }
}

/// Fractional rank of each finite value, in `(0, 1]`.
///
/// Equal values are ranked in order of appearance, so the result depends only
/// on the input order and never on chance. Non-finite positions are `NaN`.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::percentile_rank;
///
/// let ranks = percentile_rank(&[3.0, 1.0, 3.0, 2.0]);
/// assert_eq!(ranks, vec![0.75, 0.25, 1.0, 0.5]);
/// ```
pub fn percentile_rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();
    // stable sort keeps first-seen order among ties
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let n = order.len() as f64;
    let mut ranks = vec![f64::NAN; values.len()];
    for (pos, &idx) in order.iter().enumerate() {
        ranks[idx] = (pos + 1) as f64 / n;
    }
    ranks
}

/// Mean of the finite values, `None` when there are none.
pub fn nan_mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_standardize_basic() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let (standardized, result) = standardize(&values);

        assert!(result.applied);
        assert_abs_diff_eq!(result.mean, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.std, 2.0_f64.sqrt(), epsilon = 1e-12);

        let std_mean: f64 = standardized.iter().sum::<f64>() / standardized.len() as f64;
        assert_abs_diff_eq!(std_mean, 0.0, epsilon = 1e-12);

        // population variance of z-scores is exactly one
        let var = standardized.iter().map(|x| x.powi(2)).sum::<f64>() / standardized.len() as f64;
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standardize_empty() {
        let (standardized, result) = standardize(&[]);
        assert!(standardized.is_empty());
        assert!(!result.applied);
        assert!(result.mean.is_nan());
    }

    #[test]
    fn test_standardize_single_value_is_zero() {
        let (standardized, result) = standardize(&[42.0]);
        assert!(!result.applied);
        assert_eq!(standardized, vec![0.0]);
    }

    #[test]
    fn test_standardize_constant_values() {
        let (standardized, result) = standardize(&[5.0, 5.0, 5.0]);
        assert!(!result.applied);
        assert!(standardized.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_standardize_keeps_nan_positions() {
        let (standardized, result) = standardize(&[1.0, f64::NAN, 3.0]);
        assert!(result.applied);
        assert_eq!(result.count, 2);
        assert!(standardized[1].is_nan());
        assert_abs_diff_eq!(standardized[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(standardized[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_keeps_nan_positions() {
        let (standardized, _) = standardize(&[2.0, f64::NAN]);
        assert_eq!(standardized[0], 0.0);
        assert!(standardized[1].is_nan());
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.5).unwrap(), 3.0);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.1).unwrap(), 1.4, epsilon = 1e-12);
        assert!(quantile_sorted(&[], 0.5).is_none());
    }

    #[test]
    fn test_winsorize_clips_tails() {
        let mut values: Vec<f64> = (1..=101).map(f64::from).collect();
        values[100] = 10_000.0;
        winsorize(&mut values, 0.01, 0.01);

        assert_abs_diff_eq!(values[0], 2.0, epsilon = 1e-9);
        assert!(values[100] < 10_000.0);
        assert!(values[50] == 51.0);
    }

    #[test]
    fn test_winsorize_ignores_nan_and_small_inputs() {
        let mut single = vec![3.0];
        winsorize(&mut single, 0.2, 0.2);
        assert_eq!(single, vec![3.0]);

        let mut with_nan = vec![1.0, f64::NAN, 100.0, 2.0, 3.0];
        winsorize(&mut with_nan, 0.25, 0.25);
        assert!(with_nan[1].is_nan());
        assert!(with_nan[2] < 100.0);
    }

    #[test]
    fn test_percentile_rank_first_tie_break() {
        let ranks = percentile_rank(&[2.0, 2.0, 1.0]);
        assert_eq!(ranks, vec![2.0 / 3.0, 1.0, 1.0 / 3.0]);
    }

    #[test]
    fn test_percentile_rank_skips_nan() {
        let ranks = percentile_rank(&[f64::NAN, 5.0, 1.0]);
        assert!(ranks[0].is_nan());
        assert_eq!(ranks[1], 1.0);
        assert_eq!(ranks[2], 0.5);
    }

    #[test]
    fn test_nan_mean() {
        assert_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(nan_mean(&[f64::NAN]), None);
    }

    proptest! {
        #[test]
        fn prop_zscores_are_mean_zero(values in prop::collection::vec(-1e6f64..1e6, 2..200)) {
            let (z, result) = standardize(&values);
            if result.applied {
                let sum: f64 = z.iter().sum();
                prop_assert!(sum.abs() < 1e-6 * values.len() as f64);
            } else {
                prop_assert!(z.iter().all(|&x| x == 0.0));
            }
        }

        #[test]
        fn prop_ranks_are_a_permutation(values in prop::collection::vec(-100.0f64..100.0, 1..100)) {
            let ranks = percentile_rank(&values);
            let n = values.len() as f64;
            let mut scaled: Vec<i64> = ranks.iter().map(|r| (r * n).round() as i64).collect();
            scaled.sort_unstable();
            let expected: Vec<i64> = (1..=values.len() as i64).collect();
            prop_assert_eq!(scaled, expected);
        }
    }
}
