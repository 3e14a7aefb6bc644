//! Equal-weighted score combination.

use ndarray::Array1;
use ronda_traits::Result;
use ronda_traits::stats::{nan_mean, standardize};
use serde::{Deserialize, Serialize};

use crate::combiner::{Combiner, ComponentScores, aligned_len};

/// Configuration for equal-weighted combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualWeightConfig {
    /// Z-score each component across the cross-section before averaging.
    pub standardize_inputs: bool,
}

impl EqualWeightConfig {
    /// Mean of per-component z-scores, the value composite recipe.
    pub const fn zscore_mean() -> Self {
        Self {
            standardize_inputs: true,
        }
    }
}

/// Equal-weighted combiner.
///
/// Each security's composite is the arithmetic mean of its available
/// component scores. A security with no available component gets `NaN`.
/// Standardization uses the population standard deviation and maps a
/// degenerate cross-section to zero.
///
/// # Examples
///
/// ```rust
/// use ronda_combine::{EqualWeightCombiner, EqualWeightConfig, Combiner, ComponentScores};
/// use ndarray::Array1;
///
/// let combiner = EqualWeightCombiner::new(EqualWeightConfig::zscore_mean());
///
/// let components = vec![
///     ComponentScores::new("a", Array1::from_vec(vec![1.0, 2.0, 3.0])),
///     ComponentScores::new("b", Array1::from_vec(vec![10.0, 20.0, 30.0])),
/// ];
///
/// let composite = combiner.combine(&components).unwrap();
/// assert!(composite.sum().abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EqualWeightCombiner {
    config: EqualWeightConfig,
}

impl EqualWeightCombiner {
    /// Create a new equal-weight combiner with the given configuration.
    pub const fn new(config: EqualWeightConfig) -> Self {
        Self { config }
    }

    fn prepared(&self, component: &ComponentScores) -> Vec<f64> {
        let values = component.scores.to_vec();
        if self.config.standardize_inputs {
            standardize(&values).0
        } else {
            values
        }
    }
}

impl Combiner for EqualWeightCombiner {
    fn combine(&self, components: &[ComponentScores]) -> Result<Array1<f64>> {
        let n = aligned_len(components)?;
        let prepared: Vec<Vec<f64>> = components.iter().map(|c| self.prepared(c)).collect();

        let mut row = Vec::with_capacity(prepared.len());
        let composite = (0..n)
            .map(|i| {
                row.clear();
                row.extend(prepared.iter().map(|p| p[i]));
                nan_mean(&row).unwrap_or(f64::NAN)
            })
            .collect();
        Ok(composite)
    }

    fn name(&self) -> &str {
        "equal_weight"
    }
}
