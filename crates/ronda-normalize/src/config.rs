//! Normalizer configuration.

use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

/// Configuration for cross-sectional normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Clip each date's cross-section to the quantile band before scoring.
    pub winsorize: bool,

    /// Lower and upper tail fractions clipped by winsorization (default: 1%/1%).
    pub winsorize_limits: (f64, f64),

    /// Compute sector-relative z-scores and ranks.
    pub sector_neutral: bool,

    /// Replace positive values by their natural log; non-positive values become absent.
    pub log_transform: bool,

    /// Score dates on the rayon pool.
    pub parallel: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            winsorize: true,
            winsorize_limits: (0.01, 0.01),
            sector_neutral: true,
            log_transform: false,
            parallel: true,
        }
    }
}

impl NormalizeConfig {
    /// Check the winsorization limits.
    ///
    /// # Errors
    ///
    /// [`RondaError::InvalidParameter`] naming `winsorize_limits` when either
    /// tail is outside `[0, 0.5)` or not finite.
    pub fn validate(&self) -> Result<()> {
        let (lower, upper) = self.winsorize_limits;
        let valid = |x: f64| x.is_finite() && (0.0..0.5).contains(&x);
        if !valid(lower) || !valid(upper) {
            return Err(RondaError::invalid_parameter(
                "winsorize_limits",
                format!("tails must lie in [0, 0.5), got ({lower}, {upper})"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NormalizeConfig::default();
        assert!(config.winsorize);
        assert!(config.sector_neutral);
        assert!(!config.log_transform);
        assert_eq!(config.winsorize_limits, (0.01, 0.01));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        for limits in [(-0.1, 0.01), (0.01, 0.5), (f64::NAN, 0.0)] {
            let config = NormalizeConfig {
                winsorize_limits: limits,
                ..NormalizeConfig::default()
            };
            assert!(matches!(
                config.validate().unwrap_err(),
                RondaError::InvalidParameter { ref name, .. } if name == "winsorize_limits"
            ));
        }
    }
}
