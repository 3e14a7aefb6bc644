//! A single valuation ratio as its own factor.

use ronda_traits::{
    Factor, FactorCategory, FactorDefinition, FactorFrame, HistoryAccess, Result, RondaError,
};

use super::panel::{ValueConfig, ratio_panel};
use super::ratios::ValueRatio;

/// One valuation ratio computed on every price date of every security.
///
/// The fundamental used on a date is the latest disclosure with
/// `period_end <= date`, held until the next disclosure.
#[derive(Debug, Clone)]
pub struct ValueRatioFactor {
    ratio: ValueRatio,
    config: ValueConfig,
}

impl ValueRatioFactor {
    /// Create the factor for `ratio`.
    pub const fn new(ratio: ValueRatio, config: ValueConfig) -> Self {
        Self { ratio, config }
    }

    /// The ratio computed.
    pub const fn ratio(&self) -> ValueRatio {
        self.ratio
    }
}

impl Factor for ValueRatioFactor {
    fn name(&self) -> &str {
        self.ratio.name()
    }

    fn definition(&self) -> FactorDefinition {
        FactorDefinition::new(self.ratio.name(), FactorCategory::Value)
            .with_parameter("metric", self.ratio.name())
            .with_description(format!("Value single-factor: {}", self.ratio))
            .with_formula(self.ratio.formula())
            .with_source("fundamentals + prices")
            .with_tags(&["value", "single"])
    }

    fn compute(&self, history: &dyn HistoryAccess) -> Result<FactorFrame> {
        let panel = ratio_panel(history, &[self.ratio], &self.config)?;

        let mut frame = FactorFrame::new(self.ratio.name());
        for security in &panel {
            frame.extend_series(security.security_id, &security.dates, &security.values[0]);
        }

        if frame.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "{}: every value is undefined",
                self.ratio
            )));
        }
        Ok(frame)
    }

    fn lookback(&self) -> usize {
        0
    }
}
