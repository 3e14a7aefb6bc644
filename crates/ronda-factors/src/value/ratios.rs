//! Valuation ratio definitions.

use std::fmt;
use std::str::FromStr;

use ronda_traits::RondaError;
use serde::{Deserialize, Serialize};

/// `numerator / denominator` when the denominator is positive and finite and
/// the numerator is finite; `None` otherwise.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (numerator.is_finite() && denominator.is_finite() && denominator > 0.0)
        .then(|| numerator / denominator)
}

/// Denominator of a valuation ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denominator {
    /// The daily price field.
    Price,
    /// A fundamental metric, as-of joined like the numerator.
    Metric(&'static str),
}

/// Valuation sub-factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRatio {
    /// Earnings per share over price.
    EarningsYield,
    /// Book equity over market capitalization.
    BookToMarket,
    /// Free cash flow over market capitalization.
    FreeCashFlowYield,
    /// Revenue over market capitalization.
    SalesToPrice,
    /// Operating income over enterprise value.
    OperatingIncomeYield,
}

impl ValueRatio {
    /// Every sub-factor, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::EarningsYield,
        Self::BookToMarket,
        Self::FreeCashFlowYield,
        Self::SalesToPrice,
        Self::OperatingIncomeYield,
    ];

    /// Factor name of the sub-factor.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::EarningsYield => "earnings_yield",
            Self::BookToMarket => "book_to_market",
            Self::FreeCashFlowYield => "free_cash_flow_yield",
            Self::SalesToPrice => "sales_to_price",
            Self::OperatingIncomeYield => "operating_income_yield",
        }
    }

    /// Fundamental metric in the numerator.
    pub const fn numerator(&self) -> &'static str {
        match self {
            Self::EarningsYield => "eps",
            Self::BookToMarket => "total_stockholders_equity",
            Self::FreeCashFlowYield => "free_cash_flow",
            Self::SalesToPrice => "revenue",
            Self::OperatingIncomeYield => "operating_income",
        }
    }

    /// Denominator of the ratio.
    pub const fn denominator(&self) -> Denominator {
        match self {
            Self::EarningsYield => Denominator::Price,
            Self::BookToMarket | Self::FreeCashFlowYield | Self::SalesToPrice => {
                Denominator::Metric("market_capitalization")
            }
            Self::OperatingIncomeYield => Denominator::Metric("enterprise_value"),
        }
    }

    /// Fundamental metrics the ratio reads.
    pub fn metrics(&self) -> Vec<&'static str> {
        match self.denominator() {
            Denominator::Price => vec![self.numerator()],
            Denominator::Metric(m) => vec![self.numerator(), m],
        }
    }

    /// Formula text, e.g. `eps / price`.
    pub fn formula(&self) -> String {
        let denominator = match self.denominator() {
            Denominator::Price => "price",
            Denominator::Metric(m) => m,
        };
        format!("{} / {denominator}", self.numerator())
    }
}

impl fmt::Display for ValueRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueRatio {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| RondaError::UnknownFactor(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(1.0, 4.0), Some(0.25));
        assert_eq!(safe_ratio(-1.0, 4.0), Some(-0.25));
        assert_eq!(safe_ratio(1.0, 0.0), None);
        assert_eq!(safe_ratio(1.0, -2.0), None);
        assert_eq!(safe_ratio(1.0, f64::INFINITY), None);
        assert_eq!(safe_ratio(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_ratio_table() {
        assert_eq!(ValueRatio::EarningsYield.denominator(), Denominator::Price);
        assert_eq!(
            ValueRatio::OperatingIncomeYield.metrics(),
            vec!["operating_income", "enterprise_value"]
        );
        assert_eq!(
            ValueRatio::BookToMarket.formula(),
            "total_stockholders_equity / market_capitalization"
        );
    }

    #[test]
    fn test_parse_round_trips_names() {
        for ratio in ValueRatio::ALL {
            assert_eq!(ratio.name().parse::<ValueRatio>().unwrap(), ratio);
        }
        let err = "dividend_yield".parse::<ValueRatio>().unwrap_err();
        assert!(matches!(err, RondaError::UnknownFactor(_)));
    }
}
