//! Backward as-of join of disclosures onto a daily date index.

use std::collections::{BTreeMap, HashMap};

use ronda_traits::{Date, FundamentalRecord, SecurityId};

/// Hold the most recent disclosure with `period_end <= date` at every date.
///
/// `dates` and `disclosures` must both be ascending. When several disclosures
/// share a `period_end`, the one appearing last wins. Dates before the first
/// disclosure get `None`; after that the value is carried forward until the
/// next disclosure.
///
/// # Examples
///
/// ```
/// use ronda_factors::value::asof_backward;
/// use ronda_traits::Date;
///
/// let d = |day| Date::from_ymd_opt(2024, 1, day).unwrap();
/// let joined = asof_backward(&[d(1), d(5), d(9)], &[(d(3), 1.0), (d(9), 2.0)]);
/// assert_eq!(joined, vec![None, Some(1.0), Some(2.0)]);
/// ```
pub fn asof_backward(dates: &[Date], disclosures: &[(Date, f64)]) -> Vec<Option<f64>> {
    let mut cursor = 0;
    let mut current = None;

    dates
        .iter()
        .map(|&date| {
            while cursor < disclosures.len() && disclosures[cursor].0 <= date {
                current = Some(disclosures[cursor].1);
                cursor += 1;
            }
            current
        })
        .collect()
}

/// Fundamental disclosures grouped by security and metric, ascending by period end.
#[derive(Debug, Clone, Default)]
pub struct DisclosureIndex {
    by_security: BTreeMap<SecurityId, HashMap<String, Vec<(Date, f64)>>>,
}

impl DisclosureIndex {
    /// Index `records`. Non-finite values are skipped.
    pub fn from_records(records: &[FundamentalRecord]) -> Self {
        let mut by_security: BTreeMap<SecurityId, HashMap<String, Vec<(Date, f64)>>> =
            BTreeMap::new();
        for record in records.iter().filter(|r| r.value.is_finite()) {
            by_security
                .entry(record.security_id)
                .or_default()
                .entry(record.metric.clone())
                .or_default()
                .push((record.period_end, record.value));
        }
        // stable: equal period ends keep input order so the last one wins the join
        for metrics in by_security.values_mut() {
            for points in metrics.values_mut() {
                points.sort_by_key(|(period_end, _)| *period_end);
            }
        }
        Self { by_security }
    }

    /// Disclosures of one metric for one security; empty when there are none.
    pub fn series(&self, security_id: SecurityId, metric: &str) -> &[(Date, f64)] {
        self.by_security
            .get(&security_id)
            .and_then(|m| m.get(metric))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of securities with at least one disclosure.
    pub fn securities(&self) -> usize {
        self.by_security.len()
    }
}
