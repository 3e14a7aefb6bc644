//! Per-date cross-sectional scoring.

use std::collections::BTreeMap;

use rayon::prelude::*;
use ronda_traits::stats::{percentile_rank, standardize, winsorize};
use ronda_traits::{Date, FactorFrame, Result, RondaError, ScoredValue, SectorMap, SecurityId};
use tracing::{debug, info, warn};

use crate::config::NormalizeConfig;

/// Percentile rank assigned to every member of a group with fewer than two members.
pub const NEUTRAL_RANK: f64 = 0.5;

/// Z-scores and percentile ranks of one group, aligned with `values`.
fn score_group(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let (z, _) = standardize(values);
    let ranks = if values.len() < 2 {
        vec![NEUTRAL_RANK; values.len()]
    } else {
        percentile_rank(values)
    };
    (z, ranks)
}

/// Scores raw factor values within each date and each date×sector group.
///
/// Members of a date are ordered by ascending security id before any
/// statistic is computed, so percentile-rank ties are broken by security id.
/// Degenerate groups (fewer than two members, or zero spread) get a z-score
/// of zero; groups with fewer than two members also get [`NEUTRAL_RANK`].
#[derive(Debug, Clone)]
pub struct CrossSectionalNormalizer {
    config: NormalizeConfig,
}

impl CrossSectionalNormalizer {
    /// Create a normalizer, validating the configuration.
    pub fn new(config: NormalizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Score every date of `frame`.
    ///
    /// Output is ordered by `(trade_date, security_id)`. Securities missing
    /// from `sectors` keep their market scores and get no sector scores.
    ///
    /// # Errors
    ///
    /// [`RondaError::InsufficientData`] when the frame is empty or no value
    /// survives the log transform.
    pub fn normalize(&self, frame: &FactorFrame, sectors: &SectorMap) -> Result<Vec<ScoredValue>> {
        if frame.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "{}: nothing to normalize",
                frame.name()
            )));
        }

        let mut by_date: BTreeMap<Date, Vec<(SecurityId, f64)>> = BTreeMap::new();
        for row in frame.rows() {
            by_date
                .entry(row.trade_date)
                .or_default()
                .push((row.security_id, row.raw_value));
        }
        let cross_sections: Vec<(Date, Vec<(SecurityId, f64)>)> = by_date.into_iter().collect();

        let score = |(date, members): &(Date, Vec<(SecurityId, f64)>)| {
            self.score_cross_section(*date, members, sectors)
        };
        let scored: Vec<Vec<ScoredValue>> = if self.config.parallel {
            cross_sections.par_iter().map(score).collect()
        } else {
            cross_sections.iter().map(score).collect()
        };
        let scored: Vec<ScoredValue> = scored.into_iter().flatten().collect();

        if scored.is_empty() {
            return Err(RondaError::InsufficientData(format!(
                "{}: no value left after log transform",
                frame.name()
            )));
        }
        info!(
            factor = frame.name(),
            dates = cross_sections.len(),
            rows = scored.len(),
            "normalized factor"
        );
        Ok(scored)
    }

    /// Score one date's cross-section.
    ///
    /// `members` may come in any order and may repeat a security; the first
    /// occurrence of a security wins.
    pub fn score_cross_section(
        &self,
        date: Date,
        members: &[(SecurityId, f64)],
        sectors: &SectorMap,
    ) -> Vec<ScoredValue> {
        let mut members: Vec<(SecurityId, f64)> = members.to_vec();
        members.sort_by_key(|(sid, _)| *sid);
        let before = members.len();
        members.dedup_by_key(|(sid, _)| *sid);
        if members.len() != before {
            warn!(%date, dropped = before - members.len(), "duplicate securities in cross-section");
        }

        if self.config.log_transform {
            members = members
                .into_iter()
                .filter(|(_, v)| *v > 0.0)
                .map(|(sid, v)| (sid, v.ln()))
                .collect();
        }
        members.retain(|(_, v)| v.is_finite());
        if members.is_empty() {
            return Vec::new();
        }

        let mut values: Vec<f64> = members.iter().map(|(_, v)| *v).collect();
        if self.config.winsorize {
            let (lower, upper) = self.config.winsorize_limits;
            winsorize(&mut values, lower, upper);
        }

        let (market_z, market_rank) = score_group(&values);
        let mut sector_z: Vec<Option<f64>> = vec![None; values.len()];
        let mut sector_rank: Vec<Option<f64>> = vec![None; values.len()];

        if self.config.sector_neutral {
            let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            for (i, (sid, _)) in members.iter().enumerate() {
                if let Some(sector) = sectors.get(sid) {
                    groups.entry(sector.as_str()).or_default().push(i);
                }
            }
            debug!(%date, sectors = groups.len(), "sector groups");

            for indices in groups.values() {
                let group_values: Vec<f64> = indices.iter().map(|&i| values[i]).collect();
                let (z, ranks) = score_group(&group_values);
                for (k, &i) in indices.iter().enumerate() {
                    sector_z[i] = Some(z[k]);
                    sector_rank[i] = Some(ranks[k]);
                }
            }
        }

        members
            .iter()
            .enumerate()
            .map(|(i, (sid, _))| ScoredValue {
                security_id: *sid,
                trade_date: date,
                raw_value: values[i],
                market_zscore: market_z[i],
                market_rank_pct: market_rank[i],
                sector_zscore: sector_z[i],
                sector_rank_pct: sector_rank[i],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn plain() -> CrossSectionalNormalizer {
        CrossSectionalNormalizer::new(NormalizeConfig {
            winsorize: false,
            ..NormalizeConfig::default()
        })
        .unwrap()
    }

    fn frame(rows: &[(SecurityId, u32, f64)]) -> FactorFrame {
        let mut frame = FactorFrame::new("test");
        for &(sid, day, value) in rows {
            frame.push(sid, d(day), Some(value));
        }
        frame
    }

    #[test]
    fn test_market_scores_per_date() {
        let frame = frame(&[(1, 1, 1.0), (2, 1, 2.0), (3, 1, 3.0), (1, 2, 5.0), (2, 2, 5.0)]);
        let scored = plain().normalize(&frame, &SectorMap::new()).unwrap();

        assert_eq!(scored.len(), 5);
        let day1: Vec<&ScoredValue> = scored.iter().filter(|s| s.trade_date == d(1)).collect();
        let z = 1.5_f64.sqrt();
        assert_abs_diff_eq!(day1[0].market_zscore, -z, epsilon = 1e-12);
        assert_abs_diff_eq!(day1[1].market_zscore, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(day1[2].market_zscore, z, epsilon = 1e-12);
        assert_eq!(day1[2].market_rank_pct, 1.0);

        // zero spread on day 2: zero z-scores, ties broken by security id
        let day2: Vec<&ScoredValue> = scored.iter().filter(|s| s.trade_date == d(2)).collect();
        assert!(day2.iter().all(|s| s.market_zscore == 0.0));
        assert_eq!(day2[0].market_rank_pct, 0.5);
        assert_eq!(day2[1].market_rank_pct, 1.0);
    }

    #[test]
    fn test_single_member_is_neutral() {
        let scored = plain()
            .normalize(&frame(&[(9, 1, 4.2)]), &SectorMap::new())
            .unwrap();
        assert_eq!(scored[0].market_zscore, 0.0);
        assert_eq!(scored[0].market_rank_pct, NEUTRAL_RANK);
    }

    #[test]
    fn test_ties_broken_by_security_id_not_input_order() {
        let normalizer = plain();
        let a = normalizer.score_cross_section(d(1), &[(2, 1.0), (1, 1.0)], &SectorMap::new());
        let b = normalizer.score_cross_section(d(1), &[(1, 1.0), (2, 1.0)], &SectorMap::new());
        assert_eq!(a, b);
        assert_eq!(a[0].security_id, 1);
        assert_eq!(a[0].market_rank_pct, 0.5);
    }

    #[test]
    fn test_sector_scores_and_unlabelled_members() {
        let sectors: SectorMap = [(1, "Tech".to_string()), (2, "Tech".to_string()), (3, "Energy".to_string())]
            .into_iter()
            .collect();
        let frame = frame(&[(1, 1, 1.0), (2, 1, 3.0), (3, 1, 10.0), (4, 1, 0.0)]);
        let scored = plain().normalize(&frame, &sectors).unwrap();

        assert_abs_diff_eq!(scored[0].sector_zscore.unwrap(), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scored[1].sector_zscore.unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(scored[1].sector_rank_pct, Some(1.0));
        // single-member sector
        assert_eq!(scored[2].sector_zscore, Some(0.0));
        assert_eq!(scored[2].sector_rank_pct, Some(NEUTRAL_RANK));
        // no label: market scores only
        assert_eq!(scored[3].sector_zscore, None);
        assert_eq!(scored[3].sector_rank_pct, None);
        assert_eq!(scored[3].market_rank_pct, 0.25);
    }

    #[test]
    fn test_sector_neutral_disabled() {
        let normalizer = CrossSectionalNormalizer::new(NormalizeConfig {
            sector_neutral: false,
            ..NormalizeConfig::default()
        })
        .unwrap();
        let sectors: SectorMap = [(1, "Tech".to_string())].into_iter().collect();
        let scored = normalizer.normalize(&frame(&[(1, 1, 1.0)]), &sectors).unwrap();
        assert_eq!(scored[0].sector_zscore, None);
    }

    #[test]
    fn test_winsorize_bounds_raw_value() {
        let mut rows: Vec<(SecurityId, u32, f64)> =
            (1..=100).map(|i| (i, 1, i as f64)).collect();
        rows.push((101, 1, 1e9));
        let normalizer = CrossSectionalNormalizer::new(NormalizeConfig::default()).unwrap();
        let scored = normalizer.normalize(&frame(&rows), &SectorMap::new()).unwrap();

        let outlier = scored.iter().find(|s| s.security_id == 101).unwrap();
        assert!(outlier.raw_value < 1e9);
        assert_eq!(outlier.market_rank_pct, 1.0);
    }

    #[test]
    fn test_log_transform_drops_non_positive() {
        let normalizer = CrossSectionalNormalizer::new(NormalizeConfig {
            winsorize: false,
            log_transform: true,
            ..NormalizeConfig::default()
        })
        .unwrap();
        let scored = normalizer
            .normalize(&frame(&[(1, 1, 1.0), (2, 1, -3.0), (3, 1, std::f64::consts::E)]), &SectorMap::new())
            .unwrap();

        assert_eq!(scored.len(), 2);
        assert_abs_diff_eq!(scored[1].raw_value, 1.0, epsilon = 1e-12);

        let err = normalizer
            .normalize(&frame(&[(1, 1, 0.0)]), &SectorMap::new())
            .unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }

    #[test]
    fn test_empty_frame_is_error() {
        let err = plain()
            .normalize(&FactorFrame::new("empty"), &SectorMap::new())
            .unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rows: Vec<(SecurityId, u32, f64)> = (1..=20)
            .flat_map(|sid| (1..=10).map(move |day| (sid, day, (sid * i64::from(day)) as f64 % 7.0)))
            .collect();
        let frame = frame(&rows);
        let sequential = CrossSectionalNormalizer::new(NormalizeConfig {
            parallel: false,
            ..NormalizeConfig::default()
        })
        .unwrap();
        let parallel = CrossSectionalNormalizer::new(NormalizeConfig::default()).unwrap();
        assert_eq!(
            sequential.normalize(&frame, &SectorMap::new()).unwrap(),
            parallel.normalize(&frame, &SectorMap::new()).unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_market_zscores_are_mean_zero(values in prop::collection::vec(-1e3f64..1e3, 2..60)) {
            let members: Vec<(SecurityId, f64)> =
                values.iter().enumerate().map(|(i, v)| (i as SecurityId, *v)).collect();
            let scored = plain().score_cross_section(d(1), &members, &SectorMap::new());

            let sum: f64 = scored.iter().map(|s| s.market_zscore).sum();
            prop_assert!(sum.abs() < 1e-6);
            prop_assert!(scored.iter().all(|s| s.market_rank_pct > 0.0 && s.market_rank_pct <= 1.0));
        }
    }
}
