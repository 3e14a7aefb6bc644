//! Rebalance calendars.
//!
//! A rebalance date is the last index date of its period. The final period
//! of an index is usually incomplete; its last index date still counts as a
//! rebalance date.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use ronda_traits::{Date, Result, RondaError};
use serde::{Deserialize, Serialize};

/// How often target weights may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceFrequency {
    /// Every date of the index.
    Daily,
    /// Last index date of each ISO week.
    Weekly,
    /// Last index date of each calendar month.
    #[default]
    Monthly,
    /// Last index date of each calendar quarter.
    Quarterly,
}

impl RebalanceFrequency {
    fn period_key(self, date: Date) -> (i32, u32) {
        match self {
            Self::Daily => (date.year(), date.ordinal()),
            Self::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Self::Monthly => (date.year(), date.month()),
            Self::Quarterly => (date.year(), (date.month() - 1) / 3),
        }
    }
}

impl FromStr for RebalanceFrequency {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" | "D" => Ok(Self::Daily),
            "weekly" | "W" => Ok(Self::Weekly),
            "monthly" | "M" => Ok(Self::Monthly),
            "quarterly" | "Q" => Ok(Self::Quarterly),
            other => Err(RondaError::UnknownOption {
                kind: "rebalance frequency",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        })
    }
}

/// Rebalance dates of an ascending daily index: the last index date falling
/// in each period, including the trailing incomplete period.
pub fn rebalance_dates(index: &[Date], frequency: RebalanceFrequency) -> Vec<Date> {
    let mut dates: Vec<Date> = Vec::new();
    let mut current: Option<(i32, u32)> = None;
    for &date in index {
        let key = frequency.period_key(date);
        if current == Some(key) {
            if let Some(last) = dates.last_mut() {
                *last = date;
            }
        } else {
            dates.push(date);
            current = Some(key);
        }
    }
    dates
}
