//! Period resampling of a daily series.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::PricePoint;

/// How often the smart strategy takes a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Every session in the input.
    Daily,
    /// The last session of each ISO week (Monday–Sunday).
    #[default]
    Weekly,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Daily => f.write_str("daily"),
            Cadence::Weekly => f.write_str("weekly"),
        }
    }
}

/// Resample `series` to `cadence`. Input order is preserved.
pub fn resample(series: &[PricePoint], cadence: Cadence) -> Vec<PricePoint> {
    match cadence {
        Cadence::Daily => series.to_vec(),
        Cadence::Weekly => {
            let mut out: Vec<PricePoint> = Vec::new();
            for point in series {
                let same_week = out
                    .last()
                    .is_some_and(|last| week_key(last) == week_key(point));
                if same_week {
                    if let Some(last) = out.last_mut() {
                        *last = point.clone();
                    }
                } else {
                    out.push(point.clone());
                }
            }
            out
        }
    }
}

fn week_key(point: &PricePoint) -> (i32, u32) {
    let week = point.date.iso_week();
    (week.year(), week.week())
}
