//! Raw observations → validated `PricePoint` series with deviation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::validate::validate_series;
use crate::domain::PricePoint;
use crate::error::InputError;
use crate::indicators::moving_average;

/// Default moving-average window (trading sessions).
pub const DEFAULT_MA_PERIOD: usize = 250;

/// A daily observation as handed over by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrice {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub moving_average: Option<f64>,
}

/// Build the engine's input series from raw observations.
///
/// Supplied moving averages are kept as-is. When no row carries one, the
/// average is computed from the closes over `ma_period` sessions, leaving the
/// first `ma_period - 1` rows without one.
pub fn prepare_series(raw: &[RawPrice], ma_period: usize) -> Result<Vec<PricePoint>, InputError> {
    let supplied = raw.iter().any(|r| r.moving_average.is_some());

    let series: Vec<PricePoint> = if supplied {
        raw.iter()
            .map(|r| PricePoint::new(r.date, r.close, r.moving_average))
            .collect()
    } else {
        let closes: Vec<f64> = raw.iter().map(|r| r.close).collect();
        let averages = moving_average(&closes, ma_period);
        debug!(ma_period, rows = raw.len(), "computed moving average from closes");
        raw.iter()
            .zip(averages)
            .map(|(r, ma)| PricePoint::new(r.date, r.close, ma))
            .collect()
    };

    validate_series(&series)?;
    Ok(series)
}

/// First point whose moving average has warmed up.
pub fn first_with_moving_average(series: &[PricePoint]) -> Option<&PricePoint> {
    series.iter().find(|p| p.has_moving_average())
}
