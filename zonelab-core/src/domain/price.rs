//! PricePoint — one observation of the instrument on a single session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closing price for one period plus its trailing moving average.
///
/// `moving_average` is absent during the warm-up prefix, before enough history
/// exists. `deviation_pct` is derived from the two and is always present:
/// a missing or zero moving average is read as a neutral 0% deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub moving_average: Option<f64>,
    pub deviation_pct: f64,
}

impl PricePoint {
    /// Build a point, deriving the deviation from close and moving average.
    pub fn new(date: NaiveDate, close: f64, moving_average: Option<f64>) -> Self {
        Self {
            date,
            close,
            moving_average,
            deviation_pct: deviation_pct(close, moving_average),
        }
    }

    /// True once the moving average has warmed up.
    pub fn has_moving_average(&self) -> bool {
        matches!(self.moving_average, Some(ma) if ma != 0.0)
    }
}

/// Percentage gap between `close` and its moving average.
///
/// `(close / ma - 1) * 100`, or `0.0` when the average is absent or zero.
pub fn deviation_pct(close: f64, moving_average: Option<f64>) -> f64 {
    match moving_average {
        Some(ma) if ma != 0.0 => (close / ma - 1.0) * 100.0,
        _ => 0.0,
    }
}
