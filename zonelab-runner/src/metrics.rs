//! Performance metrics — pure functions over a strategy result.
//!
//! Percent-valued metrics are expressed in percent (×100), matching how the
//! report prints them.

use serde::{Deserialize, Serialize};
use zonelab_core::domain::BacktestResult;

/// Days per year used for the backtest horizon.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Aggregate metrics for one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub invested: f64,
    pub final_value: f64,
    pub profit: f64,
    /// Total return in percent of invested capital.
    pub return_pct: f64,
    /// Annualized return in percent.
    pub cagr: f64,
    /// Worst peak-to-trough decline of the value curve in percent, <= 0.
    pub max_drawdown: f64,
    pub years: f64,
}

impl PerformanceMetrics {
    pub fn evaluate(result: &BacktestResult) -> Self {
        let invested = result.total_invested;
        let final_value = result.final_value;
        let years = years_between(result.start_date, result.end_date);
        let values = result.values();

        Self {
            invested,
            final_value,
            profit: final_value - invested,
            return_pct: return_pct(invested, final_value),
            cagr: cagr(invested, final_value, years),
            max_drawdown: max_drawdown(&values),
            years,
        }
    }

    /// Average cost per share implied by the result, given the last close:
    /// invested ÷ (final ÷ last_close). `None` when no shares are held.
    pub fn average_cost(&self, last_close: f64) -> Option<f64> {
        if last_close <= 0.0 || self.final_value <= 0.0 {
            return None;
        }
        let shares = self.final_value / last_close;
        Some(self.invested / shares)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Horizon in years: calendar days ÷ 365.25.
pub fn years_between(start: chrono::NaiveDate, end: chrono::NaiveDate) -> f64 {
    (end - start).num_days() as f64 / DAYS_PER_YEAR
}

/// (final − invested) ÷ invested in percent; 0 when nothing was invested.
pub fn return_pct(invested: f64, final_value: f64) -> f64 {
    if invested <= 0.0 {
        return 0.0;
    }
    (final_value - invested) / invested * 100.0
}

/// Compound annual growth rate in percent.
///
/// Zero for a zero-length window or when nothing was invested.
pub fn cagr(invested: f64, final_value: f64, years: f64) -> f64 {
    if years <= 0.0 || invested <= 0.0 || final_value < 0.0 {
        return 0.0;
    }
    ((final_value / invested).powf(1.0 / years) - 1.0) * 100.0
}

/// Maximum drawdown in percent (e.g. -15.0 = 15% decline from the running peak).
///
/// Returns 0.0 for an empty, constant or monotonically increasing curve.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak * 100.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
