//! BacktestResult — the contract shared by every strategy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade::Trade;

/// Portfolio value at the close of one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Outcome of one strategy run over one price series.
///
/// Owned by the run that produced it. Metrics and reports only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub total_invested: f64,
    pub final_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub value_curve: Vec<ValuePoint>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    /// Portfolio values in curve order.
    pub fn values(&self) -> Vec<f64> {
        self.value_curve.iter().map(|p| p.value).collect()
    }

    /// Sum of all cash moved into shares, recomputed from the trade log.
    pub fn invested_from_trades(&self) -> f64 {
        self.trades
            .iter()
            .filter(|t| t.kind.is_buy())
            .map(|t| t.amount)
            .sum()
    }
}
