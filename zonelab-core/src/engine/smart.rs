//! Smart allocation engine — a deterministic fold of `AllocationState::step`
//! over the resampled period sequence.

use tracing::{info, warn};

use crate::data::{resample, validate_series};
use crate::domain::{BacktestResult, PricePoint, ValuePoint};
use crate::engine::config::SmartConfig;
use crate::engine::state::AllocationState;
use crate::error::InputError;

pub const SMART_STRATEGY: &str = "smart";

/// A validated smart-strategy configuration ready to run.
///
/// Holds no state between runs: every call to [`SmartEngine::run`] starts a
/// fresh [`AllocationState`].
#[derive(Debug, Clone)]
pub struct SmartEngine {
    config: SmartConfig,
}

impl SmartEngine {
    pub fn new(config: SmartConfig) -> Result<Self, InputError> {
        config.validate()?;
        let gaps = config.zones.coverage_gaps();
        if !gaps.is_empty() {
            warn!(
                ?gaps,
                "zone table does not cover every deviation; unmatched periods fall back to neutral"
            );
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SmartConfig {
        &self.config
    }

    /// Resample `series` to the configured cadence and run every period.
    pub fn run(&self, series: &[PricePoint]) -> Result<BacktestResult, InputError> {
        validate_series(series)?;
        let periods = resample(series, self.config.cadence);
        Ok(self.run_periods(&periods))
    }

    /// Run over periods that are already validated and resampled.
    pub(crate) fn run_periods(&self, periods: &[PricePoint]) -> BacktestResult {
        let mut state = AllocationState::new(&self.config);
        let mut value_curve = Vec::with_capacity(periods.len());
        let mut trades = Vec::new();

        for point in periods {
            let outcome = state.step(&self.config, point);
            trades.extend(outcome.trades);
            value_curve.push(ValuePoint {
                date: point.date,
                value: outcome.value,
            });
        }

        // Validated input is never empty.
        let (first, last) = (&periods[0], &periods[periods.len() - 1]);
        let final_value = state.portfolio_value(last.close);

        info!(
            periods = periods.len(),
            trades = trades.len(),
            invested = state.total_invested,
            final_value,
            cadence = %self.config.cadence,
            "smart strategy finished"
        );

        BacktestResult {
            strategy: SMART_STRATEGY.to_string(),
            total_invested: state.total_invested,
            final_value,
            start_date: first.date,
            end_date: last.date,
            value_curve,
            trades,
        }
    }
}

/// Validate `config` and run it over `series`.
pub fn run_smart(series: &[PricePoint], config: &SmartConfig) -> Result<BacktestResult, InputError> {
    SmartEngine::new(config.clone())?.run(series)
}
