//! Comparison runner — wires together config, loaded data, strategies and metrics.
//!
//! Every enabled strategy runs in parallel on its own state; the results come
//! back in a fixed order (buy-and-hold, weekly DCA, smart) regardless of which
//! finishes first.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use zonelab_core::data::first_with_moving_average;
use zonelab_core::domain::{BacktestResult, PricePoint};
use zonelab_core::engine::{
    buy_and_hold, run_smart, weekly_contribution, weekly_dca, SmartConfig, BUY_AND_HOLD_STRATEGY,
    SMART_STRATEGY, WEEKLY_DCA_STRATEGY,
};
use zonelab_core::InputError;

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
}

/// The strategies a comparison can include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    BuyAndHold,
    WeeklyDca,
    Smart,
}

impl StrategyKind {
    /// Strategy name recorded on the result.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => BUY_AND_HOLD_STRATEGY,
            StrategyKind::WeeklyDca => WEEKLY_DCA_STRATEGY,
            StrategyKind::Smart => SMART_STRATEGY,
        }
    }

    /// Column title in reports.
    pub fn title(&self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => "Buy & Hold",
            StrategyKind::WeeklyDca => "Weekly DCA",
            StrategyKind::Smart => "Smart",
        }
    }
}

/// One strategy's result plus its metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub kind: StrategyKind,
    pub result: BacktestResult,
    pub metrics: PerformanceMetrics,
}

/// Facts about the input series shown in the report header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub sessions: usize,
    pub first_close: f64,
    /// First session with a warmed-up moving average.
    pub first_ma_date: Option<NaiveDate>,
    pub last_close: f64,
    pub last_deviation_pct: f64,
}

impl DataSummary {
    pub fn from_series(series: &[PricePoint]) -> Result<Self, InputError> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(InputError::EmptySeries);
        };
        Ok(Self {
            first_date: first.date,
            last_date: last.date,
            sessions: series.len(),
            first_close: first.close,
            first_ma_date: first_with_moving_average(series).map(|p| p.date),
            last_close: last.close,
            last_deviation_pct: last.deviation_pct,
        })
    }
}

/// Everything one comparison produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub symbol: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub data: DataSummary,
    /// Per-session amount of the weekly baseline, when it ran.
    pub weekly_dca_amount: Option<f64>,
    /// Engine configuration of the smart run, when it ran.
    pub smart_config: Option<SmartConfig>,
    pub runs: Vec<StrategyRun>,
}

impl Comparison {
    pub fn run(&self, kind: StrategyKind) -> Option<&StrategyRun> {
        self.runs.iter().find(|r| r.kind == kind)
    }
}

/// Run every strategy `config` enables over `data`.
pub fn run_comparison(config: &BacktestConfig, data: &LoadedData) -> Result<Comparison, RunError> {
    config.validate()?;
    let smart_config = if config.smart.enabled {
        Some(config.smart_config()?)
    } else {
        None
    };
    let series = data.series.as_slice();
    let summary = DataSummary::from_series(series)?;

    let mut kinds = Vec::with_capacity(3);
    if config.baselines.buy_and_hold {
        kinds.push(StrategyKind::BuyAndHold);
    }
    if config.baselines.weekly_dca {
        kinds.push(StrategyKind::WeeklyDca);
    }
    if smart_config.is_some() {
        kinds.push(StrategyKind::Smart);
    }

    let results: Vec<Option<BacktestResult>> = kinds
        .par_iter()
        .map(|kind| run_strategy(*kind, config, smart_config.as_ref(), series))
        .collect::<Result<_, InputError>>()?;

    let runs: Vec<StrategyRun> = kinds
        .iter()
        .zip(results)
        .filter_map(|(kind, result)| {
            result.map(|result| StrategyRun {
                kind: *kind,
                metrics: PerformanceMetrics::evaluate(&result),
                result,
            })
        })
        .collect();

    for run in &runs {
        info!(
            strategy = run.kind.name(),
            invested = run.metrics.invested,
            final_value = run.metrics.final_value,
            cagr = run.metrics.cagr,
            max_drawdown = run.metrics.max_drawdown,
            "strategy evaluated"
        );
    }

    Ok(Comparison {
        symbol: data.symbol.clone(),
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        data: summary,
        weekly_dca_amount: config
            .baselines
            .weekly_dca
            .then(|| weekly_contribution(series, config.weekly_dca_budget())),
        smart_config,
        runs,
    })
}

fn run_strategy(
    kind: StrategyKind,
    config: &BacktestConfig,
    smart_config: Option<&SmartConfig>,
    series: &[PricePoint],
) -> Result<Option<BacktestResult>, InputError> {
    match kind {
        StrategyKind::BuyAndHold => buy_and_hold(series, config.capital.total).map(Some),
        StrategyKind::WeeklyDca => weekly_dca(series, config.weekly_dca_budget()),
        StrategyKind::Smart => match smart_config {
            Some(smart) => run_smart(series, smart).map(Some),
            None => Ok(None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::load_synthetic;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn synthetic() -> LoadedData {
        load_synthetic("RUNNER", d(2020, 1, 1), d(2023, 12, 31), 250).unwrap()
    }

    #[test]
    fn runs_come_back_in_fixed_order() {
        let data = synthetic();
        let cmp = run_comparison(&BacktestConfig::default(), &data).unwrap();
        let kinds: Vec<StrategyKind> = cmp.runs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::BuyAndHold,
                StrategyKind::WeeklyDca,
                StrategyKind::Smart
            ]
        );
        for run in &cmp.runs {
            assert_eq!(run.result.strategy, run.kind.name());
        }
        assert!(cmp.has_synthetic);
        assert_eq!(cmp.dataset_hash, data.dataset_hash);
    }

    #[test]
    fn disabled_strategies_are_skipped() {
        let mut config = BacktestConfig::default();
        config.baselines.buy_and_hold = false;
        config.baselines.weekly_dca = false;
        let cmp = run_comparison(&config, &synthetic()).unwrap();
        assert_eq!(cmp.runs.len(), 1);
        assert_eq!(cmp.runs[0].kind, StrategyKind::Smart);
        assert_eq!(cmp.weekly_dca_amount, None);
        assert!(cmp.run(StrategyKind::BuyAndHold).is_none());
    }

    #[test]
    fn disabled_smart_skips_its_configuration() {
        let mut config = BacktestConfig::default();
        config.smart.enabled = false;
        config.smart.wave_ratio = 0.5;
        let cmp = run_comparison(&config, &synthetic()).unwrap();
        assert_eq!(cmp.runs.len(), 2);
        assert!(cmp.run(StrategyKind::Smart).is_none());
        assert_eq!(cmp.smart_config, None);
    }

    #[test]
    fn comparison_is_deterministic() {
        let data = synthetic();
        let a = run_comparison(&BacktestConfig::default(), &data).unwrap();
        let b = run_comparison(&BacktestConfig::default(), &data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut config = BacktestConfig::default();
        config.smart.dca_ratio = 0.7;
        assert!(matches!(
            run_comparison(&config, &synthetic()),
            Err(RunError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn data_summary_reports_warm_up() {
        let data = synthetic();
        let cmp = run_comparison(&BacktestConfig::default(), &data).unwrap();
        assert_eq!(cmp.data.sessions, data.series.len());
        assert_eq!(cmp.data.first_ma_date, Some(data.series[249].date));
        assert_eq!(cmp.data.last_close, data.series[data.series.len() - 1].close);
    }

    #[test]
    fn weekly_amount_matches_budget_spread() {
        let data = synthetic();
        let cmp = run_comparison(&BacktestConfig::default(), &data).unwrap();
        let amount = cmp.weekly_dca_amount.unwrap();
        let dca = cmp.run(StrategyKind::WeeklyDca).unwrap();
        assert!(dca.result.trades.iter().all(|t| t.amount == amount));
        // roughly one buy per calendar week spent
        assert!((dca.metrics.invested - 100_000.0).abs() < 2.0 * amount);
    }
}
