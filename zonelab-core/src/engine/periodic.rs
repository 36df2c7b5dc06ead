//! Periodic contribution engine and the baseline strategies built on it.
//!
//! Baselines are plain accumulation: no zones, no selling. They share the
//! `BacktestResult` contract with the smart engine so metrics and reports treat
//! every strategy alike.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::data::validate_series;
use crate::domain::{BacktestResult, PricePoint, Trade, TradeKind, ValuePoint};
use crate::error::InputError;

pub const BUY_AND_HOLD_STRATEGY: &str = "buy-and-hold";
pub const WEEKLY_DCA_STRATEGY: &str = "weekly-dca";

/// Decides which sessions receive a contribution.
pub trait ContributionSchedule {
    fn is_contribution_day(&mut self, date: NaiveDate) -> bool;
}

impl<F> ContributionSchedule for F
where
    F: FnMut(NaiveDate) -> bool,
{
    fn is_contribution_day(&mut self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// Every session.
#[derive(Debug, Clone, Copy, Default)]
pub struct EverySession;

impl ContributionSchedule for EverySession {
    fn is_contribution_day(&mut self, _date: NaiveDate) -> bool {
        true
    }
}

/// The first trading session of each ISO week.
///
/// Usually Monday; when Monday is a holiday the week's first open session
/// takes its place.
#[derive(Debug, Clone, Default)]
pub struct FirstSessionOfWeek {
    last_week: Option<(i32, u32)>,
}

impl ContributionSchedule for FirstSessionOfWeek {
    fn is_contribution_day(&mut self, date: NaiveDate) -> bool {
        let week = date.iso_week();
        let key = (week.year(), week.week());
        if self.last_week == Some(key) {
            return false;
        }
        self.last_week = Some(key);
        true
    }
}

/// Buy `amount` on every session `schedule` selects.
///
/// The value curve starts at the first buy. Returns `Ok(None)` when the
/// schedule never selects a session.
pub fn run_periodic(
    strategy: &str,
    series: &[PricePoint],
    amount: f64,
    schedule: &mut impl ContributionSchedule,
) -> Result<Option<BacktestResult>, InputError> {
    validate_series(series)?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(InputError::InvalidParameter {
            name: "contribution amount",
            value: amount,
        });
    }

    let mut shares = 0.0;
    let mut invested = 0.0;
    let mut value_curve = Vec::new();
    let mut trades = Vec::new();

    for point in series {
        if schedule.is_contribution_day(point.date) {
            shares += amount / point.close;
            invested += amount;
            trades.push(Trade {
                kind: TradeKind::DcaBuy,
                date: point.date,
                price: point.close,
                amount,
            });
        }
        if shares > 0.0 {
            value_curve.push(ValuePoint {
                date: point.date,
                value: shares * point.close,
            });
        }
    }

    let Some(first) = value_curve.first() else {
        warn!(strategy, "schedule never selected a session, no result");
        return Ok(None);
    };
    let last = &series[series.len() - 1];

    Ok(Some(BacktestResult {
        strategy: strategy.to_string(),
        total_invested: invested,
        final_value: shares * last.close,
        start_date: first.date,
        end_date: last.date,
        value_curve,
        trades,
    }))
}

/// Per-session amount for the weekly baseline: the budget spread evenly over
/// the calendar weeks the series spans, rounded to cents.
pub fn weekly_contribution(series: &[PricePoint], budget: f64) -> f64 {
    let weeks = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (last.date - first.date).num_days() as f64 / 7.0,
        _ => 0.0,
    };
    (budget / weeks.max(1.0) * 100.0).round() / 100.0
}

/// Weekly contribution on the first session of each week.
pub fn weekly_dca(series: &[PricePoint], budget: f64) -> Result<Option<BacktestResult>, InputError> {
    let amount = weekly_contribution(series, budget);
    run_periodic(
        WEEKLY_DCA_STRATEGY,
        series,
        amount,
        &mut FirstSessionOfWeek::default(),
    )
}

/// All capital at the first close, held to the end.
pub fn buy_and_hold(series: &[PricePoint], capital: f64) -> Result<BacktestResult, InputError> {
    validate_series(series)?;
    if !capital.is_finite() || capital <= 0.0 {
        return Err(InputError::InvalidParameter {
            name: "capital",
            value: capital,
        });
    }
    let (first, last) = (&series[0], &series[series.len() - 1]);
    let shares = capital / first.close;

    Ok(BacktestResult {
        strategy: BUY_AND_HOLD_STRATEGY.to_string(),
        total_invested: capital,
        final_value: shares * last.close,
        start_date: first.date,
        end_date: last.date,
        value_curve: series
            .iter()
            .map(|p| ValuePoint {
                date: p.date,
                value: shares * p.close,
            })
            .collect(),
        trades: vec![Trade {
            kind: TradeKind::BaseOpen,
            date: first.date,
            price: first.close,
            amount: capital,
        }],
    })
}
