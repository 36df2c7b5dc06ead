//! Integration tests for the smart allocation engine.
//!
//! Tests:
//! 1. Flat market with MA warm-up: pure contribution behaviour, no wave activity
//! 2. Wave open on zone entry with a large wave pool
//! 3. Wave scale-in on a drop from the last entry price
//! 4. Forced full unwind on entry into an overvalued zone
//! 5. Scale-in limits, exit ladder, determinism, invested accounting

use chrono::NaiveDate;
use zonelab_core::data::{prepare_series, Cadence, RawPrice};
use zonelab_core::domain::{PricePoint, TradeKind};
use zonelab_core::engine::{run_smart, AllocationState, SmartConfig, WaveParams};
use zonelab_core::zone::{TacticalZone, ZoneKind};

/// Helper: daily-cadence config with the standard table and wave parameters.
fn daily_config() -> SmartConfig {
    SmartConfig {
        cadence: Cadence::Daily,
        ..SmartConfig::default()
    }
}

/// Helper: config whose whole capital sits in the wave pool.
fn wave_only_config(capital: f64) -> SmartConfig {
    SmartConfig {
        total_capital: capital,
        base_ratio: 0.0,
        dca_ratio: 0.0,
        wave_ratio: 1.0,
        ..daily_config()
    }
}

/// Helper: a point with an explicit deviation, spaced one week apart.
fn point(week: i64, close: f64, deviation: f64) -> PricePoint {
    PricePoint {
        date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap() + chrono::Duration::weeks(week),
        close,
        moving_average: Some(close / (1.0 + deviation / 100.0)),
        deviation_pct: deviation,
    }
}

fn wave_trades(kinds: &[TradeKind]) -> Vec<TradeKind> {
    kinds
        .iter()
        .copied()
        .filter(|k| !matches!(k, TradeKind::BaseOpen | TradeKind::DcaBuy))
        .collect()
}

// ── 1. Flat market ──────────────────────────────────────────────────

#[test]
fn flat_market_is_pure_contribution() {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let raw: Vec<RawPrice> = (0..400)
        .map(|i| RawPrice {
            date: start + chrono::Duration::days(i),
            close: 100.0,
            moving_average: None,
        })
        .collect();
    let series = prepare_series(&raw, 250).unwrap();
    assert!(series[248].moving_average.is_none());
    assert_eq!(series[249].moving_average, Some(100.0));
    assert!(series.iter().all(|p| p.deviation_pct == 0.0));

    let cfg = SmartConfig::default();
    let result = run_smart(&series, &cfg).unwrap();

    assert!(result
        .trades
        .iter()
        .all(|t| matches!(t.kind, TradeKind::BaseOpen | TradeKind::DcaBuy)));
    assert!(result
        .trades
        .iter()
        .filter(|t| t.kind == TradeKind::DcaBuy)
        .all(|t| (t.amount - 1_000.0).abs() < 1e-9));

    // Shares bought at 100 are still worth their cost; the rest is uninvested cash.
    let shares: f64 = result.trades.iter().map(|t| t.shares()).sum();
    assert!((shares * 100.0 - result.total_invested).abs() < 1e-6);
    assert!((result.final_value - cfg.total_capital).abs() < 1e-6);
    assert!(result
        .value_curve
        .iter()
        .all(|p| (p.value - cfg.total_capital).abs() < 1e-6));
}

// ── 2. Wave open ────────────────────────────────────────────────────

#[test]
fn wave_opens_one_unit_on_extreme_entry() {
    let cfg = wave_only_config(100_000.0);
    let mut state = AllocationState::new(&cfg);
    assert_eq!(state.wave_pool, 100_000.0);

    let out = state.step(&cfg, &point(0, 90.0, -10.0));
    assert!(out.entering);
    assert_eq!(out.zone.kind, ZoneKind::ExtremeUndervalued);
    assert_eq!(out.trades.len(), 1);
    assert_eq!(
        out.trades[0].kind,
        TradeKind::WaveOpen {
            zone: TacticalZone::ExtremeUndervalued
        }
    );
    assert_eq!(out.trades[0].amount, 10_000.0);
    assert_eq!(state.wave_add_count(), 0);
    assert_eq!(state.wave_last_entry_price(), Some(90.0));
    assert_eq!(state.wave_pool, 90_000.0);
    assert_eq!(state.total_invested, 10_000.0);
}

#[test]
fn value_marks_wave_shares_at_the_current_close() {
    let cfg = wave_only_config(100_000.0);
    let series = vec![point(0, 90.0, -10.0), point(1, 99.0, -9.0)];
    let result = run_smart(&series, &cfg).unwrap();

    // 10,000 bought at 90, still held at 99 with 90,000 uninvested.
    assert_eq!(result.trades.len(), 1);
    assert!((result.value_curve[0].value - 100_000.0).abs() < 1e-6);
    assert!((result.value_curve[1].value - 101_000.0).abs() < 1e-6);
    assert!((result.final_value - 101_000.0).abs() < 1e-6);
}

// ── 3. Wave scale-in ────────────────────────────────────────────────

#[test]
fn wave_adds_on_one_percent_drop_under_undervalued() {
    let cfg = daily_config();
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -6.0));
    assert_eq!(state.wave_zone(), Some(TacticalZone::Undervalued));
    assert_eq!(state.wave_last_entry_price(), Some(100.0));

    let out = state.step(&cfg, &point(1, 98.5, -6.5));
    let waves = wave_trades(&out.trades.iter().map(|t| t.kind).collect::<Vec<_>>());
    assert_eq!(
        waves,
        vec![TradeKind::WaveAdd {
            n: 1,
            zone: TacticalZone::Undervalued
        }]
    );
    assert_eq!(state.wave_last_entry_price(), Some(98.5));
    assert_eq!(state.wave_add_count(), 1);
}

#[test]
fn no_add_without_enough_drop() {
    let cfg = daily_config();
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -6.0));
    let out = state.step(&cfg, &point(1, 99.5, -6.2));
    assert!(wave_trades(&out.trades.iter().map(|t| t.kind).collect::<Vec<_>>()).is_empty());
    assert_eq!(state.wave_last_entry_price(), Some(100.0));
}

#[test]
fn add_triggers_exactly_at_threshold() {
    let cfg = daily_config();
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -6.0));
    // 100 * (1 - 0.01) computed in floating point
    let out = state.step(&cfg, &point(1, 99.0, -6.0));
    assert!(out
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveAdd { n: 1, .. })));
}

#[test]
fn add_threshold_uses_the_engine_tolerance() {
    let cfg = daily_config();
    assert!((cfg.tolerance() - 1e-6).abs() < 1e-18);

    // Within base_unit * 1e-9 of the trigger: adds.
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -6.0));
    let out = state.step(&cfg, &point(1, 99.0 + 5e-7, -6.0));
    assert!(out
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveAdd { n: 1, .. })));

    // Beyond it: no add.
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -6.0));
    let out = state.step(&cfg, &point(1, 99.0 + 1e-5, -6.0));
    assert!(!out
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveAdd { .. })));
}

#[test]
fn scale_ins_stop_at_max_adds() {
    let cfg = wave_only_config(100_000.0);
    let mut state = AllocationState::new(&cfg);
    let mut price = 100.0;
    state.step(&cfg, &point(0, price, -6.0));
    for week in 1..8 {
        price *= 0.98;
        state.step(&cfg, &point(week, price, -7.0));
    }
    assert_eq!(state.wave_add_count(), 3);
    // open + 3 adds of 5,000 each
    assert!((cfg.wave_budget() - state.wave_pool - 20_000.0).abs() < 1e-6);
}

#[test]
fn wave_pool_exhaustion_caps_adds() {
    let cfg = daily_config(); // wave pool 15,000, extreme unit 10,000
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -10.0));
    let out = state.step(&cfg, &point(1, 97.0, -11.0));
    let add = out
        .trades
        .iter()
        .find(|t| matches!(t.kind, TradeKind::WaveAdd { .. }))
        .unwrap();
    assert!((add.amount - 5_000.0).abs() < 1e-9);
    assert!(state.wave_pool.abs() < 1e-9);

    let out = state.step(&cfg, &point(2, 94.0, -12.0));
    assert!(!out
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveAdd { .. })));
}

// ── 4. Forced unwind ────────────────────────────────────────────────

#[test]
fn overvalued_entry_sells_everything_and_resets() {
    let cfg = daily_config();
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -10.0));
    let held = state.wave_shares();
    assert!(held > 0.0);

    let out = state.step(&cfg, &point(1, 120.0, 10.0));
    assert!(out.entering);
    assert_eq!(out.zone.kind, ZoneKind::Overvalued);
    let sell = out
        .trades
        .iter()
        .find(|t| matches!(t.kind, TradeKind::WaveSell { .. }))
        .unwrap();
    assert_eq!(
        sell.kind,
        TradeKind::WaveSell {
            fraction: 1.0,
            held_zone: TacticalZone::ExtremeUndervalued
        }
    );
    assert!((sell.amount - held * 120.0).abs() < 1e-6);
    assert!(state.wave.is_none());
    assert_eq!(state.wave_zone(), None);
    assert_eq!(state.wave_last_entry_price(), None);
    assert_eq!(state.wave_add_count(), 0);
}

#[test]
fn forced_unwind_overrides_an_empty_ladder() {
    let mut cfg = daily_config();
    cfg.wave.undervalued = WaveParams {
        exit_ladder: Vec::new(),
        ..WaveParams::undervalued()
    };
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -6.0));
    // staying undervalued: ladder is empty, nothing sold
    let out = state.step(&cfg, &point(1, 100.0, -6.0));
    assert!(!out
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveSell { .. })));

    let out = state.step(&cfg, &point(2, 130.0, 20.0));
    assert_eq!(out.zone.kind, ZoneKind::ExtremeOvervalued);
    assert!(out.trades.iter().any(|t| matches!(
        t.kind,
        TradeKind::WaveSell {
            fraction,
            held_zone: TacticalZone::Undervalued
        } if fraction == 1.0
    )));
    assert!(state.wave.is_none());
}

#[test]
fn every_overvalued_entry_unwinds_a_reopened_wave() {
    let mut cfg = daily_config();
    cfg.wave.extreme_undervalued.exit_ladder.clear();
    let mut state = AllocationState::new(&cfg);
    // Overvalued on the first period with nothing to sell.
    let out = state.step(&cfg, &point(0, 100.0, 10.0));
    assert!(out.entering);
    assert!(!out
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveSell { .. })));

    for cycle in 0..2 {
        let week = 1 + cycle * 2;
        state.step(&cfg, &point(week, 80.0, -10.0));
        assert!(state.wave.is_some());
        // Empty ladder: only the zone entry can sell.
        let out = state.step(&cfg, &point(week + 1, 95.0, 9.0));
        assert!(out.entering);
        assert!(out
            .trades
            .iter()
            .any(|t| matches!(t.kind, TradeKind::WaveSell { fraction, .. } if fraction == 1.0)));
        assert!(state.wave.is_none());
    }

    // Lingering in the extreme zone keeps the position.
    state.step(&cfg, &point(5, 70.0, -12.0));
    let out = state.step(&cfg, &point(6, 71.0, -12.0));
    assert!(!out.entering);
    assert!(state.wave.is_some());
}

// ── 5. Exit ladder, determinism, accounting ─────────────────────────

#[test]
fn extreme_ladder_partial_then_full_exit() {
    let cfg = daily_config();
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -10.0));
    let opened = state.wave_shares();

    // -3%: neutral zone, 30% rung
    let out = state.step(&cfg, &point(1, 104.0, -3.0));
    assert!(out.trades.iter().any(|t| matches!(
        t.kind,
        TradeKind::WaveSell { fraction, .. } if (fraction - 0.3).abs() < 1e-12
    )));
    assert!((state.wave_shares() - opened * 0.7).abs() < 1e-9);

    // +6%: 100% rung
    state.step(&cfg, &point(2, 115.0, 6.0));
    assert!(state.wave.is_none());
}

#[test]
fn sell_never_reduces_invested() {
    let cfg = daily_config();
    let mut state = AllocationState::new(&cfg);
    state.step(&cfg, &point(0, 100.0, -10.0));
    let before = state.total_invested;
    let out = state.step(&cfg, &point(1, 110.0, 6.0));
    let bought: f64 = out
        .trades
        .iter()
        .filter(|t| t.kind.is_buy())
        .map(|t| t.amount)
        .sum();
    assert!((state.total_invested - before - bought).abs() < 1e-9);
}

#[test]
fn replay_is_identical() {
    let series: Vec<PricePoint> = (0..120)
        .map(|i| {
            let close = 100.0 + 15.0 * (i as f64 * 0.2).sin();
            let deviation = 20.0 * (i as f64 * 0.15).cos();
            point(i, close, deviation)
        })
        .collect();
    let cfg = daily_config();
    let a = run_smart(&series, &cfg).unwrap();
    let b = run_smart(&series, &cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert!((a.total_invested - a.invested_from_trades()).abs() < 1e-6);
    assert!(a
        .trades
        .iter()
        .any(|t| matches!(t.kind, TradeKind::WaveSell { .. })));
}
