//! Plain-text reports for the terminal.
//!
//! Pure presentation: every function takes finished results and returns a
//! `String`; nothing here computes metrics.

use zonelab_core::domain::BacktestResult;
use zonelab_core::zone::ZoneTable;

use crate::runner::{Comparison, DataSummary, StrategyRun};

const RULE_WIDTH: usize = 66;

// ─── Formatting helpers ─────────────────────────────────────────────

/// Round to whole units and group thousands with commas: `-1234567.8` → `-1,234,568`.
pub fn thousands(v: f64) -> String {
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

// ─── Sections ───────────────────────────────────────────────────────

/// Data range, warm-up and latest deviation.
pub fn render_data_summary(symbol: &str, data: &DataSummary, synthetic: bool) -> String {
    let mut out = String::new();
    let tag = if synthetic { "  [synthetic]" } else { "" };
    out.push_str(&format!("Symbol      : {symbol}{tag}\n"));
    out.push_str(&format!(
        "Data range  : {} → {}  {} sessions\n",
        data.first_date,
        data.last_date,
        thousands(data.sessions as f64)
    ));
    out.push_str(&format!(
        "Start       : {}  first close {:.4}\n",
        data.first_date, data.first_close
    ));
    match data.first_ma_date {
        Some(date) => out.push_str(&format!(
            "MA first    : {date}  (earlier sessions count as 0% deviation)\n"
        )),
        None => out.push_str("MA first    : never (every session counts as 0% deviation)\n"),
    }
    out.push_str(&format!(
        "Latest      : close {:.4}  deviation {:+.2}%\n",
        data.last_close, data.last_deviation_pct
    ));
    out
}

/// Side-by-side metrics, one column per strategy.
pub fn render_comparison_table(runs: &[StrategyRun]) -> String {
    let mut out = String::new();
    out.push_str(&rule());
    out.push('\n');

    let mut header = format!("  {:<18}", "Metric");
    for run in runs {
        header.push_str(&format!("  {:>12}", run.kind.title()));
    }
    out.push_str(&header);
    out.push('\n');
    out.push_str(&rule());
    out.push('\n');

    let money = |v: f64| format!("{:>12}", thousands(v));
    let pct = |v: f64| format!("{:>11.2}%", v);

    let rows: Vec<(&str, Vec<String>)> = vec![
        ("Invested", runs.iter().map(|r| money(r.metrics.invested)).collect()),
        ("Final value", runs.iter().map(|r| money(r.metrics.final_value)).collect()),
        ("Profit", runs.iter().map(|r| money(r.metrics.profit)).collect()),
        ("Total return", runs.iter().map(|r| pct(r.metrics.return_pct)).collect()),
        ("CAGR", runs.iter().map(|r| pct(r.metrics.cagr)).collect()),
        ("Max drawdown", runs.iter().map(|r| pct(r.metrics.max_drawdown)).collect()),
        (
            "Years",
            runs.iter().map(|r| format!("{:>12.2}", r.metrics.years)).collect(),
        ),
    ];
    for (label, cells) in rows {
        out.push_str(&format!("  {label:<18}  {}\n", cells.join("  ")));
    }
    out.push_str(&rule());
    out.push('\n');
    out
}

/// Implied average cost per strategy against the last close.
pub fn render_average_cost(runs: &[StrategyRun], last_close: f64) -> String {
    let mut out = String::from("  ── Average cost ──\n");
    for run in runs {
        match run.metrics.average_cost(last_close) {
            Some(avg) => out.push_str(&format!(
                "  {:<12}  avg {:.4}  (last / avg = {:.2}x)\n",
                run.kind.title(),
                avg,
                last_close / avg
            )),
            None => out.push_str(&format!("  {:<12}  no position\n", run.kind.title())),
        }
    }
    out
}

/// Chronological trade log of one result.
pub fn render_trade_log(result: &BacktestResult) -> String {
    let mut out = format!(
        "  ── {} trades ({}) ──\n",
        result.strategy,
        result.trades.len()
    );
    if result.trades.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    out.push_str(&format!(
        "  {:<10}  {:<36}  {:>10}  {:>12}\n",
        "date", "kind", "price", "amount"
    ));
    for trade in &result.trades {
        out.push_str(&format!(
            "  {:<10}  {:<36}  {:>10.4}  {:>12}\n",
            trade.date.to_string(),
            trade.kind.to_string(),
            trade.price,
            thousands(trade.amount)
        ));
    }
    out
}

/// Evaluation-order listing of a zone table.
pub fn render_zone_table(table: &ZoneTable) -> String {
    let mut out = format!("  {:<20}  {:<20}  {:>6}\n", "zone", "deviation", "factor");
    for (kind, range, factor) in table.describe() {
        out.push_str(&format!(
            "  {:<20}  {:<20}  {:>6.2}\n",
            kind.name(),
            range,
            factor
        ));
    }
    let gaps = table.coverage_gaps();
    if !gaps.is_empty() {
        out.push_str(&format!(
            "  warning: {} probed deviation(s) match no zone and fall back to neutral\n",
            gaps.len()
        ));
    }
    out
}

/// The full terminal report for a comparison.
pub fn render_report(cmp: &Comparison) -> String {
    let mut out = render_data_summary(&cmp.symbol, &cmp.data, cmp.has_synthetic);
    out.push('\n');
    out.push_str(&render_comparison_table(&cmp.runs));

    if let Some(amount) = cmp.weekly_dca_amount {
        out.push('\n');
        out.push_str("  ── Weekly DCA ──\n");
        out.push_str(&format!(
            "  first session of each week: {} per week\n",
            thousands(amount)
        ));
    }

    out.push('\n');
    out.push_str(&render_average_cost(&cmp.runs, cmp.data.last_close));

    if let Some(smart) = cmp.run(crate::runner::StrategyKind::Smart) {
        out.push('\n');
        out.push_str(&render_trade_log(&smart.result));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestConfig;
    use crate::data_loader::load_synthetic;
    use crate::runner::run_comparison;
    use chrono::NaiveDate;
    use zonelab_core::domain::{Trade, TradeKind};
    use zonelab_core::zone::TacticalZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.4), "999");
        assert_eq!(thousands(1_000.0), "1,000");
        assert_eq!(thousands(1_234_567.8), "1,234,568");
        assert_eq!(thousands(-25_000.0), "-25,000");
        assert_eq!(thousands(-0.2), "0");
    }

    #[test]
    fn trade_log_lists_labels() {
        let result = BacktestResult {
            strategy: "smart".into(),
            total_invested: 10_000.0,
            final_value: 11_000.0,
            start_date: d(2024, 1, 5),
            end_date: d(2024, 1, 12),
            value_curve: Vec::new(),
            trades: vec![
                Trade {
                    kind: TradeKind::WaveOpen {
                        zone: TacticalZone::ExtremeUndervalued,
                    },
                    date: d(2024, 1, 5),
                    price: 0.9876,
                    amount: 10_000.0,
                },
                Trade {
                    kind: TradeKind::WaveSell {
                        fraction: 0.5,
                        held_zone: TacticalZone::ExtremeUndervalued,
                    },
                    date: d(2024, 1, 12),
                    price: 1.05,
                    amount: 5_316.1,
                },
            ],
        };
        let log = render_trade_log(&result);
        assert!(log.contains("smart trades (2)"));
        assert!(log.contains("wave-open (extreme-undervalued)"));
        assert!(log.contains("wave-sell 50% (extreme-undervalued)"));
        assert!(log.contains("0.9876"));
        assert!(log.contains("5,316"));
    }

    #[test]
    fn zone_table_listing() {
        let text = render_zone_table(&ZoneTable::standard());
        assert!(text.contains("extreme-undervalued"));
        assert!(text.contains("d <= -8"));
        assert!(text.contains("18 <= d"));
        assert!(!text.contains("warning"));
    }

    #[test]
    fn full_report_has_every_section() {
        let data = load_synthetic("REPORT", d(2021, 1, 1), d(2023, 6, 30), 250).unwrap();
        let cmp = run_comparison(&BacktestConfig::default(), &data).unwrap();
        let report = render_report(&cmp);
        assert!(report.contains("Data range"));
        assert!(report.contains("[synthetic]"));
        assert!(report.contains("Buy & Hold"));
        assert!(report.contains("Weekly DCA"));
        assert!(report.contains("Max drawdown"));
        assert!(report.contains("Average cost"));
        assert!(report.contains("smart trades"));
        assert!(report.contains("base-open"));
    }
}
