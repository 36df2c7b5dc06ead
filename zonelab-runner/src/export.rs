//! Artifact export — JSON manifest plus CSV trade log and value curves.
//!
//! The manifest carries a `schema_version`; unknown versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::runner::{Comparison, StrategyRun};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything written to `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    #[serde(flatten)]
    pub comparison: Comparison,
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a comparison to a pretty JSON manifest.
pub fn export_json(cmp: &Comparison) -> Result<String> {
    let manifest = Manifest {
        schema_version: SCHEMA_VERSION,
        comparison: cmp.clone(),
    };
    serde_json::to_string_pretty(&manifest).context("failed to serialize manifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<Comparison> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest.comparison)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Every strategy's trades in one table.
///
/// Columns: strategy, date, kind, price, amount, shares
pub fn export_trades_csv(runs: &[StrategyRun]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["strategy", "date", "kind", "price", "amount", "shares"])?;

    for run in runs {
        for t in &run.result.trades {
            wtr.write_record([
                run.result.strategy.as_str(),
                &t.date.to_string(),
                &t.kind.to_string(),
                &format!("{:.6}", t.price),
                &format!("{:.2}", t.amount),
                &format!("{:.6}", t.shares()),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Every strategy's value curve in long format.
///
/// Columns: strategy, date, value
pub fn export_value_curve_csv(runs: &[StrategyRun]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["strategy", "date", "value"])?;
    for run in runs {
        for p in &run.result.value_curve {
            wtr.write_record([
                run.result.strategy.as_str(),
                &p.date.to_string(),
                &format!("{:.2}", p.value),
            ])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a comparison.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing:
/// - `manifest.json` — results, metrics, config and dataset hash
/// - `trades.csv` — every strategy's trade log
/// - `value_curve.csv` — every strategy's value curve
///
/// Returns the path to the created directory.
pub fn save_artifacts(cmp: &Comparison, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        cmp.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(cmp)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&cmp.runs)?)?;
    std::fs::write(
        run_dir.join("value_curve.csv"),
        export_value_curve_csv(&cmp.runs)?,
    )?;

    Ok(run_dir)
}

/// Load a comparison from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<Comparison> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
