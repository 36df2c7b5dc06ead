//! Price loading for the runner.
//!
//! Supported sources:
//! 1. CSV with a `date,close[,moving_average]` header (`ma` and `ma250` are
//!    accepted for the moving-average column)
//! 2. JSON record dumps `{ "records": [ { "date", "adj_net_price" | "net_price", "ma250" } ] }`
//! 3. Tab-separated broker exports (`.xls`): GBK text, `YYYY-MM-DD,<weekday>`
//!    dates, close in the fifth column
//! 4. `--synthetic`: a deterministic random walk seeded from the symbol
//!
//! Synthetic data is a developer-only mode. Results produced on it are
//! tagged in the manifest.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use zonelab_core::data::{prepare_series, RawPrice};
use zonelab_core::domain::PricePoint;
use zonelab_core::InputError;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unparsable date '{0}'")]
    InvalidDate(String),

    #[error("no usable price rows in {0}")]
    NoRows(String),

    #[error("invalid price series: {0}")]
    Input(#[from] InputError),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Json,
    TabExport,
    Synthetic,
}

/// A prepared series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub source: DataSource,
    /// Validated daily series with moving average and deviation.
    pub series: Vec<PricePoint>,
    /// BLAKE3 over dates and closes.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

impl LoadedData {
    fn new(
        symbol: &str,
        source: DataSource,
        raw: &[RawPrice],
        ma_period: usize,
    ) -> Result<Self, LoadError> {
        let series = prepare_series(raw, ma_period)?;
        let dataset_hash = compute_dataset_hash(&series);
        info!(
            symbol,
            ?source,
            rows = series.len(),
            first = %series[0].date,
            last = %series[series.len() - 1].date,
            "loaded price series"
        );
        Ok(Self {
            symbol: symbol.to_string(),
            source,
            series,
            dataset_hash,
            has_synthetic: source == DataSource::Synthetic,
        })
    }
}

/// Load a price file. `.json` files are read as record dumps, `.xls` files as
/// tab-separated broker exports, everything else as CSV.
pub fn load_prices(path: &Path, symbol: &str, ma_period: usize) -> Result<LoadedData, LoadError> {
    let content = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    let (source, raw) = match extension.as_deref() {
        Some("json") => (DataSource::Json, parse_json(&content)?),
        Some("xls") => (DataSource::TabExport, parse_tab_export(&content)?),
        _ => (DataSource::Csv, parse_csv(&content)?),
    };
    if raw.is_empty() {
        return Err(LoadError::NoRows(path.display().to_string()));
    }
    LoadedData::new(symbol, source, &raw, ma_period)
}

/// Generate and prepare a synthetic series for `symbol` over `[start, end]`.
pub fn load_synthetic(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    ma_period: usize,
) -> Result<LoadedData, LoadError> {
    warn!(symbol, "generating synthetic data, results will be tagged as synthetic");
    let raw = generate_synthetic_prices(symbol, start, end);
    if raw.is_empty() {
        return Err(LoadError::NoRows(format!("synthetic range {start}..{end}")));
    }
    LoadedData::new(symbol, DataSource::Synthetic, &raw, ma_period)
}

// ─── CSV ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    close: f64,
    #[serde(default, alias = "ma", alias = "ma250")]
    moving_average: Option<f64>,
}

/// Parse `date,close[,moving_average]` rows, sorted by date.
pub fn parse_csv(content: &[u8]) -> Result<Vec<RawPrice>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let row = record?;
        rows.push(RawPrice {
            date: parse_date(&row.date)?,
            close: row.close,
            moving_average: row.moving_average,
        });
    }
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

// ─── JSON ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JsonDump {
    records: Vec<JsonRecord>,
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    date: String,
    #[serde(default)]
    adj_net_price: Option<f64>,
    #[serde(default)]
    net_price: Option<f64>,
    #[serde(default)]
    ma250: Option<f64>,
}

/// Parse a record dump, sorted by date.
///
/// The adjusted price wins over the raw one; records with neither are skipped.
pub fn parse_json(content: &[u8]) -> Result<Vec<RawPrice>, LoadError> {
    let dump: JsonDump = serde_json::from_slice(content)?;
    let total = dump.records.len();

    let mut rows = Vec::with_capacity(total);
    for record in dump.records {
        // A zero adjusted price means "not adjusted".
        let adjusted = record.adj_net_price.filter(|p| *p != 0.0);
        let Some(close) = adjusted.or(record.net_price) else {
            continue;
        };
        rows.push(RawPrice {
            date: parse_date(&record.date)?,
            close,
            moving_average: record.ma250,
        });
    }
    if rows.len() < total {
        warn!(skipped = total - rows.len(), "records without a price were skipped");
    }
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

// ─── Tab-separated export ───────────────────────────────────────────

const EXPORT_DATE_COLUMN: usize = 0;
const EXPORT_CLOSE_COLUMN: usize = 4;

/// Parse a tab-separated broker export, sorted by date.
///
/// The header and weekday suffixes are GBK text and are never decoded; only
/// the ASCII date prefix and the close column are read. Rows whose close is
/// not a number are dropped.
pub fn parse_tab_export(content: &[u8]) -> Result<Vec<RawPrice>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.byte_records() {
        let record = record?;
        let close = record
            .get(EXPORT_CLOSE_COLUMN)
            .and_then(|field| std::str::from_utf8(field).ok())
            .and_then(|field| field.trim().parse::<f64>().ok());
        let Some(close) = close else {
            dropped += 1;
            continue;
        };
        let raw_date = record.get(EXPORT_DATE_COLUMN).unwrap_or_default();
        let day = raw_date.split(|b| *b == b',').next().unwrap_or_default();
        let date = std::str::from_utf8(day)
            .map_err(|_| LoadError::InvalidDate(String::from_utf8_lossy(raw_date).into_owned()))
            .and_then(|day| parse_date(day.trim()))?;
        rows.push(RawPrice {
            date,
            close,
            moving_average: None,
        });
    }
    if dropped > 0 {
        warn!(dropped, "export rows without a numeric close were dropped");
    }
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &str) -> Result<NaiveDate, LoadError> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| LoadError::InvalidDate(value.to_string()))
}

// ─── Synthetic data and hashing ─────────────────────────────────────

/// BLAKE3 over every date and close, in series order.
pub fn compute_dataset_hash(series: &[PricePoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    for point in series {
        hasher.update(point.date.to_string().as_bytes());
        hasher.update(&point.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// A weekday-only random walk from 1.0, seeded from the symbol name.
pub fn generate_synthetic_prices(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawPrice> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut rows = Vec::new();
    let mut price = 1.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.02..0.02);
            price *= 1.0 + daily_return;
            rows.push(RawPrice {
                date: current,
                close: price,
                moving_average: None,
            });
        }
        current += chrono::Duration::days(1);
    }

    rows
}
