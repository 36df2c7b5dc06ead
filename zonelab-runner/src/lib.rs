//! ZoneLab Runner — configuration, data loading, strategy comparison and reporting.
//!
//! This crate builds on `zonelab-core` to provide:
//! - TOML configuration with defaults for every section
//! - CSV / JSON price loading and a seeded synthetic fallback
//! - Parallel comparison of buy-and-hold, weekly DCA and the smart strategy
//! - Performance metrics (return, CAGR, max drawdown, average cost)
//! - Terminal reports and JSON / CSV artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::{BacktestConfig, ConfigError};
pub use data_loader::{load_prices, load_synthetic, DataSource, LoadError, LoadedData};
pub use export::{load_artifacts, save_artifacts, SCHEMA_VERSION};
pub use metrics::PerformanceMetrics;
pub use report::render_report;
pub use runner::{run_comparison, Comparison, DataSummary, RunError, StrategyKind, StrategyRun};
