//! TOML backtest configuration.
//!
//! Every section is optional; missing values fall back to the standard
//! allocation (100,000 capital split 25/60/15, unit 1,000, MA 250, weekly
//! cadence, standard zone table and tactical parameters).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zonelab_core::data::{Cadence, DEFAULT_MA_PERIOD};
use zonelab_core::engine::{SmartConfig, WaveConfig};
use zonelab_core::zone::{ZoneRule, ZoneTable};
use zonelab_core::InputError;

/// Errors from reading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] InputError),

    #[error("invalid configuration: {0}")]
    Other(String),
}

/// Top-level configuration for one comparison run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    pub data: DataSection,
    pub capital: CapitalSection,
    pub smart: SmartSection,
    pub baselines: BaselineSection,
    /// Replaces the standard zone table when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneRule>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSection {
    /// CSV or JSON price file. Unset means the caller must supply data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub symbol: String,
    pub ma_period: usize,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            path: None,
            symbol: "ETF".to_string(),
            ma_period: DEFAULT_MA_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapitalSection {
    pub total: f64,
}

impl Default for CapitalSection {
    fn default() -> Self {
        Self { total: 100_000.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartSection {
    pub enabled: bool,
    pub base_ratio: f64,
    pub dca_ratio: f64,
    pub wave_ratio: f64,
    pub base_unit: f64,
    pub cadence: Cadence,
    pub wave: WaveConfig,
}

impl Default for SmartSection {
    fn default() -> Self {
        let defaults = SmartConfig::default();
        Self {
            enabled: true,
            base_ratio: defaults.base_ratio,
            dca_ratio: defaults.dca_ratio,
            wave_ratio: defaults.wave_ratio,
            base_unit: defaults.base_unit,
            cadence: defaults.cadence,
            wave: defaults.wave,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaselineSection {
    pub buy_and_hold: bool,
    pub weekly_dca: bool,
    /// Total weekly-DCA budget; defaults to `capital.total`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_dca_budget: Option<f64>,
}

impl Default for BaselineSection {
    fn default() -> Self {
        Self {
            buy_and_hold: true,
            weekly_dca: true,
            weekly_dca_budget: None,
        }
    }
}

impl BacktestConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Zone table in effect: the override if present, else the standard one.
    pub fn zone_table(&self) -> ZoneTable {
        match &self.zones {
            Some(rules) => ZoneTable::new(rules.clone()),
            None => ZoneTable::standard(),
        }
    }

    pub fn weekly_dca_budget(&self) -> f64 {
        self.baselines.weekly_dca_budget.unwrap_or(self.capital.total)
    }

    /// Build and validate the smart engine configuration.
    pub fn smart_config(&self) -> Result<SmartConfig, ConfigError> {
        let config = SmartConfig {
            total_capital: self.capital.total,
            base_ratio: self.smart.base_ratio,
            dca_ratio: self.smart.dca_ratio,
            wave_ratio: self.smart.wave_ratio,
            base_unit: self.smart.base_unit,
            cadence: self.smart.cadence,
            zones: self.zone_table(),
            wave: self.smart.wave.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check everything a run needs before any data is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.ma_period == 0 {
            return Err(ConfigError::Other("data.ma_period must be at least 1".into()));
        }
        if !self.smart.enabled && !self.baselines.buy_and_hold && !self.baselines.weekly_dca {
            return Err(ConfigError::Other("no strategy enabled".into()));
        }
        let budget = self.weekly_dca_budget();
        if self.baselines.weekly_dca && !(budget.is_finite() && budget > 0.0) {
            return Err(ConfigError::Other(format!(
                "baselines.weekly_dca_budget must be positive, got {budget}"
            )));
        }
        if !(self.capital.total.is_finite() && self.capital.total > 0.0) {
            return Err(ConfigError::Invalid(InputError::InvalidParameter {
                name: "capital.total",
                value: self.capital.total,
            }));
        }
        if self.smart.enabled {
            self.smart_config()?;
        }
        Ok(())
    }
}
