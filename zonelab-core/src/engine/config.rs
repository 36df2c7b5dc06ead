//! Smart strategy configuration: capital split, contribution unit, zone table,
//! and the tactical (wave) parameters per undervalued zone.

use serde::{Deserialize, Serialize};

use crate::data::Cadence;
use crate::error::InputError;
use crate::zone::{TacticalZone, ZoneTable};

/// Relative epsilon shared by every monetary and price threshold comparison
/// in the engine, and by share-dust cleanup.
pub const REL_EPSILON: f64 = 1e-9;

/// Tolerance for the ratio-sum check.
const RATIO_SUM_TOLERANCE: f64 = 1e-6;

/// One rung of a wave exit ladder: sell `fraction` once deviation >= `min_deviation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitStep {
    pub min_deviation: f64,
    pub fraction: f64,
}

/// Tactical parameters for a wave position opened under one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    /// Maximum number of scale-ins after the opening buy.
    pub max_adds: u32,
    /// Drop from the last entry price (percent) that triggers a scale-in.
    pub add_drop_pct: f64,
    /// Wave unit as a multiple of the base contribution unit.
    pub unit_multiple: f64,
    /// Exit rungs; the highest `min_deviation` that is reached wins.
    pub exit_ladder: Vec<ExitStep>,
}

impl WaveParams {
    pub fn extreme_undervalued() -> Self {
        Self {
            max_adds: 2,
            add_drop_pct: 2.0,
            unit_multiple: 10.0,
            exit_ladder: vec![
                ExitStep {
                    min_deviation: 5.0,
                    fraction: 1.0,
                },
                ExitStep {
                    min_deviation: 0.0,
                    fraction: 0.5,
                },
                ExitStep {
                    min_deviation: -5.0,
                    fraction: 0.3,
                },
            ],
        }
    }

    pub fn undervalued() -> Self {
        Self {
            max_adds: 3,
            add_drop_pct: 1.0,
            unit_multiple: 5.0,
            exit_ladder: vec![
                ExitStep {
                    min_deviation: 3.0,
                    fraction: 1.0,
                },
                ExitStep {
                    min_deviation: 0.0,
                    fraction: 0.5,
                },
            ],
        }
    }

    /// Fraction of the wave position to sell at `deviation`, 0.0 when no rung is reached.
    pub fn exit_fraction(&self, deviation: f64) -> f64 {
        self.exit_ladder
            .iter()
            .filter(|step| deviation >= step.min_deviation)
            .max_by(|a, b| a.min_deviation.total_cmp(&b.min_deviation))
            .map_or(0.0, |step| step.fraction)
    }

    fn validate(&self) -> Result<(), InputError> {
        if !self.add_drop_pct.is_finite() || self.add_drop_pct < 0.0 || self.add_drop_pct >= 100.0 {
            return Err(InputError::InvalidParameter {
                name: "add_drop_pct",
                value: self.add_drop_pct,
            });
        }
        if !self.unit_multiple.is_finite() || self.unit_multiple <= 0.0 {
            return Err(InputError::InvalidParameter {
                name: "unit_multiple",
                value: self.unit_multiple,
            });
        }
        for step in &self.exit_ladder {
            if !step.fraction.is_finite() || step.fraction <= 0.0 || step.fraction > 1.0 {
                return Err(InputError::InvalidParameter {
                    name: "exit_ladder.fraction",
                    value: step.fraction,
                });
            }
            if step.min_deviation.is_nan() {
                return Err(InputError::InvalidParameter {
                    name: "exit_ladder.min_deviation",
                    value: step.min_deviation,
                });
            }
        }
        Ok(())
    }
}

/// Wave parameters for both tactical zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub extreme_undervalued: WaveParams,
    pub undervalued: WaveParams,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            extreme_undervalued: WaveParams::extreme_undervalued(),
            undervalued: WaveParams::undervalued(),
        }
    }
}

impl WaveConfig {
    pub fn params(&self, zone: TacticalZone) -> &WaveParams {
        match zone {
            TacticalZone::ExtremeUndervalued => &self.extreme_undervalued,
            TacticalZone::Undervalued => &self.undervalued,
        }
    }
}

/// Everything the smart allocation engine needs besides the price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartConfig {
    pub total_capital: f64,
    pub base_ratio: f64,
    pub dca_ratio: f64,
    pub wave_ratio: f64,
    /// Base periodic contribution before the zone multiplier.
    pub base_unit: f64,
    pub cadence: Cadence,
    pub zones: ZoneTable,
    pub wave: WaveConfig,
}

impl Default for SmartConfig {
    fn default() -> Self {
        Self {
            total_capital: 100_000.0,
            base_ratio: 0.25,
            dca_ratio: 0.60,
            wave_ratio: 0.15,
            base_unit: 1_000.0,
            cadence: Cadence::Weekly,
            zones: ZoneTable::standard(),
            wave: WaveConfig::default(),
        }
    }
}

impl SmartConfig {
    /// Absolute tolerance for cash amounts, position value and the scale-in trigger.
    pub fn tolerance(&self) -> f64 {
        self.base_unit * REL_EPSILON
    }

    pub fn base_budget(&self) -> f64 {
        self.total_capital * self.base_ratio
    }

    pub fn dca_budget(&self) -> f64 {
        self.total_capital * self.dca_ratio
    }

    pub fn wave_budget(&self) -> f64 {
        self.total_capital * self.wave_ratio
    }

    /// Cash committed per wave buy under `zone`.
    pub fn wave_unit(&self, zone: TacticalZone) -> f64 {
        self.base_unit * self.wave.params(zone).unit_multiple
    }

    pub fn validate(&self) -> Result<(), InputError> {
        positive("total_capital", self.total_capital)?;
        positive("base_unit", self.base_unit)?;
        for (name, ratio) in [
            ("base_ratio", self.base_ratio),
            ("dca_ratio", self.dca_ratio),
            ("wave_ratio", self.wave_ratio),
        ] {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(InputError::InvalidParameter { name, value: ratio });
            }
        }
        let sum = self.base_ratio + self.dca_ratio + self.wave_ratio;
        if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(InputError::RatiosDoNotSumToOne { sum });
        }
        self.zones.validate()?;
        self.wave.extreme_undervalued.validate()?;
        self.wave.undervalued.validate()?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InputError::InvalidParameter { name, value })
    }
}
