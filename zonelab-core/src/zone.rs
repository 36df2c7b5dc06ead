//! Zone classifier — maps a deviation percentage to a valuation zone.
//!
//! The zone table is an ordered list of threshold rules evaluated top-down;
//! the first matching rule wins. A neutral zone with factor 1.0 is the
//! fallback when nothing matches. The standard table partitions the real line:
//!
//! | deviation       | zone                | factor |
//! |-----------------|---------------------|--------|
//! | d <= -8         | extreme-undervalued | 3.0    |
//! | -8 < d <= -5    | undervalued         | 2.0    |
//! | -5 < d < 8      | neutral             | 1.0    |
//! | 8 <= d < 18     | overvalued          | 0.5    |
//! | d >= 18         | extreme-overvalued  | 0.2    |

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::InputError;

/// The five named valuation regimes.
///
/// Table overrides change thresholds and factors, never this set, so every
/// zone-dependent engine rule stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    ExtremeUndervalued,
    Undervalued,
    Neutral,
    Overvalued,
    ExtremeOvervalued,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 5] = [
        ZoneKind::ExtremeUndervalued,
        ZoneKind::Undervalued,
        ZoneKind::Neutral,
        ZoneKind::Overvalued,
        ZoneKind::ExtremeOvervalued,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ZoneKind::ExtremeUndervalued => "extreme-undervalued",
            ZoneKind::Undervalued => "undervalued",
            ZoneKind::Neutral => "neutral",
            ZoneKind::Overvalued => "overvalued",
            ZoneKind::ExtremeOvervalued => "extreme-overvalued",
        }
    }

    /// The tactical zone a wave position may be opened under, if any.
    pub fn tactical(&self) -> Option<TacticalZone> {
        match self {
            ZoneKind::ExtremeUndervalued => Some(TacticalZone::ExtremeUndervalued),
            ZoneKind::Undervalued => Some(TacticalZone::Undervalued),
            _ => None,
        }
    }

    pub fn is_overvalued(&self) -> bool {
        matches!(self, ZoneKind::Overvalued | ZoneKind::ExtremeOvervalued)
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Zones under which a wave position can be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticalZone {
    ExtremeUndervalued,
    Undervalued,
}

impl TacticalZone {
    pub fn zone(&self) -> ZoneKind {
        match self {
            TacticalZone::ExtremeUndervalued => ZoneKind::ExtremeUndervalued,
            TacticalZone::Undervalued => ZoneKind::Undervalued,
        }
    }
}

impl fmt::Display for TacticalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.zone().name())
    }
}

/// Classification result: the zone and its contribution multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub kind: ZoneKind,
    pub factor: f64,
}

impl Zone {
    pub const NEUTRAL_FALLBACK: Zone = Zone {
        kind: ZoneKind::Neutral,
        factor: 1.0,
    };
}

/// One threshold predicate of the zone table.
///
/// An absent bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub kind: ZoneKind,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub min_inclusive: bool,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub max_inclusive: bool,
    pub factor: f64,
}

impl ZoneRule {
    pub fn matches(&self, deviation: f64) -> bool {
        let above_min = match self.min {
            Some(min) if self.min_inclusive => deviation >= min,
            Some(min) => deviation > min,
            None => !deviation.is_nan(),
        };
        let below_max = match self.max {
            Some(max) if self.max_inclusive => deviation <= max,
            Some(max) => deviation < max,
            None => !deviation.is_nan(),
        };
        above_min && below_max
    }

    fn bounds(&self) -> impl Iterator<Item = f64> {
        self.min.into_iter().chain(self.max)
    }

    fn describe(&self) -> String {
        let lower = match self.min {
            Some(min) if self.min_inclusive => format!("{min} <= "),
            Some(min) => format!("{min} < "),
            None => String::new(),
        };
        let upper = match self.max {
            Some(max) if self.max_inclusive => format!(" <= {max}"),
            Some(max) => format!(" < {max}"),
            None => String::new(),
        };
        if lower.is_empty() && upper.is_empty() {
            "any".to_string()
        } else {
            format!("{lower}d{upper}")
        }
    }
}

/// Ordered zone rules with a neutral fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneTable {
    rules: Vec<ZoneRule>,
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl ZoneTable {
    pub fn new(rules: Vec<ZoneRule>) -> Self {
        Self { rules }
    }

    /// The standard five-zone table.
    pub fn standard() -> Self {
        Self::new(vec![
            ZoneRule {
                kind: ZoneKind::ExtremeUndervalued,
                min: None,
                min_inclusive: false,
                max: Some(-8.0),
                max_inclusive: true,
                factor: 3.0,
            },
            ZoneRule {
                kind: ZoneKind::Undervalued,
                min: Some(-8.0),
                min_inclusive: false,
                max: Some(-5.0),
                max_inclusive: true,
                factor: 2.0,
            },
            ZoneRule {
                kind: ZoneKind::Neutral,
                min: Some(-5.0),
                min_inclusive: false,
                max: Some(8.0),
                max_inclusive: false,
                factor: 1.0,
            },
            ZoneRule {
                kind: ZoneKind::Overvalued,
                min: Some(8.0),
                min_inclusive: true,
                max: Some(18.0),
                max_inclusive: false,
                factor: 0.5,
            },
            ZoneRule {
                kind: ZoneKind::ExtremeOvervalued,
                min: Some(18.0),
                min_inclusive: true,
                max: None,
                max_inclusive: false,
                factor: 0.2,
            },
        ])
    }

    pub fn rules(&self) -> &[ZoneRule] {
        &self.rules
    }

    /// Classify a deviation. Never fails: unmatched input falls back to neutral.
    pub fn classify(&self, deviation: f64) -> Zone {
        match self.rules.iter().find(|r| r.matches(deviation)) {
            Some(rule) => Zone {
                kind: rule.kind,
                factor: rule.factor,
            },
            None => {
                debug!(deviation, "no zone rule matched, using neutral fallback");
                Zone::NEUTRAL_FALLBACK
            }
        }
    }

    /// Deviations that no rule matches.
    ///
    /// Probes every rule boundary, points just either side of it, the
    /// midpoints between boundaries and both infinities. An empty result means
    /// the neutral fallback is unreachable for the probed points.
    pub fn coverage_gaps(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = self
            .rules
            .iter()
            .flat_map(|r| r.bounds())
            .filter(|b| b.is_finite())
            .collect();
        edges.sort_by(f64::total_cmp);
        edges.dedup();

        let mut probes = vec![f64::NEG_INFINITY, f64::INFINITY, 0.0];
        for (i, &edge) in edges.iter().enumerate() {
            let nudge = 1e-9 * edge.abs().max(1.0);
            probes.extend([edge - nudge, edge, edge + nudge]);
            if let Some(&next) = edges.get(i + 1) {
                probes.push((edge + next) / 2.0);
            }
        }
        if let (Some(&first), Some(&last)) = (edges.first(), edges.last()) {
            probes.push(first - 1.0);
            probes.push(last + 1.0);
        }

        let mut gaps: Vec<f64> = probes
            .into_iter()
            .filter(|&p| !self.rules.iter().any(|r| r.matches(p)))
            .collect();
        gaps.sort_by(f64::total_cmp);
        gaps.dedup();
        gaps
    }

    /// Reject tables that cannot be used at all: no rules, or a factor that is
    /// not a positive finite number.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.rules.is_empty() {
            return Err(InputError::InvalidZoneTable("zone table is empty".into()));
        }
        for rule in &self.rules {
            if !rule.factor.is_finite() || rule.factor <= 0.0 {
                return Err(InputError::InvalidZoneTable(format!(
                    "zone {} has non-positive factor {}",
                    rule.kind, rule.factor
                )));
            }
            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                if min > max {
                    return Err(InputError::InvalidZoneTable(format!(
                        "zone {} has min {min} above max {max}",
                        rule.kind
                    )));
                }
            }
        }
        Ok(())
    }

    /// Human-readable one-line description per rule, in evaluation order.
    pub fn describe(&self) -> Vec<(ZoneKind, String, f64)> {
        self.rules
            .iter()
            .map(|r| (r.kind, r.describe(), r.factor))
            .collect()
    }
}

/// Classify with the standard table.
pub fn classify(deviation: f64) -> Zone {
    ZoneTable::standard().classify(deviation)
}
