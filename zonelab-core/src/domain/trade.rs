//! Trade — one entry in a strategy's append-only trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::zone::TacticalZone;

/// What a trade did.
///
/// Buys (`BaseOpen`, `DcaBuy`, `WaveOpen`, `WaveAdd`) move cash into shares and
/// count toward the invested total. `WaveSell` returns cash to the wave pool and
/// never reduces the invested total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeKind {
    /// One-time conversion of the base allocation.
    BaseOpen,
    /// Periodic contribution.
    DcaBuy,
    /// Tactical position opened on entry into an undervalued zone.
    WaveOpen { zone: TacticalZone },
    /// n-th scale-in (1-based) of the tactical position.
    WaveAdd { n: u32, zone: TacticalZone },
    /// Partial or full unwind of the tactical position.
    WaveSell { fraction: f64, held_zone: TacticalZone },
}

impl TradeKind {
    pub fn is_buy(&self) -> bool {
        !matches!(self, TradeKind::WaveSell { .. })
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::BaseOpen => write!(f, "base-open"),
            TradeKind::DcaBuy => write!(f, "dca-buy"),
            TradeKind::WaveOpen { zone } => write!(f, "wave-open ({zone})"),
            TradeKind::WaveAdd { n, zone } => write!(f, "wave-add {n} ({zone})"),
            TradeKind::WaveSell {
                fraction,
                held_zone,
            } => write!(f, "wave-sell {:.0}% ({held_zone})", fraction * 100.0),
        }
    }
}

/// A single executed trade. `amount` is cash spent for buys and proceeds for sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub kind: TradeKind,
    pub date: NaiveDate,
    pub price: f64,
    pub amount: f64,
}

impl Trade {
    /// Shares moved by this trade.
    pub fn shares(&self) -> f64 {
        if self.price > 0.0 {
            self.amount / self.price
        } else {
            0.0
        }
    }
}
