//! Allocation state — the smart engine's mutable state across periods.
//!
//! Three sub-positions (base, periodic, wave) plus the one-step zone memory
//! used to detect zone-entry transitions. Each run owns one instance.

use serde::{Deserialize, Serialize};

use crate::domain::{PricePoint, Trade, TradeKind};
use crate::engine::config::SmartConfig;
use crate::zone::{TacticalZone, Zone, ZoneKind};
use tracing::debug;

/// An open tactical position. Exists only while it holds shares above dust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavePosition {
    /// Zone the position was opened under.
    pub zone: TacticalZone,
    pub shares: f64,
    pub last_entry_price: f64,
    pub add_count: u32,
}

/// What one period did to the state.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub zone: Zone,
    pub entering: bool,
    pub value: f64,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationState {
    pub base_opened: bool,
    pub base_shares: f64,
    pub base_cash: f64,
    pub dca_pool: f64,
    pub dca_shares: f64,
    pub wave_pool: f64,
    pub wave: Option<WavePosition>,
    pub previous_zone: Option<ZoneKind>,
    pub total_invested: f64,
}

impl AllocationState {
    /// Split the configured capital into the three pools.
    pub fn new(config: &SmartConfig) -> Self {
        Self {
            base_opened: false,
            base_shares: 0.0,
            base_cash: config.base_budget(),
            dca_pool: config.dca_budget(),
            dca_shares: 0.0,
            wave_pool: config.wave_budget(),
            wave: None,
            previous_zone: None,
            total_invested: 0.0,
        }
    }

    pub fn wave_shares(&self) -> f64 {
        self.wave.as_ref().map_or(0.0, |w| w.shares)
    }

    pub fn wave_zone(&self) -> Option<TacticalZone> {
        self.wave.as_ref().map(|w| w.zone)
    }

    pub fn wave_last_entry_price(&self) -> Option<f64> {
        self.wave.as_ref().map(|w| w.last_entry_price)
    }

    pub fn wave_add_count(&self) -> u32 {
        self.wave.as_ref().map_or(0, |w| w.add_count)
    }

    pub fn total_shares(&self) -> f64 {
        self.base_shares + self.dca_shares + self.wave_shares()
    }

    pub fn cash(&self) -> f64 {
        self.base_cash + self.dca_pool + self.wave_pool
    }

    /// Shares at `price` plus every remaining cash pool.
    pub fn portfolio_value(&self, price: f64) -> f64 {
        self.total_shares() * price + self.cash()
    }

    /// Advance one period. The order of the phases is part of the contract:
    /// base, classify, contribution, wave unwind, wave entry, valuation, memory.
    pub fn step(&mut self, config: &SmartConfig, point: &PricePoint) -> StepOutcome {
        let mut trades = Vec::new();

        if let Some(trade) = self.open_base(config, point) {
            trades.push(trade);
        }

        let zone = config.zones.classify(point.deviation_pct);
        let entering = self.previous_zone != Some(zone.kind);

        if let Some(trade) = self.contribute(config, point, zone) {
            trades.push(trade);
        }
        if let Some(trade) = self.unwind_wave(config, point, zone.kind, entering) {
            trades.push(trade);
        }
        if let Some(trade) = self.enter_wave(config, point, zone.kind, entering) {
            trades.push(trade);
        }

        let value = self.portfolio_value(point.close);
        self.previous_zone = Some(zone.kind);

        StepOutcome {
            zone,
            entering,
            value,
            trades,
        }
    }

    fn open_base(&mut self, config: &SmartConfig, point: &PricePoint) -> Option<Trade> {
        if self.base_opened || self.base_cash <= config.tolerance() {
            return None;
        }
        let amount = self.base_cash;
        self.base_shares = amount / point.close;
        self.base_cash = 0.0;
        self.base_opened = true;
        self.total_invested += amount;
        Some(Trade {
            kind: TradeKind::BaseOpen,
            date: point.date,
            price: point.close,
            amount,
        })
    }

    fn contribute(&mut self, config: &SmartConfig, point: &PricePoint, zone: Zone) -> Option<Trade> {
        let amount = (config.base_unit * zone.factor).min(self.dca_pool);
        if amount <= config.tolerance() {
            return None;
        }
        self.dca_shares += amount / point.close;
        self.dca_pool -= amount;
        self.total_invested += amount;
        Some(Trade {
            kind: TradeKind::DcaBuy,
            date: point.date,
            price: point.close,
            amount,
        })
    }

    fn unwind_wave(
        &mut self,
        config: &SmartConfig,
        point: &PricePoint,
        zone: ZoneKind,
        entering: bool,
    ) -> Option<Trade> {
        let wave = self.wave.as_mut()?;

        let ladder = config
            .wave
            .params(wave.zone)
            .exit_fraction(point.deviation_pct);
        let forced = if zone.is_overvalued() && entering {
            1.0
        } else {
            0.0
        };
        let fraction = ladder.max(forced);
        if fraction <= 0.0 {
            return None;
        }

        let held_zone = wave.zone;
        let sold = wave.shares * fraction;
        let proceeds = sold * point.close;
        wave.shares -= sold;
        self.wave_pool += proceeds;

        debug!(
            date = %point.date,
            fraction,
            %held_zone,
            proceeds,
            "wave sell"
        );

        if wave.shares * point.close < config.tolerance() {
            self.wave = None;
        }

        Some(Trade {
            kind: TradeKind::WaveSell {
                fraction,
                held_zone,
            },
            date: point.date,
            price: point.close,
            amount: proceeds,
        })
    }

    fn enter_wave(
        &mut self,
        config: &SmartConfig,
        point: &PricePoint,
        zone: ZoneKind,
        entering: bool,
    ) -> Option<Trade> {
        let tactical = zone.tactical()?;
        let tol = config.tolerance();
        if self.wave_pool <= tol {
            return None;
        }
        let params = config.wave.params(tactical);
        let amount = config.wave_unit(tactical).min(self.wave_pool);
        if amount <= tol {
            return None;
        }
        let price = point.close;

        let kind = match self.wave.as_mut() {
            Some(wave) => {
                // Scale-ins only under the zone the position was opened under.
                if wave.zone != tactical || wave.add_count >= params.max_adds {
                    return None;
                }
                let trigger = wave.last_entry_price * (1.0 - params.add_drop_pct / 100.0);
                if price > trigger + tol {
                    return None;
                }
                wave.shares += amount / price;
                wave.last_entry_price = price;
                wave.add_count += 1;
                TradeKind::WaveAdd {
                    n: wave.add_count,
                    zone: tactical,
                }
            }
            None => {
                if !entering {
                    return None;
                }
                self.wave = Some(WavePosition {
                    zone: tactical,
                    shares: amount / price,
                    last_entry_price: price,
                    add_count: 0,
                });
                TradeKind::WaveOpen { zone: tactical }
            }
        };

        self.wave_pool -= amount;
        self.total_invested += amount;
        debug!(date = %point.date, %kind, amount, price, "wave buy");

        Some(Trade {
            kind,
            date: point.date,
            price,
            amount,
        })
    }
}
