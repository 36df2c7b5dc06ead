//! Domain types for ZoneLab

pub mod price;
pub mod result;
pub mod trade;

pub use price::{deviation_pct, PricePoint};
pub use result::{BacktestResult, ValuePoint};
pub use trade::{Trade, TradeKind};
