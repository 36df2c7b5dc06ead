//! ZoneLab Core — price series, zone classifier, and allocation engines.
//!
//! This crate is pure computation with no I/O:
//! - Domain types (price points, trades, backtest results)
//! - Series preparation (moving average, deviation, resampling, validation)
//! - Zone classifier over moving-average deviation
//! - Periodic contribution engine and baseline strategies
//! - Smart allocation engine: base, zone-scaled contributions, wave positions

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod zone;

pub use error::InputError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: results and configs can cross thread boundaries,
    /// so independent runs may execute in parallel.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PricePoint>();
        require_sync::<domain::PricePoint>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::BacktestResult>();
        require_sync::<domain::BacktestResult>();

        require_send::<zone::ZoneTable>();
        require_sync::<zone::ZoneTable>();
        require_send::<engine::SmartConfig>();
        require_sync::<engine::SmartConfig>();
        require_send::<engine::SmartEngine>();
        require_sync::<engine::SmartEngine>();
        require_send::<engine::AllocationState>();
        require_sync::<engine::AllocationState>();
        require_send::<InputError>();
        require_sync::<InputError>();
    }
}
