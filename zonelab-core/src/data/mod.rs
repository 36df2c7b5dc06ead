//! Series preparation: validation, moving-average deviation, resampling.
//!
//! The engine never sees raw rows. Data sources hand over `RawPrice` rows,
//! `prepare_series` turns them into a validated `PricePoint` series, and
//! `resample` selects the periods a strategy steps through.

pub mod prepare;
pub mod resample;
pub mod validate;

pub use prepare::{first_with_moving_average, prepare_series, RawPrice, DEFAULT_MA_PERIOD};
pub use resample::{resample, Cadence};
pub use validate::validate_series;
