//! Indicators computed over closing prices.

pub mod sma;

pub use sma::{moving_average, Sma};
