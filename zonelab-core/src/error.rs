//! Input validation errors.
//!
//! Raised before any period is processed: a run either sees clean input or
//! returns nothing.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("dates out of order at index {index}: {date} does not follow {previous}")]
    Unordered {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("duplicate date {date} at index {index}")]
    DuplicateDate { index: usize, date: NaiveDate },

    #[error("invalid close {close} on {date} (must be finite and > 0)")]
    InvalidClose { date: NaiveDate, close: f64 },

    #[error("invalid moving average {value} on {date} (must be finite)")]
    InvalidMovingAverage { date: NaiveDate, value: f64 },

    #[error("allocation ratios sum to {sum}, expected 1.0")]
    RatiosDoNotSumToOne { sum: f64 },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid zone table: {0}")]
    InvalidZoneTable(String),
}
