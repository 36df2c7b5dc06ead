//! Input contract checks for price series.

use crate::domain::PricePoint;
use crate::error::InputError;

/// Enforce the series contract: non-empty, strictly increasing dates,
/// finite positive closes, finite moving averages where present.
pub fn validate_series(series: &[PricePoint]) -> Result<(), InputError> {
    if series.is_empty() {
        return Err(InputError::EmptySeries);
    }
    for (index, point) in series.iter().enumerate() {
        if !point.close.is_finite() || point.close <= 0.0 {
            return Err(InputError::InvalidClose {
                date: point.date,
                close: point.close,
            });
        }
        if let Some(ma) = point.moving_average {
            if !ma.is_finite() {
                return Err(InputError::InvalidMovingAverage {
                    date: point.date,
                    value: ma,
                });
            }
        }
        if index > 0 {
            let previous = series[index - 1].date;
            if point.date == previous {
                return Err(InputError::DuplicateDate {
                    index,
                    date: point.date,
                });
            }
            if point.date < previous {
                return Err(InputError::Unordered {
                    index,
                    previous,
                    date: point.date,
                });
            }
        }
    }
    Ok(())
}
