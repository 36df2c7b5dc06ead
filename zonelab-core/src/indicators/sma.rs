//! Simple Moving Average (SMA) over closing prices.
//!
//! Lookback: period - 1 (first value at index period-1). Earlier indices are
//! `None`, which downstream code reads as "not warmed up yet".

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// `period` of zero is treated as one.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let n = closes.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        let mut sum: f64 = closes[..self.period].iter().sum();
        result[self.period - 1] = Some(sum / self.period as f64);

        // Roll the window forward
        for i in self.period..n {
            sum += closes[i] - closes[i - self.period];
            result[i] = Some(sum / self.period as f64);
        }
        result
    }
}

/// Trailing simple moving average of `closes`.
pub fn moving_average(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    Sma::new(period).compute(closes)
}
