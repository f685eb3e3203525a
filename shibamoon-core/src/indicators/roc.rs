//! Rate of Change (ROC): percent change of close over `period` candles.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self { period }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        "roc"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut out = vec![f64::NAN; candles.len()];
        for (i, pair) in candles.windows(self.period + 1).enumerate() {
            let prev = pair[0].close;
            let curr = pair[self.period].close;
            if prev != 0.0 {
                // NaN inputs propagate through the arithmetic.
                out[i + self.period] = (curr - prev) / prev * 100.0;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn roc_over_two_candles() {
        let candles = make_candles(&[0.20, 0.21, 0.25]);
        let result = Roc::new(2).compute(&candles);
        assert!(result[1].is_nan());
        assert_approx(result[2], 25.0, 1e-9);
    }

    #[test]
    fn roc_negative() {
        let candles = make_candles(&[40_000.0, 36_000.0]);
        let result = Roc::new(1).compute(&candles);
        assert_approx(result[1], -10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn roc_zero_base_is_undefined() {
        let candles = make_candles(&[0.0, 1.0]);
        assert!(Roc::new(1).compute(&candles)[1].is_nan());
    }

    #[test]
    fn roc_short_series_is_all_nan() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        assert!(Roc::new(12).compute(&candles).iter().all(|v| v.is_nan()));
    }
}
