//! Relative Strength Index (RSI), Wilder smoothing of gains and losses.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss). Lookback: period.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut out = vec![f64::NAN; n];
        if n <= self.period {
            return out;
        }

        let changes: Vec<f64> = candles.windows(2).map(|w| w[1].close - w[0].close).collect();
        let seed = &changes[..self.period];
        if seed.iter().any(|c| c.is_nan()) {
            return out;
        }

        let period = self.period as f64;
        let mut avg_gain = seed.iter().filter(|c| **c > 0.0).sum::<f64>() / period;
        let mut avg_loss = -seed.iter().filter(|c| **c < 0.0).sum::<f64>() / period;
        out[self.period] = rsi_value(avg_gain, avg_loss);

        for (i, &change) in changes.iter().enumerate().skip(self.period) {
            if change.is_nan() {
                break;
            }
            avg_gain = (avg_gain * (period - 1.0) + change.max(0.0)) / period;
            avg_loss = (avg_loss * (period - 1.0) + (-change).max(0.0)) / period;
            out[i + 1] = rsi_value(avg_gain, avg_loss);
        }
        out
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (_, true) => 100.0,
        (true, _) => 0.0,
        _ => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}
