//! Bollinger Bands: SMA(close, period) ± multiplier · population stddev.
//!
//! Each band is a separate indicator instance. Lookback: period - 1.

use super::Indicator;
use crate::domain::Candle;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
}

impl Bollinger {
    pub fn new(band: BollingerBand, period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            band,
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Upper, period, multiplier)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Middle, period, multiplier)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Lower, period, multiplier)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        match self.band {
            BollingerBand::Upper => "bb_high",
            BollingerBand::Middle => "bb_mid",
            BollingerBand::Lower => "bb_low",
        }
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut out = vec![f64::NAN; candles.len()];
        let len = self.period as f64;

        for (i, window) in candles.windows(self.period).enumerate() {
            let mean = window.iter().map(|c| c.close).sum::<f64>() / len;
            if mean.is_nan() {
                continue;
            }
            let value = match self.band {
                BollingerBand::Middle => mean,
                band => {
                    let variance =
                        window.iter().map(|c| (c.close - mean).powi(2)).sum::<f64>() / len;
                    let offset = self.multiplier * variance.sqrt();
                    if band == BollingerBand::Upper {
                        mean + offset
                    } else {
                        mean - offset
                    }
                }
            };
            out[i + self.period - 1] = value;
        }
        out
    }
}
