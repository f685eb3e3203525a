//! Volume-derived columns: volume EMA and cumulative VWAP.
//!
//! VWAP[t] = Σ(volume · typical_price) / Σ volume over candles 0..=t.
//! The distance output is (close - vwap) / vwap · 100.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Candle;

/// EMA of traded volume.
#[derive(Debug, Clone)]
pub struct VolumeEma {
    period: usize,
}

impl VolumeEma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume EMA period must be >= 1");
        Self { period }
    }
}

impl Indicator for VolumeEma {
    fn name(&self) -> &str {
        "volume_ema"
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        ema_of_series(&volumes, self.period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VwapOutput {
    Price,
    Distance,
}

/// Cumulative VWAP anchored at the first candle of the series.
#[derive(Debug, Clone)]
pub struct Vwap {
    output: VwapOutput,
}

impl Vwap {
    pub fn price() -> Self {
        Self {
            output: VwapOutput::Price,
        }
    }

    pub fn distance() -> Self {
        Self {
            output: VwapOutput::Distance,
        }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        match self.output {
            VwapOutput::Price => "vwap",
            VwapOutput::Distance => "vwap_distance",
        }
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut pv_sum = 0.0;
        let mut vol_sum = 0.0;
        candles
            .iter()
            .map(|c| {
                pv_sum += c.volume * c.typical_price();
                vol_sum += c.volume;
                // No volume traded yet: VWAP is undefined.
                let vwap = if vol_sum > 0.0 { pv_sum / vol_sum } else { f64::NAN };
                match self.output {
                    VwapOutput::Price => vwap,
                    VwapOutput::Distance => (c.close - vwap) / vwap * 100.0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn vwap_weights_by_volume() {
        let mut candles = make_candles(&[10.0, 20.0]);
        for c in candles.iter_mut() {
            c.high = c.close;
            c.low = c.close;
        }
        candles[0].volume = 3.0;
        candles[1].volume = 1.0;
        let vwap = Vwap::price().compute(&candles);
        assert_approx(vwap[0], 10.0, DEFAULT_EPSILON);
        assert_approx(vwap[1], (30.0 + 20.0) / 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_distance_is_percent_of_vwap() {
        let mut candles = make_candles(&[10.0, 20.0]);
        for c in candles.iter_mut() {
            c.high = c.close;
            c.low = c.close;
        }
        let distance = Vwap::distance().compute(&candles);
        assert_approx(distance[0], 0.0, DEFAULT_EPSILON);
        // vwap = 15, close = 20 -> +33.3%
        assert_approx(distance[1], 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn zero_volume_prefix_is_undefined() {
        let mut candles = make_candles(&[1.0, 1.0]);
        candles[0].volume = 0.0;
        let vwap = Vwap::price().compute(&candles);
        assert!(vwap[0].is_nan());
        assert!(!vwap[1].is_nan());
    }

    #[test]
    fn volume_ema_smooths_volume_not_price() {
        let mut candles = make_candles(&[5.0, 6.0, 7.0]);
        for (c, v) in candles.iter_mut().zip([100.0, 200.0, 300.0]) {
            c.volume = v;
        }
        let result = VolumeEma::new(2).compute(&candles);
        assert_approx(result[1], 150.0, DEFAULT_EPSILON);
        assert_approx(result[2], 2.0 / 3.0 * 300.0 + 1.0 / 3.0 * 150.0, 1e-9);
    }
}
