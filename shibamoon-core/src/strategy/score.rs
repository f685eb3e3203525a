//! Sub-score families shared by the spot and futures scorers.

use serde::{Deserialize, Serialize};

use super::{clamp01, ScoreError};
use crate::stats;
use crate::table::{Column, IndicatorSeries, STABILITY_WINDOW};

/// The four named sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub trend_score: f64,
    pub momentum_score: f64,
    pub volatility_score: f64,
    pub volume_score: f64,
}

impl ScoreComponents {
    pub fn values(&self) -> [f64; 4] {
        [
            self.trend_score,
            self.momentum_score,
            self.volatility_score,
            self.volume_score,
        ]
    }
}

/// Convex weights over [`ScoreComponents`]. Each preset sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub volume: f64,
}

impl ScoreWeights {
    pub const SPOT: ScoreWeights = ScoreWeights {
        trend: 0.25,
        momentum: 0.25,
        volatility: 0.25,
        volume: 0.25,
    };

    pub const FUTURES: ScoreWeights = ScoreWeights {
        trend: 0.3,
        momentum: 0.2,
        volatility: 0.2,
        volume: 0.3,
    };

    pub fn sum(&self) -> f64 {
        self.trend + self.momentum + self.volatility + self.volume
    }

    pub fn combine(&self, c: &ScoreComponents) -> f64 {
        c.trend_score * self.trend
            + c.momentum_score * self.momentum
            + c.volatility_score * self.volatility
            + c.volume_score * self.volume
    }
}

/// 0.5 · EMA cross + 0.5 · MACD histogram score.
pub fn trend_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let ema_trend = if series.last(Column::Ema20)? > series.last(Column::Ema50)? {
        1.0
    } else {
        0.0
    };
    let macd = series.last(Column::Macd)?;
    let signal = series.last(Column::MacdSignal)?;
    let macd_score = if macd > signal {
        clamp01(0.5 + (macd - signal) * 15.0)
    } else {
        clamp01(0.5 - (signal - macd) * 15.0)
    };
    Ok(0.5 * ema_trend + 0.5 * macd_score)
}

/// Current ATR over the trailing mean ATR. A non-positive or undefined
/// mean yields 1.0.
pub fn atr_ratio(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let current = series.last(Column::Atr)?;
    let window = series.tail(Column::Atr, STABILITY_WINDOW)?;
    Ok(match stats::mean(window) {
        Some(mean) if mean > 0.0 => current / mean,
        _ => 1.0,
    })
}

/// ATR ratio bands used by the spot and futures volatility scores.
pub fn atr_band_score(ratio: f64) -> f64 {
    if (0.5..=1.5).contains(&ratio) {
        1.0
    } else if ratio > 1.5 && ratio <= 2.0 {
        0.7
    } else if (0.3..0.5).contains(&ratio) {
        0.5
    } else {
        0.3
    }
}

/// Bollinger position bands: near the lower band scores high, near the
/// upper band low, the middle peaks at 0.5.
pub fn bb_position_score(position: f64) -> f64 {
    if position <= 0.2 {
        0.8
    } else if position >= 0.8 {
        0.3
    } else {
        1.0 - (0.5 - position).abs()
    }
}

/// 1.0 when the newest volume is above its EMA.
pub fn volume_trend(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    Ok(if series.last(Column::Volume)? > series.last(Column::VolumeEma)? {
        1.0
    } else {
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::fixtures::{flat_series, example_row, series_with, with_column, ROWS};

    #[test]
    fn weight_presets_sum_to_one() {
        assert!((ScoreWeights::SPOT.sum() - 1.0).abs() < 1e-12);
        assert!((ScoreWeights::FUTURES.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trend_saturates_on_wide_histogram() {
        let series = flat_series(&example_row());
        assert_eq!(trend_score(&series).unwrap(), 1.0);
    }

    #[test]
    fn trend_bearish_cross_with_small_histogram() {
        let series = series_with(&[
            (Column::Ema20, 95.0),
            (Column::Macd, 0.5),
            (Column::MacdSignal, 0.52),
        ]);
        // 0.5 - 0.02 * 15 = 0.2
        let t = trend_score(&series).unwrap();
        assert!((t - 0.1).abs() < 1e-9, "got {t}");
    }

    #[test]
    fn atr_ratio_guards_zero_mean() {
        let series = series_with(&[]);
        let zeroed = with_column(&series, Column::Atr, vec![0.0; ROWS]);
        assert_eq!(atr_ratio(&zeroed).unwrap(), 1.0);
    }

    #[test]
    fn atr_ratio_uses_trailing_window() {
        let mut atr = vec![100.0; ROWS];
        for v in atr.iter_mut().skip(ROWS - STABILITY_WINDOW) {
            *v = 1.0;
        }
        atr[ROWS - 1] = 2.9;
        let series = with_column(&series_with(&[]), Column::Atr, atr);
        // mean of 19 ones and 2.9 = 1.095
        let r = atr_ratio(&series).unwrap();
        assert!((r - 2.9 / 1.095).abs() < 1e-9);
    }

    #[test]
    fn atr_bands() {
        assert_eq!(atr_band_score(1.0), 1.0);
        assert_eq!(atr_band_score(1.5), 1.0);
        assert_eq!(atr_band_score(1.8), 0.7);
        assert_eq!(atr_band_score(0.4), 0.5);
        assert_eq!(atr_band_score(0.1), 0.3);
        assert_eq!(atr_band_score(2.5), 0.3);
    }

    #[test]
    fn bb_position_bands() {
        assert_eq!(bb_position_score(0.1), 0.8);
        assert_eq!(bb_position_score(0.9), 0.3);
        assert_eq!(bb_position_score(0.5), 1.0);
        assert!((bb_position_score(0.3) - 0.8).abs() < 1e-12);
    }
}
