//! Leverage suggestion from volatility, volume and price-stability signals.
//!
//! Two modes share the sub-scores below. Futures is the aggressive mode and
//! scales between `base` and `max`; grid is conservative and scales between
//! `base` and `min(max, grid_cap)`. Each sub-score lies in [0, 1], higher
//! meaning more favorable to leverage.
//!
//! The estimator never fails: if any sub-score cannot be computed it logs a
//! warning and returns the base leverage.

use serde::Serialize;

use super::{LeverageConfig, ScoreError};
use crate::stats;
use crate::table::{Column, IndicatorSeries, STABILITY_WINDOW};

/// Futures composite weights: volatility, volume, price stability, depth, trend.
const FUTURES_WEIGHTS: [f64; 5] = [0.30, 0.20, 0.20, 0.15, 0.15];

/// Grid composite weights: volatility stability, range stability, volume.
const GRID_WEIGHTS: [f64; 3] = [0.40, 0.40, 0.20];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuturesLeverageScores {
    pub volatility: f64,
    pub volume_stability: f64,
    pub price_stability: f64,
    pub market_depth: f64,
}

impl FuturesLeverageScores {
    pub fn composite(&self, trend_score: f64) -> f64 {
        let [w_vol, w_volume, w_price, w_depth, w_trend] = FUTURES_WEIGHTS;
        self.volatility * w_vol
            + self.volume_stability * w_volume
            + self.price_stability * w_price
            + self.market_depth * w_depth
            + trend_score.clamp(0.0, 1.0) * w_trend
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridLeverageScores {
    pub volatility_stability: f64,
    pub price_range_stability: f64,
    pub volume_stability: f64,
}

impl GridLeverageScores {
    pub fn composite(&self) -> f64 {
        let [w_vol, w_range, w_volume] = GRID_WEIGHTS;
        self.volatility_stability * w_vol
            + self.price_range_stability * w_range
            + self.volume_stability * w_volume
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverageEstimator {
    config: LeverageConfig,
}

impl Default for LeverageEstimator {
    fn default() -> Self {
        Self::new(LeverageConfig::default())
    }
}

impl LeverageEstimator {
    pub fn new(config: LeverageConfig) -> Self {
        Self { config }
    }

    pub fn base(&self) -> u32 {
        self.config.base
    }

    pub fn max(&self) -> u32 {
        self.config.max
    }

    /// Ceiling for grid leverage.
    pub fn grid_max(&self) -> u32 {
        self.config.max.min(self.config.grid_cap)
    }

    pub fn futures_scores(&self, series: &IndicatorSeries) -> Result<FuturesLeverageScores, ScoreError> {
        Ok(FuturesLeverageScores {
            volatility: volatility_score(series)?,
            volume_stability: volume_stability_score(series)?,
            price_stability: price_stability_score(series)?,
            market_depth: market_depth_score(series)?,
        })
    }

    pub fn grid_scores(&self, series: &IndicatorSeries) -> Result<GridLeverageScores, ScoreError> {
        Ok(GridLeverageScores {
            volatility_stability: volatility_stability_score(series)?,
            price_range_stability: price_range_stability_score(series)?,
            volume_stability: volume_stability_score(series)?,
        })
    }

    /// Futures leverage in `[base, max]`. `trend_score` is expected in [0, 1].
    pub fn futures_leverage(&self, series: &IndicatorSeries, trend_score: f64) -> u32 {
        match self.futures_scores(series) {
            Ok(scores) => scale(scores.composite(trend_score), self.base(), self.max()),
            Err(err) => {
                tracing::warn!(symbol = series.symbol(), error = %err, "futures leverage falling back to base");
                self.base()
            }
        }
    }

    /// Grid leverage in `[base, grid_max]`; never above `grid_max`, even when
    /// `base` is configured higher.
    pub fn grid_leverage(&self, series: &IndicatorSeries) -> u32 {
        match self.grid_scores(series) {
            Ok(scores) => scale(scores.composite(), self.base(), self.grid_max()),
            Err(err) => {
                tracing::warn!(symbol = series.symbol(), error = %err, "grid leverage falling back to base");
                self.base().min(self.grid_max())
            }
        }
    }
}

/// `base + round(composite · (ceiling - base))`, clamped to `[base, ceiling]`.
///
/// Rounds half to even. The ceiling is applied last, so a ceiling below base
/// wins over base.
pub fn scale(composite: f64, base: u32, ceiling: u32) -> u32 {
    let span = f64::from(ceiling.saturating_sub(base));
    let step = (composite * span).round_ties_even();
    let leverage = if !step.is_finite() || step <= 0.0 {
        base
    } else {
        base + step as u32
    };
    leverage.min(ceiling)
}

/// Coefficient of variation with the non-positive-mean guard (CV = 1.0).
fn guarded_cv(values: &[f64], what: &str) -> Result<f64, ScoreError> {
    let mean = stats::mean(values).ok_or_else(|| ScoreError::MissingData(what.to_string()))?;
    if mean <= 0.0 {
        return Ok(1.0);
    }
    let std = stats::sample_std(values).ok_or_else(|| ScoreError::MissingData(what.to_string()))?;
    Ok(std / mean)
}

/// Current ATR relative to its trailing mean.
pub fn volatility_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    Ok(volatility_band(super::score::atr_ratio(series)?))
}

pub fn volatility_band(atr_ratio: f64) -> f64 {
    if atr_ratio <= 0.8 {
        1.0
    } else if atr_ratio <= 1.2 {
        0.8
    } else if atr_ratio <= 1.5 {
        0.5
    } else {
        0.2
    }
}

/// CV of trailing volume.
pub fn volume_stability_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let cv = guarded_cv(series.tail(Column::Volume, STABILITY_WINDOW)?, "volume window")?;
    Ok(volume_stability_band(cv))
}

pub fn volume_stability_band(cv: f64) -> f64 {
    if cv < 0.5 {
        1.0
    } else if cv < 1.0 {
        0.8
    } else if cv < 1.5 {
        0.5
    } else {
        0.2
    }
}

/// Normalized Bollinger width at the newest row.
pub fn price_stability_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let mid = series.last(Column::BbMid)?;
    if mid == 0.0 {
        return Err(ScoreError::Degenerate("bb_mid is zero".into()));
    }
    let width = (series.last(Column::BbHigh)? - series.last(Column::BbLow)?) / mid;
    Ok(if width < 0.02 {
        1.0
    } else if width < 0.04 {
        0.8
    } else if width < 0.06 {
        0.5
    } else {
        0.2
    })
}

/// Newest volume relative to the trailing mean volume.
pub fn market_depth_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let current = series.last(Column::Volume)?;
    let ratio = match stats::mean(series.tail(Column::Volume, STABILITY_WINDOW)?) {
        Some(mean) if mean > 0.0 => current / mean,
        _ => 1.0,
    };
    Ok(if ratio > 1.5 {
        1.0
    } else if ratio > 1.0 {
        0.8
    } else if ratio > 0.5 {
        0.5
    } else {
        0.2
    })
}

/// CV of trailing ATR.
pub fn volatility_stability_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let cv = guarded_cv(series.tail(Column::Atr, STABILITY_WINDOW)?, "atr window")?;
    Ok(if cv < 0.3 {
        1.0
    } else if cv < 0.5 {
        0.8
    } else if cv < 0.7 {
        0.5
    } else {
        0.2
    })
}

/// CV of the trailing normalized Bollinger width series.
pub fn price_range_stability_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let high = series.tail(Column::BbHigh, STABILITY_WINDOW)?;
    let low = series.tail(Column::BbLow, STABILITY_WINDOW)?;
    let mid = series.tail(Column::BbMid, STABILITY_WINDOW)?;
    if mid.iter().any(|&m| m == 0.0) {
        return Err(ScoreError::Degenerate("bb_mid is zero in window".into()));
    }
    let widths: Vec<f64> = high
        .iter()
        .zip(low)
        .zip(mid)
        .map(|((h, l), m)| (h - l) / m)
        .collect();
    let cv = guarded_cv(&widths, "bollinger width window")?;
    Ok(if cv < 0.2 {
        1.0
    } else if cv < 0.4 {
        0.8
    } else if cv < 0.6 {
        0.5
    } else {
        0.2
    })
}
