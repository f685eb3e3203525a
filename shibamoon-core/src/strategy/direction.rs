//! Directional bias from three independent votes.
//!
//! Each vote is -1, 0 or +1; the direction score is their mean, so it always
//! lies on the lattice {-1, -2/3, -1/3, 0, 1/3, 2/3, 1}.

use serde::Serialize;

use super::ScoreError;
use crate::table::{Column, IndicatorSeries};

/// Mean of the three votes, in [-1, 1]. Positive is bullish.
pub type DirectionScore = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionVotes {
    /// +1 when EMA20 is above EMA50, otherwise -1.
    pub ema_cross: i8,
    /// Contrarian: overbought votes short, oversold votes long.
    pub rsi_extreme: i8,
    /// Contrarian vote on the close relative to the Bollinger midline.
    pub band_position: i8,
}

impl DirectionVotes {
    pub fn from_series(series: &IndicatorSeries) -> Result<Self, ScoreError> {
        let ema_cross = if series.last(Column::Ema20)? > series.last(Column::Ema50)? {
            1
        } else {
            -1
        };

        let rsi = series.last(Column::Rsi)?;
        let rsi_extreme = if rsi > 70.0 {
            -1
        } else if rsi < 30.0 {
            1
        } else {
            0
        };

        let close = series.last(Column::Close)?;
        let mid = series.last(Column::BbMid)?;
        let half_width = series.last(Column::BbHigh)? - mid;
        // Collapsed bands give +-inf (any move off the midline is extreme)
        // or NaN (close on the midline, no vote).
        let position = (close - mid) / half_width;
        let band_position = if position > 0.8 {
            -1
        } else if position < -0.8 {
            1
        } else {
            0
        };

        Ok(Self {
            ema_cross,
            rsi_extreme,
            band_position,
        })
    }

    pub fn as_array(&self) -> [i8; 3] {
        [self.ema_cross, self.rsi_extreme, self.band_position]
    }

    pub fn score(&self) -> DirectionScore {
        let sum: i32 = self.as_array().iter().map(|&v| i32::from(v)).sum();
        f64::from(sum) / 3.0
    }
}

/// Convenience: votes and score in one call.
pub fn direction_score(series: &IndicatorSeries) -> Result<DirectionScore, ScoreError> {
    Ok(DirectionVotes::from_series(series)?.score())
}
