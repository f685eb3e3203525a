//! Grid scorer: range-trading setup around the Bollinger bands.
//!
//! The grid is emitted whenever its volatility and parameters compute. A
//! minimum score can be configured, but none applies by default.

use serde::{Deserialize, Serialize};

use super::direction::{DirectionScore, DirectionVotes};
use super::{GridConfig, LeverageEstimator, ScoreError, Strategy, StrategyKind};
use crate::stats;
use crate::table::{Column, IndicatorProfile, IndicatorSeries, MIN_HISTORY, STABILITY_WINDOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    Neutral,
    LongBias,
    ShortBias,
}

impl GridType {
    pub fn from_direction(direction: DirectionScore) -> Self {
        if direction > 0.5 {
            GridType::LongBias
        } else if direction < -0.5 {
            GridType::ShortBias
        } else {
            GridType::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GridType::Neutral => "neutral",
            GridType::LongBias => "long_bias",
            GridType::ShortBias => "short_bias",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridParameters {
    pub upper_price: f64,
    pub lower_price: f64,
    /// One of 6, 8 or 12.
    pub grid_number: u32,
    pub grid_spacing: f64,
    pub investment_per_grid: f64,
    pub price_precision: u32,
    pub quantity_precision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridOpportunity {
    pub current_price: f64,
    pub grid_type: GridType,
    pub direction_score: DirectionScore,
    /// ATR as a percentage of price.
    pub volatility: f64,
    pub leverage: u32,
    pub grid_parameters: GridParameters,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GridStrategy {
    config: GridConfig,
    leverage: LeverageEstimator,
}

impl GridStrategy {
    pub fn new(config: GridConfig, leverage: LeverageEstimator) -> Self {
        Self { config, leverage }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Widening factor for the grid bounds: 1% per leverage step above 2x.
    pub fn range_adjustment(&self) -> f64 {
        1.0 + 0.01 * (f64::from(self.leverage.base()) - 2.0)
    }

    pub fn parameters(&self, series: &IndicatorSeries, volatility: f64) -> Result<GridParameters, ScoreError> {
        let price = series.last(Column::Close)?;
        let high = series.last(Column::BbHigh)?;
        let low = series.last(Column::BbLow)?;
        let mid = series.last(Column::BbMid)?;
        let adjustment = self.range_adjustment();

        let (upper_price, lower_price) = if price > mid {
            (high * adjustment, mid * (2.0 - adjustment))
        } else {
            (mid * adjustment, low * (2.0 - adjustment))
        };

        let grid_number = grid_count(volatility);
        let levels = f64::from(grid_number);
        Ok(GridParameters {
            upper_price,
            lower_price,
            grid_number,
            grid_spacing: (upper_price - lower_price) / levels,
            investment_per_grid: self.config.notional / levels,
            price_precision: price_precision(price),
            quantity_precision: self.config.quantity_precision,
        })
    }

    /// 0.4 · ranging + 0.3 · liquidity + 0.3 · volatility penalty, at most 1.
    pub fn strategy_score(&self, series: &IndicatorSeries, volatility: f64) -> Result<f64, ScoreError> {
        let score = 0.4 * ranging_score(series)?
            + 0.3 * liquidity_score(series)?
            + 0.3 * volatility_penalty(volatility);
        Ok(score.min(1.0))
    }
}

impl Strategy for GridStrategy {
    type Output = GridOpportunity;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Grid
    }

    fn profile(&self) -> IndicatorProfile {
        IndicatorProfile::grid()
    }

    fn evaluate(&self, series: &IndicatorSeries) -> Result<Option<GridOpportunity>, ScoreError> {
        series.require_history(MIN_HISTORY)?;

        let volatility = volatility_pct(series)?;
        let grid_parameters = self.parameters(series, volatility)?;
        let leverage = self.leverage.grid_leverage(series);
        let direction_score = DirectionVotes::from_series(series)?.score();
        let score = self.strategy_score(series, volatility)?;

        if let Some(min_score) = self.config.min_score {
            if score < min_score {
                return Ok(None);
            }
        }

        Ok(Some(GridOpportunity {
            current_price: series.last(Column::Close)?,
            grid_type: GridType::from_direction(direction_score),
            direction_score,
            volatility,
            leverage,
            grid_parameters,
            score,
        }))
    }
}

/// ATR as a percentage of the close.
pub fn volatility_pct(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let price = series.last(Column::Close)?;
    if price <= 0.0 {
        return Err(ScoreError::Degenerate(format!("non-positive close {price}")));
    }
    Ok(series.last(Column::Atr)? / price * 100.0)
}

/// Grid levels by volatility: below 1% six, below 2% eight, otherwise twelve.
pub fn grid_count(volatility: f64) -> u32 {
    if volatility < 1.0 {
        6
    } else if volatility < 2.0 {
        8
    } else {
        12
    }
}

/// Decimal places for quoting a price of this magnitude.
pub fn price_precision(price: f64) -> u32 {
    match price {
        p if p < 0.1 => 6,
        p if p < 1.0 => 5,
        p if p < 10.0 => 4,
        p if p < 100.0 => 3,
        p if p < 1000.0 => 2,
        _ => 1,
    }
}

/// Narrow trailing RSI range indicates a sideways market.
pub fn ranging_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let window = series.tail(Column::Rsi, STABILITY_WINDOW)?;
    let range = stats::range(window).ok_or_else(|| ScoreError::MissingData("rsi window".into()))?;
    Ok(if range < 20.0 {
        1.0
    } else if range < 30.0 {
        0.7
    } else {
        0.3
    })
}

/// Stable trailing volume scores high. An undefined CV (no positive mean)
/// lands in the lowest band.
pub fn liquidity_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let window = series.tail(Column::Volume, STABILITY_WINDOW)?;
    if stats::mean(window).is_none() {
        return Err(ScoreError::MissingData("volume window is empty".into()));
    }
    Ok(match stats::coefficient_of_variation(window) {
        Some(cv) if cv < 0.5 => 1.0,
        Some(cv) if cv < 1.0 => 0.7,
        _ => 0.4,
    })
}

/// 1.0 up to 3% volatility, then falling 0.2 per point to a floor of 0.3.
pub fn volatility_penalty(volatility: f64) -> f64 {
    if volatility > 3.0 {
        (1.0 - (volatility - 3.0) * 0.2).max(0.3)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use crate::strategy::fixtures::{series_with, with_column, ROWS};

    #[test]
    fn example_market_grid_below_midline() {
        let opp = GridStrategy::default()
            .analyze(&series_with(&[]))
            .expect("grid");
        let p = &opp.grid_parameters;

        assert_approx(opp.volatility, 2.0, 1e-12);
        assert_eq!(p.grid_number, 12);
        assert_approx(p.upper_price, 103.0, 1e-9);
        assert_approx(p.lower_price, 87.3, 1e-9);
        assert_approx(p.grid_spacing, 15.7 / 12.0, 1e-9);
        assert_approx(p.investment_per_grid, 7000.0 / 12.0, 1e-9);
        assert_eq!(p.price_precision, 2);
        assert_eq!(p.quantity_precision, 3);
        assert_eq!(opp.grid_type, GridType::Neutral);
        assert_eq!(opp.leverage, 7);
        assert_approx(opp.score, 1.0, 1e-12);
    }

    #[test]
    fn bounds_above_midline_use_upper_band() {
        let series = series_with(&[(Column::Close, 101.0)]);
        let p = GridStrategy::default().parameters(&series, 1.5).unwrap();
        assert_approx(p.upper_price, 113.3, 1e-9);
        assert_approx(p.lower_price, 97.0, 1e-9);
        assert_eq!(p.grid_number, 8);
    }

    #[test]
    fn grid_count_thresholds() {
        assert_eq!(grid_count(0.99), 6);
        assert_eq!(grid_count(1.0), 8);
        assert_eq!(grid_count(1.99), 8);
        assert_eq!(grid_count(2.0), 12);
        assert_eq!(grid_count(40.0), 12);
    }

    #[test]
    fn price_precision_table() {
        assert_eq!(price_precision(0.05), 6);
        assert_eq!(price_precision(0.5), 5);
        assert_eq!(price_precision(5.0), 4);
        assert_eq!(price_precision(50.0), 3);
        assert_eq!(price_precision(500.0), 2);
        assert_eq!(price_precision(65_000.0), 1);
    }

    #[test]
    fn volatility_penalty_floor() {
        assert_eq!(volatility_penalty(3.0), 1.0);
        assert_approx(volatility_penalty(5.0), 0.6, 1e-12);
        assert_eq!(volatility_penalty(20.0), 0.3);
    }

    #[test]
    fn trending_rsi_lowers_score() {
        let rsi: Vec<f64> = (0..ROWS).map(|i| 10.0 + i as f64 * 1.2).collect();
        let series = with_column(&series_with(&[]), Column::Rsi, rsi);
        assert_eq!(ranging_score(&series).unwrap(), 0.7);
    }

    #[test]
    fn zero_price_abstains() {
        let series = series_with(&[(Column::Close, 0.0)]);
        assert!(matches!(volatility_pct(&series), Err(ScoreError::Degenerate(_))));
        assert!(GridStrategy::default().analyze(&series).is_none());
    }

    #[test]
    fn dead_volume_still_emits() {
        let series = with_column(&series_with(&[]), Column::Volume, vec![0.0; ROWS]);
        assert_eq!(liquidity_score(&series).unwrap(), 0.4);
        let opp = GridStrategy::default().analyze(&series).unwrap();
        assert_eq!(opp.grid_parameters.grid_number, 12);
        assert!(opp.score < 1.0);
    }

    #[test]
    fn ungated_by_default() {
        // Strongly trending and volatile: low score, still emitted.
        let rsi: Vec<f64> = (0..ROWS).map(|i| i as f64 * 1.6).collect();
        let series = with_column(&series_with(&[(Column::Atr, 9.0)]), Column::Rsi, rsi);
        let opp = GridStrategy::default().analyze(&series).expect("grid");
        assert!(opp.score < 0.65);

        let gated = GridStrategy::new(
            GridConfig {
                min_score: Some(0.65),
                ..GridConfig::default()
            },
            LeverageEstimator::default(),
        );
        assert!(gated.analyze(&series).is_none());
    }

    #[test]
    fn strong_bias_sets_grid_type() {
        let series = series_with(&[(Column::Rsi, 25.0), (Column::Close, 91.0)]);
        let opp = GridStrategy::default().analyze(&series).expect("grid");
        assert_eq!(opp.grid_type, GridType::LongBias);
        assert_eq!(GridType::from_direction(-2.0 / 3.0), GridType::ShortBias);
        assert_eq!(serde_json::to_string(&GridType::LongBias).unwrap(), "\"long_bias\"");
    }
}
