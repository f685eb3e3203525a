//! Futures scorer: trend- and volume-weighted composite with a directional
//! bias, leverage suggestion and leverage-scaled exits.

use serde::{Deserialize, Serialize};

use super::direction::{DirectionScore, DirectionVotes};
use super::score::{self, ScoreComponents, ScoreWeights};
use super::{log_score_error, FuturesConfig, LeverageEstimator, ScoreError, Strategy, StrategyKind};
use crate::table::{Column, IndicatorProfile, IndicatorSeries, MIN_HISTORY};

const REQUIRED: [Column; 14] = [
    Column::Close,
    Column::Volume,
    Column::Ema20,
    Column::Ema50,
    Column::Macd,
    Column::MacdSignal,
    Column::Rsi,
    Column::Roc,
    Column::BbHigh,
    Column::BbMid,
    Column::BbLow,
    Column::Atr,
    Column::VolumeEma,
    Column::VwapDistance,
];

/// Stop distance is 1% at this leverage and widens 0.5% per step above it.
const REFERENCE_LEVERAGE: f64 = 5.0;

/// Take-profit distance as a multiple of the stop distance.
const REWARD_RISK: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    Long,
    Short,
}

impl PositionType {
    /// Long only on a strictly positive direction score.
    pub fn from_direction(direction: DirectionScore) -> Self {
        if direction > 0.0 {
            PositionType::Long
        } else {
            PositionType::Short
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PositionType::Long => "long",
            PositionType::Short => "short",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuturesOpportunity {
    pub current_price: f64,
    pub position_type: PositionType,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub leverage: u32,
    pub margin: f64,
    pub signals: ScoreComponents,
    pub score: f64,
    pub direction_score: DirectionScore,
}

#[derive(Debug, Clone, Default)]
pub struct FuturesStrategy {
    config: FuturesConfig,
    leverage: LeverageEstimator,
}

impl FuturesStrategy {
    pub fn new(config: FuturesConfig, leverage: LeverageEstimator) -> Self {
        Self { config, leverage }
    }

    pub fn config(&self) -> &FuturesConfig {
        &self.config
    }

    pub fn components(&self, series: &IndicatorSeries) -> Result<ScoreComponents, ScoreError> {
        Ok(ScoreComponents {
            trend_score: score::trend_score(series)?,
            momentum_score: momentum_score(series)?,
            volatility_score: volatility_score(series).or_else(|err| match err {
                ScoreError::MissingData(_) => Err(err),
                _ => {
                    log_score_error("futures", series.symbol(), &err);
                    Ok(0.5)
                }
            })?,
            volume_score: volume_score(series)?,
        })
    }
}

/// Stop-loss and take-profit prices for a position opened at `price`.
pub fn exit_prices(price: f64, position: PositionType, leverage: u32) -> (f64, f64) {
    let stop_pct = 0.01 + 0.005 * (f64::from(leverage) - REFERENCE_LEVERAGE);
    let profit_pct = stop_pct * REWARD_RISK;
    match position {
        PositionType::Long => (price * (1.0 - stop_pct), price * (1.0 + profit_pct)),
        PositionType::Short => (price * (1.0 + stop_pct), price * (1.0 - profit_pct)),
    }
}

impl Strategy for FuturesStrategy {
    type Output = FuturesOpportunity;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Futures
    }

    fn profile(&self) -> IndicatorProfile {
        IndicatorProfile::futures()
    }

    fn evaluate(&self, series: &IndicatorSeries) -> Result<Option<FuturesOpportunity>, ScoreError> {
        series.require_history(MIN_HISTORY)?;
        for column in REQUIRED {
            series.last(column)?;
        }

        let signals = self.components(series)?;
        let direction_score = DirectionVotes::from_series(series)?.score();
        let score = ScoreWeights::FUTURES.combine(&signals);
        if score < self.config.min_score {
            return Ok(None);
        }

        let leverage = self.leverage.futures_leverage(series, direction_score.abs());
        let position_type = PositionType::from_direction(direction_score);
        let price = series.last(Column::Close)?;
        let (stop_loss, take_profit) = exit_prices(price, position_type, leverage);

        Ok(Some(FuturesOpportunity {
            current_price: price,
            position_type,
            stop_loss,
            take_profit,
            leverage,
            margin: self.config.notional / f64::from(leverage),
            signals,
            score,
            direction_score,
        }))
    }
}

/// 0.6 · RSI score + 0.4 · ROC score. RSI peaks at 50.
pub fn momentum_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let rsi = series.last(Column::Rsi)?;
    let distance = (50.0 - rsi).abs();
    let rsi_score = if (40.0..=60.0).contains(&rsi) {
        1.0 - distance / 20.0
    } else if (30.0..=70.0).contains(&rsi) {
        0.7 - distance / 40.0
    } else {
        (0.3 - distance / 50.0).max(0.0)
    };

    let roc = series.last(Column::Roc)?;
    let roc_score = 0.5 + (roc * 0.1).clamp(-0.5, 0.5);

    Ok(0.6 * rsi_score + 0.4 * roc_score)
}

/// Bollinger position measured from the midline, plus the ATR regime.
pub fn volatility_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let range = series.last(Column::BbHigh)? - series.last(Column::BbLow)?;
    if range <= 0.0 {
        return Err(ScoreError::Degenerate("bollinger range is zero".into()));
    }
    let position = (series.last(Column::Close)? - series.last(Column::BbMid)?) / range;
    let bb = score::bb_position_score(position);
    let atr = score::atr_band_score(score::atr_ratio(series)?);
    Ok(0.6 * bb + 0.4 * atr)
}

/// 0.4 · volume trend + 0.6 · VWAP proximity (absolute distance).
pub fn volume_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let distance = series.last(Column::VwapDistance)?.abs();
    let vwap_score = if distance <= 1.0 {
        1.0
    } else if distance <= 3.0 {
        1.0 - (distance - 1.0) / 2.0
    } else {
        (0.5 - (distance - 3.0) / 10.0).max(0.0)
    };
    Ok(0.4 * score::volume_trend(series)? + 0.6 * vwap_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use crate::strategy::fixtures::series_with;

    #[test]
    fn example_market_goes_long() {
        let opp = FuturesStrategy::default()
            .analyze(&series_with(&[]))
            .expect("opportunity");

        assert_approx(opp.signals.momentum_score, 0.88, DEFAULT_EPSILON);
        assert_approx(opp.signals.volatility_score, 0.88, DEFAULT_EPSILON);
        assert_approx(opp.score, 0.952, DEFAULT_EPSILON);
        assert_approx(opp.direction_score, 1.0 / 3.0, DEFAULT_EPSILON);
        assert_eq!(opp.position_type, PositionType::Long);
        assert_eq!(opp.leverage, 8);
        assert_approx(opp.stop_loss, 97.5, 1e-9);
        assert_approx(opp.take_profit, 107.5, 1e-9);
        assert_approx(opp.margin, 875.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bearish_cross_goes_short() {
        let opp = FuturesStrategy::default()
            .analyze(&series_with(&[(Column::Ema20, 95.0)]))
            .expect("opportunity");
        assert_eq!(opp.position_type, PositionType::Short);
        assert!(opp.direction_score < 0.0);
        assert_approx(opp.stop_loss, 102.5, 1e-9);
        assert_approx(opp.take_profit, 92.5, 1e-9);
    }

    #[test]
    fn neutral_direction_is_short() {
        let series = series_with(&[(Column::Rsi, 75.0)]);
        let opp = FuturesStrategy::default().analyze(&series).expect("opportunity");
        assert_eq!(opp.direction_score, 0.0);
        assert_eq!(opp.position_type, PositionType::Short);
    }

    #[test]
    fn below_threshold_is_filtered() {
        let series = series_with(&[
            (Column::Macd, 0.0),
            (Column::VwapDistance, 5.0),
            (Column::Volume, 500.0),
        ]);
        // trend 0.5 + 0.5 * 0 = 0.5, volume 0.6 * 0.3 = 0.18
        let components = FuturesStrategy::default().components(&series).unwrap();
        assert!(ScoreWeights::FUTURES.combine(&components) < 0.70);
        assert!(FuturesStrategy::default().analyze(&series).is_none());
    }

    #[test]
    fn rsi_bands() {
        let rsi_part = |rsi: f64| {
            let s = series_with(&[(Column::Rsi, rsi), (Column::Roc, 0.0)]);
            (momentum_score(&s).unwrap() - 0.4 * 0.5) / 0.6
        };
        assert_approx(rsi_part(50.0), 1.0, 1e-12);
        assert_approx(rsi_part(58.0), 0.6, 1e-12);
        assert_approx(rsi_part(35.0), 0.7 - 15.0 / 40.0, 1e-12);
        assert_approx(rsi_part(20.0), 0.0, 1e-12);
        assert_approx(rsi_part(90.0), 0.0, 1e-12);
    }

    #[test]
    fn vwap_distance_bands() {
        let vwap_part = |d: f64| {
            let s = series_with(&[(Column::VwapDistance, d), (Column::Volume, 100.0)]);
            volume_score(&s).unwrap() / 0.6
        };
        assert_approx(vwap_part(-0.9), 1.0, 1e-12);
        assert_approx(vwap_part(2.0), 0.5, 1e-12);
        assert_approx(vwap_part(-4.0), 0.4, 1e-12);
        assert_approx(vwap_part(12.0), 0.0, 1e-12);
    }

    #[test]
    fn exits_widen_with_leverage() {
        let (sl5, tp5) = exit_prices(100.0, PositionType::Long, 5);
        let (sl10, tp10) = exit_prices(100.0, PositionType::Long, 10);
        assert_approx(sl5, 99.0, 1e-9);
        assert_approx(tp5, 103.0, 1e-9);
        assert_approx(sl10, 96.5, 1e-9);
        assert_approx(tp10, 110.5, 1e-9);
    }

    #[test]
    fn collapsed_bands_use_neutral_volatility() {
        let series = series_with(&[(Column::BbHigh, 100.0), (Column::BbLow, 100.0)]);
        let components = FuturesStrategy::default().components(&series).unwrap();
        assert_eq!(components.volatility_score, 0.5);
    }

    #[test]
    fn position_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PositionType::Short).unwrap(), "\"short\"");
    }
}
