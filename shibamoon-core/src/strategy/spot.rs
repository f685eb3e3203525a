//! Spot scorer: equal-weighted trend, momentum, volatility and volume.
//!
//! Emits an opportunity with fixed percentage stop-loss and take-profit when
//! the composite reaches `min_score` (0.65 by default).

use serde::Serialize;

use super::score::{self, ScoreComponents, ScoreWeights};
use super::{clamp01, log_score_error, ScoreError, SpotConfig, Strategy, StrategyKind};
use crate::table::{Column, IndicatorProfile, IndicatorSeries, MIN_HISTORY};

/// Columns that must be defined in the newest row.
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotOpportunity {
    pub current_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Suggested fraction of capital, at most 0.4.
    pub position_size: f64,
    pub signals: ScoreComponents,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SpotStrategy {
    config: SpotConfig,
}

impl SpotStrategy {
    pub fn new(config: SpotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpotConfig {
        &self.config
    }

    pub fn components(&self, series: &IndicatorSeries) -> Result<ScoreComponents, ScoreError> {
        Ok(ScoreComponents {
            trend_score: score::trend_score(series)?,
            momentum_score: momentum_score(series)?,
            volatility_score: volatility_score(series).or_else(|err| match err {
                ScoreError::MissingData(_) => Err(err),
                _ => {
                    log_score_error("spot", series.symbol(), &err);
                    Ok(0.5)
                }
            })?,
            volume_score: volume_score(series)?,
        })
    }

    /// Fraction of capital from the ATR regime plus up to 0.1 for trend.
    pub fn position_size(&self, series: &IndicatorSeries, trend_score: f64) -> Result<f64, ScoreError> {
        let ratio = score::atr_ratio(series)?;
        let base = if ratio <= 0.8 {
            0.3
        } else if ratio <= 1.2 {
            0.2
        } else {
            0.1
        };
        Ok((base + trend_score * 0.1).min(0.4))
    }
}

impl Strategy for SpotStrategy {
    type Output = SpotOpportunity;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Spot
    }

    fn profile(&self) -> IndicatorProfile {
        IndicatorProfile::spot()
    }

    fn evaluate(&self, series: &IndicatorSeries) -> Result<Option<SpotOpportunity>, ScoreError> {
        series.require_history(MIN_HISTORY)?;
        for column in REQUIRED {
            series.last(column)?;
        }

        let signals = self.components(series)?;
        let score = ScoreWeights::SPOT.combine(&signals);
        if score < self.config.min_score {
            return Ok(None);
        }

        let price = series.last(Column::Close)?;
        Ok(Some(SpotOpportunity {
            current_price: price,
            stop_loss: price * (1.0 - self.config.stop_loss_pct),
            take_profit: price * (1.0 + self.config.take_profit_pct),
            position_size: self.position_size(series, signals.trend_score)?,
            signals,
            score,
        }))
    }
}

/// 0.8 · RSI score + 0.2 · ROC score.
pub fn momentum_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let rsi = series.last(Column::Rsi)?;
    let rsi_score = if (45.0..=55.0).contains(&rsi) {
        1.0
    } else if (35.0..=65.0).contains(&rsi) {
        0.8 - (50.0 - rsi).abs() / 30.0
    } else if !(30.0..=70.0).contains(&rsi) {
        0.6
    } else {
        0.4
    };

    let roc = series.last(Column::Roc)?;
    let roc_score = clamp01(0.5 + roc * 0.1);

    Ok(0.8 * rsi_score + 0.2 * roc_score)
}

/// 0.6 · Bollinger position score + 0.4 · ATR regime score.
pub fn volatility_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let low = series.last(Column::BbLow)?;
    let range = series.last(Column::BbHigh)? - low;
    if range <= 0.0 {
        return Err(ScoreError::Degenerate("bollinger range is zero".into()));
    }
    let position = (series.last(Column::Close)? - low) / range;
    let bb = score::bb_position_score(position);
    let atr = score::atr_band_score(score::atr_ratio(series)?);
    Ok(0.6 * bb + 0.4 * atr)
}

/// 0.3 · volume trend + 0.7 · VWAP proximity.
pub fn volume_score(series: &IndicatorSeries) -> Result<f64, ScoreError> {
    let distance = series.last(Column::VwapDistance)?;
    let vwap_score = if distance.abs() <= 0.5 {
        1.0
    } else if distance.abs() <= 2.0 {
        0.8
    } else if distance < -2.0 {
        0.6
    } else {
        0.3
    };
    Ok(0.3 * score::volume_trend(series)? + 0.7 * vwap_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use crate::strategy::fixtures::{series_with, ROWS};

    #[test]
    fn worked_example_emits_opportunity() {
        let series = series_with(&[]);
        let opp = SpotStrategy::default().analyze(&series).expect("opportunity");

        assert_eq!(opp.signals.trend_score, 1.0);
        assert_approx(opp.signals.momentum_score, 0.94, DEFAULT_EPSILON);
        assert_approx(opp.signals.volatility_score, 1.0, DEFAULT_EPSILON);
        assert_approx(opp.signals.volume_score, 1.0, DEFAULT_EPSILON);
        assert_approx(opp.score, 0.985, DEFAULT_EPSILON);
        assert_eq!(opp.current_price, 100.0);
        assert_approx(opp.stop_loss, 95.0, 1e-9);
        assert_approx(opp.take_profit, 110.0, 1e-9);
        assert_approx(opp.position_size, 0.3, DEFAULT_EPSILON);
    }

    #[test]
    fn weak_market_is_filtered() {
        let series = series_with(&[
            (Column::Ema20, 95.0),
            (Column::Macd, -1.0),
            (Column::Rsi, 68.0),
            (Column::Roc, -6.0),
            (Column::Close, 109.0),
            (Column::VwapDistance, 4.0),
            (Column::Volume, 800.0),
        ]);
        assert!(SpotStrategy::default().analyze(&series).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let series = series_with(&[]);
        let strategy = SpotStrategy::new(SpotConfig {
            min_score: ScoreWeights::SPOT.combine(&SpotStrategy::default().components(&series).unwrap()),
            ..SpotConfig::default()
        });
        assert!(strategy.analyze(&series).is_some());
    }

    #[test]
    fn rsi_bands() {
        let at = |rsi: f64| {
            let s = series_with(&[(Column::Rsi, rsi), (Column::Roc, 0.0)]);
            (momentum_score(&s).unwrap() - 0.2 * 0.5) / 0.8
        };
        assert_approx(at(50.0), 1.0, 1e-12);
        assert_approx(at(60.0), 0.8 - 10.0 / 30.0, 1e-12);
        assert_approx(at(25.0), 0.6, 1e-12);
        assert_approx(at(75.0), 0.6, 1e-12);
        assert_approx(at(32.0), 0.4, 1e-12);
        assert_approx(at(30.0), 0.4, 1e-12);
    }

    #[test]
    fn roc_score_clamps_both_ways() {
        let with_roc = |roc: f64| {
            let s = series_with(&[(Column::Roc, roc)]);
            (momentum_score(&s).unwrap() - 0.8) / 0.2
        };
        assert_approx(with_roc(20.0), 1.0, 1e-9);
        assert_approx(with_roc(-20.0), 0.0, 1e-9);
        assert_approx(with_roc(-2.0), 0.3, 1e-9);
    }

    #[test]
    fn collapsed_bands_fall_back_to_neutral_volatility() {
        let series = series_with(&[(Column::BbHigh, 100.0), (Column::BbLow, 100.0)]);
        assert!(matches!(volatility_score(&series), Err(ScoreError::Degenerate(_))));
        let components = SpotStrategy::default().components(&series).unwrap();
        assert_eq!(components.volatility_score, 0.5);
    }

    #[test]
    fn vwap_bands() {
        let at = |d: f64| {
            let s = series_with(&[(Column::VwapDistance, d), (Column::Volume, 100.0)]);
            volume_score(&s).unwrap() / 0.7
        };
        assert_approx(at(-0.5), 1.0, 1e-12);
        assert_approx(at(1.5), 0.8, 1e-12);
        assert_approx(at(-3.0), 0.6, 1e-12);
        assert_approx(at(3.0), 0.3, 1e-12);
    }

    #[test]
    fn short_history_abstains() {
        let short = crate::table::IndicatorSeries::from_columns(
            "NEW/USDT",
            crate::strategy::fixtures::example_row()
                .into_iter()
                .map(|(c, v)| (c, vec![v; MIN_HISTORY - 1])),
        )
        .unwrap();
        assert!(matches!(
            SpotStrategy::default().evaluate(&short),
            Err(ScoreError::MissingData(_))
        ));
        assert!(SpotStrategy::default().analyze(&short).is_none());
        assert!(ROWS >= MIN_HISTORY);
    }

    #[test]
    fn undefined_indicator_abstains() {
        let series = series_with(&[(Column::MacdSignal, f64::NAN)]);
        assert!(SpotStrategy::default().analyze(&series).is_none());
    }

    #[test]
    fn position_size_caps_at_forty_percent() {
        let mut atr = vec![2.0; ROWS];
        atr[ROWS - 1] = 0.5;
        let series = crate::strategy::fixtures::with_column(&series_with(&[]), Column::Atr, atr);
        let size = SpotStrategy::default().position_size(&series, 1.0).unwrap();
        assert_approx(size, 0.4, DEFAULT_EPSILON);
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let series = series_with(&[]);
        let strategy = SpotStrategy::default();
        let a = serde_json::to_string(&strategy.analyze(&series)).unwrap();
        let b = serde_json::to_string(&strategy.analyze(&series)).unwrap();
        assert_eq!(a, b);
    }
}
