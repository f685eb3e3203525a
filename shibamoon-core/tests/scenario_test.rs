//! End-to-end scoring from candle histories through the indicator table.

use chrono::{Duration, TimeZone, Utc};
use shibamoon_core::domain::Candle;
use shibamoon_core::strategy::{FuturesStrategy, GridStrategy, SpotStrategy, Strategy};
use shibamoon_core::table::{Column, IndicatorProfile, IndicatorSeries, MIN_HISTORY};

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: start + Duration::hours(6 * i as i64),
                open,
                high: open.max(close) * 1.005,
                low: open.min(close) * 0.995,
                close,
                volume: 1000.0 + (i % 7) as f64 * 50.0,
            }
        })
        .collect()
}

fn sideways(n: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| 50.0 + (i as f64 * 0.4).sin() * 0.6).collect();
    candles_from_closes(&closes)
}

#[test]
fn young_listing_produces_nothing() {
    let candles = sideways(MIN_HISTORY - 1);
    let spot = IndicatorSeries::compute("NEW/USDT", &candles, &IndicatorProfile::spot());
    let grid = IndicatorSeries::compute("NEW/USDT", &candles, &IndicatorProfile::grid());
    assert!(SpotStrategy::default().analyze(&spot).is_none());
    assert!(FuturesStrategy::default().analyze(&spot).is_none());
    assert!(GridStrategy::default().analyze(&grid).is_none());
}

#[test]
fn sideways_market_gets_a_grid() {
    let candles = sideways(500);
    let series = IndicatorSeries::compute("SIDE/USDT", &candles, &IndicatorProfile::grid());
    let opp = GridStrategy::default().analyze(&series).expect("grid");

    let close = series.last(Column::Close).unwrap();
    assert_eq!(opp.current_price, close);
    assert!(opp.grid_parameters.upper_price > opp.grid_parameters.lower_price);
    assert!(opp.volatility < 2.0, "volatility {}", opp.volatility);
    assert!([6, 8].contains(&opp.grid_parameters.grid_number));
    assert_eq!(opp.grid_parameters.price_precision, 3);
    assert!((5..=7).contains(&opp.leverage));
}

#[test]
fn every_profile_defines_its_columns_after_warmup() {
    let candles = sideways(500);
    for profile in [IndicatorProfile::spot(), IndicatorProfile::futures(), IndicatorProfile::grid()] {
        let series = IndicatorSeries::compute("SIDE/USDT", &candles, &profile);
        for &column in profile.columns {
            assert!(series.last(column).is_ok(), "{} undefined for {}", column, profile.name);
        }
    }
}

#[test]
fn steady_uptrend_scores_trend_fully() {
    let closes: Vec<f64> = (0..300).map(|i| 10.0 * 1.002_f64.powi(i)).collect();
    let candles = candles_from_closes(&closes);
    let series = IndicatorSeries::compute("UP/USDT", &candles, &IndicatorProfile::spot());
    let components = SpotStrategy::default().components(&series).unwrap();
    assert!(series.last(Column::Ema20).unwrap() > series.last(Column::Ema50).unwrap());
    assert!(components.trend_score >= 0.5);
}

#[test]
fn fully_computed_series_serializes() {
    let candles = sideways(200);
    let series = IndicatorSeries::compute("SIDE/USDT", &candles, &IndicatorProfile::futures());
    let row = serde_json::to_value(series.last_row()).unwrap();
    assert!(row["bb_mid"].is_number());
    assert!(row["macd_signal"].is_number());
}
