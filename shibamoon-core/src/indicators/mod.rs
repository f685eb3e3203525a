//! Indicator computation over candle history.
//!
//! This is the collaborator that turns raw OHLCV candles into the derived
//! columns the scorers read. Every indicator is a pure function of the
//! candle slice: output has the same length as the input, warm-up positions
//! hold `f64::NAN`, and no value at index t depends on candles after t.
//!
//! Multi-output indicators (Bollinger, MACD, VWAP) are exposed as separate
//! named instances per output, keeping the single-series `Indicator` trait.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod volume;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use roc::Roc;
pub use rsi::Rsi;
pub use volume::{VolumeEma, Vwap, VwapOutput};

use crate::domain::Candle;

/// Trait for indicators.
///
/// Implementations take the full candle series and produce a numeric series
/// of the same length. The first `lookback()` values are `f64::NAN`.
pub trait Indicator: Send + Sync {
    /// Column name the output is stored under (e.g. "ema_20", "bb_high").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Create synthetic candles from close prices for testing.
///
/// open = previous close (or close for the first candle),
/// high/low = max/min(open, close) ± 1.0, volume = 1000, 6h spacing.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: start + chrono::Duration::hours(6 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
