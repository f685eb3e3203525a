//! Average True Range (ATR) with Wilder smoothing.
//!
//! TR[t] = max(high-low, |high-prev_close|, |low-prev_close|). The first
//! candle has no previous close, so the seed window starts at index 1 and the
//! first ATR value lands at index `period`.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }
}

/// True range per candle; index 0 is NaN (no previous close).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    if candles.is_empty() {
        return tr;
    }
    tr.push(f64::NAN);
    tr.extend(candles.windows(2).map(|w| {
        let (prev_close, c) = (w[0].close, &w[1]);
        (c.high - c.low)
            .max((c.high - prev_close).abs())
            .max((c.low - prev_close).abs())
    }));
    tr
}

/// Wilder smoothing (alpha = 1/period) seeded by the mean of the first
/// `period` consecutive valid values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }

    let seed_start = (0..=n - period).find(|&i| values[i..i + period].iter().all(|v| !v.is_nan()));
    let Some(seed_start) = seed_start else {
        return out;
    };

    let seed_end = seed_start + period;
    let mut prev = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = prev;

    let p = period as f64;
    for (slot, &v) in out[seed_end..].iter_mut().zip(&values[seed_end..]) {
        if v.is_nan() {
            break;
        }
        prev = (prev * (p - 1.0) + v) / p;
        *slot = prev;
    }
    out
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "atr"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        wilder_smooth(&true_range(candles), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    fn ohlc(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let mut candles = make_candles(&vec![1.0; data.len()]);
        for (c, &(o, h, l, cl)) in candles.iter_mut().zip(data) {
            c.open = o;
            c.high = h;
            c.low = l;
            c.close = cl;
        }
        candles
    }

    #[test]
    fn true_range_uses_previous_close_on_gaps() {
        let candles = ohlc(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // gap up: |115 - 100| = 15
            (112.0, 113.0, 104.0, 105.0), // max(9, 1, 8) = 9
        ]);
        let tr = true_range(&candles);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let candles = ohlc(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR 8
            (106.0, 107.0, 98.0, 99.0),   // TR 9
            (99.0, 103.0, 97.0, 101.0),   // TR 6
            (101.0, 106.0, 100.0, 105.0), // TR 6
        ]);
        let result = Atr::new(3).compute(&candles);
        assert!(result[2].is_nan());
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], (23.0 / 3.0 * 2.0 + 6.0) / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_smooth_finds_first_valid_window() {
        let values = [f64::NAN, 2.0, f64::NAN, 4.0, 6.0, 8.0];
        let result = wilder_smooth(&values, 2);
        assert!(result[3].is_nan());
        assert_approx(result[4], 5.0, DEFAULT_EPSILON);
        assert_approx(result[5], 6.5, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_empty_input() {
        assert!(Atr::new(14).compute(&[]).is_empty());
    }
}
