//! MACD: EMA(fast) - EMA(slow) and its EMA(signal) smoothing.
//!
//! The line and the signal are separate indicator instances. The line is
//! defined from index `slow - 1`, the signal from `slow + signal - 2`.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
}

impl Macd {
    pub fn new(output: MacdOutput, fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed the fast period");
        Self {
            fast,
            slow,
            signal,
            output,
        }
    }

    /// Standard 12/26/9 MACD line.
    pub fn line() -> Self {
        Self::new(MacdOutput::Line, 12, 26, 9)
    }

    /// Standard 12/26/9 signal line.
    pub fn signal_line() -> Self {
        Self::new(MacdOutput::Signal, 12, 26, 9)
    }

    fn macd_line(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        match self.output {
            MacdOutput::Line => "macd",
            MacdOutput::Signal => "macd_signal",
        }
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdOutput::Line => self.slow - 1,
            MacdOutput::Signal => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let line = self.macd_line(&closes);
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => ema_of_series(&line, self.signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    fn trending(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_candles(&closes)
    }

    #[test]
    fn warmup_matches_lookback() {
        let candles = trending(60);
        for macd in [Macd::line(), Macd::signal_line()] {
            let result = macd.compute(&candles);
            let first_valid = result.iter().position(|v| !v.is_nan()).unwrap();
            assert_eq!(first_valid, macd.lookback(), "{}", macd.name());
        }
    }

    #[test]
    fn uptrend_has_positive_macd() {
        let result = Macd::line().compute(&trending(60));
        assert!(result[59] > 0.0);
    }

    #[test]
    fn flat_series_has_zero_macd_and_signal() {
        let candles = make_candles(&[3.0; 50]);
        assert_approx(Macd::line().compute(&candles)[49], 0.0, 1e-12);
        assert_approx(Macd::signal_line().compute(&candles)[49], 0.0, 1e-12);
    }

    #[test]
    #[should_panic(expected = "slow period")]
    fn rejects_inverted_periods() {
        Macd::new(MacdOutput::Line, 26, 12, 9);
    }
}
