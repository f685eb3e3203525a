//! Columnar indicator table consumed by the strategy scorers.
//!
//! Built once per symbol and strategy from the candle history, then read-only.
//! Scorers read the newest row directly and trailing windows of a few columns
//! for stability statistics. Undefined (warm-up) values are stored as NaN and
//! surface as [`ScoreError::MissingData`] when a scorer asks for them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::Candle;
use crate::indicators::{
    Atr, Bollinger, Ema, Indicator, Macd, Roc, Rsi, VolumeEma, Vwap,
};
use crate::strategy::ScoreError;

/// Trailing window used for every stability statistic.
pub const STABILITY_WINDOW: usize = 20;

/// Minimum number of rows before a scorer will consider a symbol.
pub const MIN_HISTORY: usize = 50;

/// Named column of an [`IndicatorSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
    #[serde(rename = "ema_20")]
    Ema20,
    #[serde(rename = "ema_50")]
    Ema50,
    Macd,
    MacdSignal,
    Rsi,
    Roc,
    BbHigh,
    BbMid,
    BbLow,
    Atr,
    VolumeEma,
    Vwap,
    VwapDistance,
}

impl Column {
    pub const OHLCV: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
            Column::Ema20 => "ema_20",
            Column::Ema50 => "ema_50",
            Column::Macd => "macd",
            Column::MacdSignal => "macd_signal",
            Column::Rsi => "rsi",
            Column::Roc => "roc",
            Column::BbHigh => "bb_high",
            Column::BbMid => "bb_mid",
            Column::BbLow => "bb_low",
            Column::Atr => "atr",
            Column::VolumeEma => "volume_ema",
            Column::Vwap => "vwap",
            Column::VwapDistance => "vwap_distance",
        }
    }

    /// The indicator that produces this column, `None` for raw OHLCV.
    fn indicator(self) -> Option<Box<dyn Indicator>> {
        let ind: Box<dyn Indicator> = match self {
            Column::Open | Column::High | Column::Low | Column::Close | Column::Volume => {
                return None
            }
            Column::Ema20 => Box::new(Ema::new(20)),
            Column::Ema50 => Box::new(Ema::new(50)),
            Column::Macd => Box::new(Macd::line()),
            Column::MacdSignal => Box::new(Macd::signal_line()),
            Column::Rsi => Box::new(Rsi::new(14)),
            Column::Roc => Box::new(Roc::new(12)),
            Column::BbHigh => Box::new(Bollinger::upper(20, 2.0)),
            Column::BbMid => Box::new(Bollinger::middle(20, 2.0)),
            Column::BbLow => Box::new(Bollinger::lower(20, 2.0)),
            Column::Atr => Box::new(Atr::new(14)),
            Column::VolumeEma => Box::new(VolumeEma::new(20)),
            Column::Vwap => Box::new(Vwap::price()),
            Column::VwapDistance => Box::new(Vwap::distance()),
        };
        Some(ind)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The static set of derived columns a strategy reads.
///
/// Profiles are plain values assembled once; OHLCV columns are always
/// present and need not be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorProfile {
    pub name: &'static str,
    pub columns: &'static [Column],
}

const FULL_COLUMNS: [Column; 13] = [
    Column::VolumeEma,
    Column::Vwap,
    Column::VwapDistance,
    Column::BbHigh,
    Column::BbMid,
    Column::BbLow,
    Column::Atr,
    Column::Ema20,
    Column::Ema50,
    Column::Macd,
    Column::MacdSignal,
    Column::Rsi,
    Column::Roc,
];

const GRID_COLUMNS: [Column; 10] = [
    Column::VolumeEma,
    Column::Vwap,
    Column::VwapDistance,
    Column::BbHigh,
    Column::BbMid,
    Column::BbLow,
    Column::Atr,
    Column::Ema20,
    Column::Ema50,
    Column::Rsi,
];

impl IndicatorProfile {
    pub const fn spot() -> Self {
        Self { name: "spot", columns: &FULL_COLUMNS }
    }

    pub const fn futures() -> Self {
        Self { name: "futures", columns: &FULL_COLUMNS }
    }

    pub const fn grid() -> Self {
        Self { name: "grid", columns: &GRID_COLUMNS }
    }

    pub fn contains(&self, column: Column) -> bool {
        Column::OHLCV.contains(&column) || self.columns.contains(&column)
    }
}

/// Newest observation of a series. `None` marks an undefined value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub rsi: Option<f64>,
    pub roc: Option<f64>,
    pub bb_high: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_low: Option<f64>,
    pub atr: Option<f64>,
    pub volume_ema: Option<f64>,
    pub vwap: Option<f64>,
    pub vwap_distance: Option<f64>,
}

/// Time-ascending indicator table for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    symbol: String,
    len: usize,
    columns: BTreeMap<Column, Vec<f64>>,
}

impl IndicatorSeries {
    /// Compute every column the profile needs from the candle history.
    pub fn compute(symbol: &str, candles: &[Candle], profile: &IndicatorProfile) -> Self {
        let mut columns = BTreeMap::new();
        columns.insert(Column::Open, candles.iter().map(|c| c.open).collect());
        columns.insert(Column::High, candles.iter().map(|c| c.high).collect());
        columns.insert(Column::Low, candles.iter().map(|c| c.low).collect());
        columns.insert(Column::Close, candles.iter().map(|c| c.close).collect());
        columns.insert(Column::Volume, candles.iter().map(|c| c.volume).collect());

        for &column in profile.columns {
            if let Some(indicator) = column.indicator() {
                columns.insert(column, indicator.compute(candles));
            }
        }

        Self {
            symbol: symbol.to_string(),
            len: candles.len(),
            columns,
        }
    }

    /// Build a table from externally computed columns. All columns must have
    /// the same length.
    pub fn from_columns(
        symbol: &str,
        columns: impl IntoIterator<Item = (Column, Vec<f64>)>,
    ) -> Result<Self, ScoreError> {
        let columns: BTreeMap<Column, Vec<f64>> = columns.into_iter().collect();
        let len = columns.values().next().map_or(0, Vec::len);
        if let Some((column, values)) = columns.iter().find(|(_, v)| v.len() != len) {
            return Err(ScoreError::Computation(format!(
                "column {column} has {} rows, expected {len}",
                values.len()
            )));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            len,
            columns,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains_key(&column)
    }

    /// Full column, if present.
    pub fn column(&self, column: Column) -> Option<&[f64]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    /// Value of `column` in the newest row.
    pub fn last(&self, column: Column) -> Result<f64, ScoreError> {
        self.column(column)
            .and_then(|values| values.last().copied())
            .filter(|v| v.is_finite())
            .ok_or_else(|| ScoreError::MissingData(column.to_string()))
    }

    /// Trailing window of at most `n` values (fewer if the table is shorter).
    pub fn tail(&self, column: Column, n: usize) -> Result<&[f64], ScoreError> {
        let values = self
            .column(column)
            .ok_or_else(|| ScoreError::MissingData(column.to_string()))?;
        Ok(&values[values.len().saturating_sub(n)..])
    }

    /// Fails with `MissingData` unless the table holds at least `rows` rows.
    pub fn require_history(&self, rows: usize) -> Result<(), ScoreError> {
        if self.len < rows {
            return Err(ScoreError::MissingData(format!(
                "{} rows, need {rows}",
                self.len
            )));
        }
        Ok(())
    }

    pub fn last_row(&self) -> IndicatorRow {
        let get = |c: Column| self.last(c).ok();
        IndicatorRow {
            open: get(Column::Open),
            high: get(Column::High),
            low: get(Column::Low),
            close: get(Column::Close),
            volume: get(Column::Volume),
            ema_20: get(Column::Ema20),
            ema_50: get(Column::Ema50),
            macd: get(Column::Macd),
            macd_signal: get(Column::MacdSignal),
            rsi: get(Column::Rsi),
            roc: get(Column::Roc),
            bb_high: get(Column::BbHigh),
            bb_mid: get(Column::BbMid),
            bb_low: get(Column::BbLow),
            atr: get(Column::Atr),
            volume_ema: get(Column::VolumeEma),
            vwap: get(Column::Vwap),
            vwap_distance: get(Column::VwapDistance),
        }
    }
}
