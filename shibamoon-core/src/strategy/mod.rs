//! Strategy scorers: spot, futures and grid.
//!
//! Each scorer reads an immutable [`IndicatorSeries`] and returns a
//! strategy-specific opportunity record, or `None` when the market does not
//! qualify. Scorers hold only configuration; nothing persists between calls,
//! so scoring the same series twice yields identical output.
//!
//! # Failure semantics
//! Sub-score functions return [`ScoreError`]. Degenerate arithmetic inside a
//! sub-score is converted to a neutral value where a fallback is defined;
//! everything else abstains. [`Strategy::analyze`] never propagates an error:
//! it logs and returns `None`.

pub mod direction;
pub mod futures;
pub mod grid;
pub mod leverage;
pub mod score;
pub mod spot;

pub use direction::{DirectionScore, DirectionVotes};
pub use futures::{FuturesOpportunity, FuturesStrategy, PositionType};
pub use grid::{GridOpportunity, GridParameters, GridStrategy, GridType};
pub use leverage::LeverageEstimator;
pub use score::{ScoreComponents, ScoreWeights};
pub use spot::{SpotOpportunity, SpotStrategy};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{IndicatorProfile, IndicatorSeries};

/// Why a score could not be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// A required value is undefined or the history is too short.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Division by zero or a non-positive denominator.
    #[error("degenerate arithmetic: {0}")]
    Degenerate(String),

    #[error("computation failed: {0}")]
    Computation(String),
}

/// Log a scoring failure at a level matching its kind.
///
/// Missing warm-up data is expected for young listings and logs at debug.
pub(crate) fn log_score_error(context: &str, symbol: &str, err: &ScoreError) {
    match err {
        ScoreError::MissingData(_) => {
            tracing::debug!(strategy = context, symbol, error = %err, "abstaining");
        }
        _ => {
            tracing::warn!(strategy = context, symbol, error = %err, "scoring failed");
        }
    }
}

/// The three trading postures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Spot,
    Futures,
    Grid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [StrategyKind::Spot, StrategyKind::Futures, StrategyKind::Grid];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Spot => "spot",
            StrategyKind::Futures => "futures",
            StrategyKind::Grid => "grid",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common scoring contract.
///
/// Implementations provide `evaluate`; callers use `analyze`, which converts
/// every error into "no opportunity".
pub trait Strategy: Send + Sync {
    type Output: Serialize + Clone + fmt::Debug + Send;

    fn kind(&self) -> StrategyKind;

    /// Indicator columns this strategy reads.
    fn profile(&self) -> IndicatorProfile;

    fn evaluate(&self, series: &IndicatorSeries) -> Result<Option<Self::Output>, ScoreError>;

    fn analyze(&self, series: &IndicatorSeries) -> Option<Self::Output> {
        match self.evaluate(series) {
            Ok(result) => result,
            Err(err) => {
                log_score_error(self.kind().as_str(), series.symbol(), &err);
                None
            }
        }
    }
}

/// Leverage bounds shared by the futures and grid scorers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverageConfig {
    pub base: u32,
    pub max: u32,
    /// Upper bound applied to grid leverage on top of `max`.
    pub grid_cap: u32,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            base: 5,
            max: 10,
            grid_cap: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotConfig {
    pub min_score: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self {
            min_score: 0.65,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuturesConfig {
    pub min_score: f64,
    /// Position notional in quote currency; margin = notional / leverage.
    pub notional: f64,
}

impl Default for FuturesConfig {
    fn default() -> Self {
        Self {
            min_score: 0.70,
            notional: 7000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Minimum score for emitting a grid. `None` emits every grid whose
    /// parameters compute.
    pub min_score: Option<f64>,
    /// Total investment spread across the grid levels.
    pub notional: f64,
    pub quantity_precision: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_score: None,
            notional: 7000.0,
            quantity_precision: 3,
        }
    }
}

/// Clamp to the unit interval.
pub(crate) fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
