//! ShibaMoon core: candle data, indicators and the multi-strategy scorers.
//!
//! - Domain types (`Candle`, `Timeframe`)
//! - Indicator computation into a columnar [`table::IndicatorSeries`]
//! - Spot, futures and grid scorers plus the leverage estimator
//! - Market data providers (Binance REST) and universe filtering
//!
//! Scoring is pure: the strategy modules perform no I/O and keep no state
//! between calls.

pub mod data;
pub mod domain;
pub mod indicators;
pub mod stats;
pub mod strategy;
pub mod table;

pub use domain::{Candle, Timeframe};
pub use strategy::{
    FuturesOpportunity, FuturesStrategy, GridOpportunity, GridStrategy, LeverageEstimator,
    ScoreError, SpotOpportunity, SpotStrategy, Strategy, StrategyKind,
};
pub use table::{Column, IndicatorProfile, IndicatorSeries};
