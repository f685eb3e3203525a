//! Market data: exchange listings and candle history.
//!
//! Providers sit behind the [`MarketDataProvider`] trait so the scanner can
//! run against Binance, a synthetic source, or a test double.

pub mod binance;
pub mod circuit_breaker;
pub mod provider;
pub mod universe;

pub use binance::BinanceProvider;
pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, DataSource, FetchResult, Market, MarketDataProvider};
pub use universe::{UniverseFilter, DEFAULT_STABLECOINS};
