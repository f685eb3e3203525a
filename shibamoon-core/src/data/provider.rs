//! Market data provider trait and structured error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candle, Timeframe};

/// A spot trading pair as listed by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    pub base: String,
    pub quote: String,
    /// Whether the exchange currently accepts orders for the pair.
    pub trading: bool,
}

impl Market {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            trading: true,
        }
    }

    /// Display form, e.g. `BTC/USDT`.
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    /// Exchange wire form, e.g. `BTCUSDT`.
    pub fn exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Parse `BASE/QUOTE`.
    pub fn parse(symbol: &str) -> Option<Self> {
        let (base, quote) = symbol.split_once('/')?;
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self::new(base.to_uppercase(), quote.to_uppercase()))
    }
}

/// Structured error types for market data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: exchange has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Candle history for one market.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub source: DataSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Binance,
    Synthetic,
}

/// A source of exchange listings and candle history.
///
/// Providers own rate limiting, retries and timeouts; the scanner only sees
/// success or a [`DataError`].
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Every spot market the exchange lists, in exchange order.
    fn markets(&self) -> Result<Vec<Market>, DataError>;

    /// The most recent `limit` candles, oldest first.
    fn fetch_candles(
        &self,
        market: &Market,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<FetchResult, DataError>;

    /// False while the provider is refusing requests.
    fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_symbol_forms() {
        let m = Market::new("ETH", "USDT");
        assert_eq!(m.symbol(), "ETH/USDT");
        assert_eq!(m.exchange_symbol(), "ETHUSDT");
    }

    #[test]
    fn parse_display_symbol() {
        assert_eq!(Market::parse("sol/usdt"), Some(Market::new("SOL", "USDT")));
        assert_eq!(Market::parse("SOLUSDT"), None);
        assert_eq!(Market::parse("/USDT"), None);
    }

    #[test]
    fn error_display() {
        let e = DataError::RateLimited { retry_after_secs: 12 };
        assert_eq!(e.to_string(), "rate limited by provider (retry after 12s)");
    }
}
