//! Binance spot REST provider.
//!
//! Listings come from `GET /api/v3/exchangeInfo`, candles from
//! `GET /api/v3/klines`. Requests retry with exponential backoff. HTTP 418
//! (IP ban) and 403 (WAF block) trip the circuit breaker immediately; 429
//! counts as a failure and the next attempt waits at least `Retry-After`.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, FetchResult, Market, MarketDataProvider};
use crate::domain::{Candle, Timeframe};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance caps a klines request at 1000 rows.
const MAX_KLINES: usize = 1000;

/// Upper bound on a single `Retry-After` wait.
const MAX_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    status: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default = "default_true")]
    is_spot_trading_allowed: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new(base_url: impl Into<String>, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("shibamoon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn klines_url(&self, market: &Market, timeframe: Timeframe, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            market.exchange_symbol(),
            timeframe.as_str(),
            limit.clamp(1, MAX_KLINES)
        )
    }

    /// GET with retry, backoff and circuit breaker bookkeeping.
    fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        let mut wait = Duration::ZERO;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(backoff.max(wait));
                wait = Duration::ZERO;
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    tracing::debug!(symbol, attempt, error = %e, "request failed, retrying");
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::IM_A_TEAPOT || status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(MAX_RETRY_AFTER_SECS);
                tracing::warn!(symbol, retry_after, "rate limited");
                wait = Duration::from_secs(retry_after.min(MAX_RETRY_AFTER_SECS));
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::BAD_REQUEST {
                // -1121: invalid symbol
                let body: Option<ApiError> = resp.json().ok();
                return Err(match body {
                    Some(err) if err.code == -1121 => DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    },
                    Some(err) => DataError::Other(format!("binance error {}: {}", err.code, err.msg)),
                    None => DataError::Other(format!("HTTP {status} for {symbol}")),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let parsed = resp.json::<T>().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            self.circuit_breaker.record_success();
            return Ok(parsed);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl MarketDataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn markets(&self) -> Result<Vec<Market>, DataError> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let info: ExchangeInfo = self.get_json(&url, "exchangeInfo")?;
        Ok(markets_from_info(info))
    }

    fn fetch_candles(
        &self,
        market: &Market,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<FetchResult, DataError> {
        let symbol = market.symbol();
        let url = self.klines_url(market, timeframe, limit);
        let rows: Vec<Vec<Value>> = self.get_json(&url, &symbol)?;
        let candles = parse_klines(&symbol, &rows)?;
        tracing::debug!(symbol, candles = candles.len(), "fetched candles");
        Ok(FetchResult {
            symbol,
            candles,
            source: DataSource::Binance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

fn markets_from_info(info: ExchangeInfo) -> Vec<Market> {
    info.symbols
        .into_iter()
        .filter(|s| s.is_spot_trading_allowed)
        .map(|s| Market {
            trading: s.status == "TRADING",
            base: s.base_asset,
            quote: s.quote_asset,
        })
        .collect()
}

/// Decimal field that Binance sends as a string (numbers accepted too).
fn decimal(value: &Value, field: &str) -> Result<f64, DataError> {
    match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| DataError::ResponseFormatChanged(format!("bad {field}: {value}")))
}

/// Kline rows: `[open_time_ms, open, high, low, close, volume, close_time, ...]`.
fn parse_klines(symbol: &str, rows: &[Vec<Value>]) -> Result<Vec<Candle>, DataError> {
    if rows.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    rows.iter()
        .map(|row| {
            if row.len() < 6 {
                return Err(DataError::ResponseFormatChanged(format!(
                    "kline row has {} fields",
                    row.len()
                )));
            }
            let ms = row[0]
                .as_i64()
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("bad open time: {}", row[0])))?;
            let open_time = DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ms}")))?;
            Ok(Candle {
                open_time,
                open: decimal(&row[1], "open")?,
                high: decimal(&row[2], "high")?,
                low: decimal(&row[3], "low")?,
                close: decimal(&row[4], "close")?,
                volume: decimal(&row[5], "volume")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kline_rows() {
        let body = r#"[
            [1704067200000, "42283.58", "42554.57", "42261.02", "42475.23", "1271.68108", 1704088799999, "0", 1, "0", "0", "0"],
            [1704088800000, "42475.23", "42600.00", "42400.00", "42550.10", 980.5, 1704110399999, "0", 1, "0", "0", "0"]
        ]"#;
        let rows: Vec<Vec<Value>> = serde_json::from_str(body).unwrap();
        let candles = parse_klines("BTC/USDT", &rows).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time.timestamp(), 1_704_067_200);
        assert_eq!(candles[0].close, 42475.23);
        assert_eq!(candles[1].volume, 980.5);
        assert!(candles[0].open_time < candles[1].open_time);
    }

    #[test]
    fn rejects_malformed_rows() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(r#"[[1704067200000, "1.0", "x", "1.0", "1.0", "1"]]"#).unwrap();
        assert!(matches!(
            parse_klines("BTC/USDT", &rows),
            Err(DataError::ResponseFormatChanged(_))
        ));
        let short: Vec<Vec<Value>> = serde_json::from_str(r#"[[1704067200000, "1.0"]]"#).unwrap();
        assert!(parse_klines("BTC/USDT", &short).is_err());
    }

    #[test]
    fn empty_klines_is_not_found() {
        assert!(matches!(
            parse_klines("NOPE/USDT", &[]),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn exchange_info_to_markets() {
        let body = r#"{
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT", "isSpotTradingAllowed": true},
                {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA", "quoteAsset": "USDT", "isSpotTradingAllowed": true},
                {"symbol": "XYZUSDT", "status": "TRADING", "baseAsset": "XYZ", "quoteAsset": "USDT", "isSpotTradingAllowed": false}
            ]
        }"#;
        let info: ExchangeInfo = serde_json::from_str(body).unwrap();
        let markets = markets_from_info(info);
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0].symbol(), "BTC/USDT");
        assert!(markets[0].trading);
        assert!(!markets[1].trading);
    }

    #[test]
    fn klines_url_uses_exchange_symbol() {
        let provider = BinanceProvider::new("https://example.test/", Arc::new(CircuitBreaker::default())).unwrap();
        let url = provider.klines_url(&Market::new("ETH", "USDT"), Timeframe::H6, 500);
        assert_eq!(url, "https://example.test/api/v3/klines?symbol=ETHUSDT&interval=6h&limit=500");
    }

    #[test]
    fn tripped_breaker_short_circuits() {
        let breaker = Arc::new(CircuitBreaker::default());
        breaker.trip();
        let provider = BinanceProvider::new("http://127.0.0.1:9", breaker).unwrap();
        assert!(!provider.is_available());
        assert!(matches!(
            provider.fetch_candles(&Market::new("BTC", "USDT"), Timeframe::H6, 10),
            Err(DataError::CircuitBreakerTripped)
        ));
    }
}
