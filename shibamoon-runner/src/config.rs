//! Scan configuration.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file
//! at all) yields a working scan:
//!
//! ```toml
//! [scan]
//! timeframe = "6h"
//! candle_limit = 500
//! max_symbols = 100
//! workers = 4
//!
//! [leverage]
//! base = 5
//! max = 10
//!
//! [report]
//! dir = "reports"
//! json = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shibamoon_core::data::{UniverseFilter, DEFAULT_STABLECOINS};
use shibamoon_core::strategy::{FuturesConfig, GridConfig, LeverageConfig, SpotConfig};
use shibamoon_core::table::MIN_HISTORY;
use shibamoon_core::{LeverageEstimator, Timeframe};
use thiserror::Error;

/// Binance rejects kline requests above this limit.
pub const MAX_CANDLE_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration, one table per concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub scan: ScanSettings,
    pub leverage: LeverageConfig,
    pub spot: SpotConfig,
    pub futures: FuturesConfig,
    pub grid: GridConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub timeframe: Timeframe,
    pub candle_limit: usize,
    pub max_symbols: usize,
    pub quote_asset: String,
    /// Base assets containing any of these tickers are skipped.
    pub excluded_bases: Vec<String>,
    /// Size of the per-symbol worker pool.
    pub workers: usize,
    pub base_url: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::H6,
            candle_limit: 500,
            max_symbols: 100,
            quote_asset: "USDT".into(),
            excluded_bases: DEFAULT_STABLECOINS.iter().map(|s| s.to_string()).collect(),
            workers: 1,
            base_url: shibamoon_core::data::binance::DEFAULT_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub dir: PathBuf,
    /// Write `detailed_report_<ts>.json`.
    pub json: bool,
    /// Write `opportunities_<ts>.csv`.
    pub csv: bool,
    /// Symbols listed in the text summary.
    pub top_n: usize,
    /// Strategies scoring below this are hidden from the text summary.
    pub display_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
            json: true,
            csv: true,
            top_n: 10,
            display_threshold: 0.8,
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let lev = &self.leverage;
        if lev.base == 0 {
            return invalid("leverage.base must be at least 1");
        }
        if lev.base > lev.max {
            return invalid(format!(
                "leverage.base ({}) exceeds leverage.max ({})",
                lev.base, lev.max
            ));
        }

        check_unit("spot.min_score", self.spot.min_score)?;
        check_unit("futures.min_score", self.futures.min_score)?;
        if let Some(min) = self.grid.min_score {
            check_unit("grid.min_score", min)?;
        }
        check_unit("report.display_threshold", self.report.display_threshold)?;

        if !(self.spot.stop_loss_pct > 0.0 && self.spot.stop_loss_pct < 1.0) {
            return invalid("spot.stop_loss_pct must be in (0, 1)");
        }
        if !(self.spot.take_profit_pct > 0.0) {
            return invalid("spot.take_profit_pct must be positive");
        }
        if !(self.futures.notional > 0.0) || !(self.grid.notional > 0.0) {
            return invalid("notional amounts must be positive");
        }

        let scan = &self.scan;
        if scan.workers == 0 {
            return invalid("scan.workers must be at least 1");
        }
        if scan.max_symbols == 0 {
            return invalid("scan.max_symbols must be at least 1");
        }
        if scan.candle_limit < MIN_HISTORY {
            return invalid(format!(
                "scan.candle_limit ({}) is below the {MIN_HISTORY}-candle warm-up",
                scan.candle_limit
            ));
        }
        if scan.candle_limit > MAX_CANDLE_LIMIT {
            return invalid(format!(
                "scan.candle_limit ({}) exceeds the exchange maximum of {MAX_CANDLE_LIMIT}",
                scan.candle_limit
            ));
        }
        if scan.quote_asset.trim().is_empty() {
            return invalid("scan.quote_asset must not be empty");
        }
        Ok(())
    }

    pub fn universe_filter(&self) -> UniverseFilter {
        UniverseFilter {
            quote_asset: self.scan.quote_asset.to_uppercase(),
            excluded_bases: self.scan.excluded_bases.clone(),
            max_symbols: self.scan.max_symbols,
        }
    }

    pub fn leverage_estimator(&self) -> LeverageEstimator {
        LeverageEstimator::new(self.leverage)
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid(msg.into()))
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        invalid(format!("{name} must be within [0, 1], got {value}"))
    }
}
