//! Scan orchestration: universe → candles → indicator tables → scorers.
//!
//! Per-symbol work runs on a bounded rayon pool sized by `scan.workers`.
//! Results keep universe order whatever the pool size, and a failure on one
//! symbol is recorded without aborting the scan.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use shibamoon_core::data::{DataError, Market, MarketDataProvider, UniverseFilter};
use shibamoon_core::table::MIN_HISTORY;
use shibamoon_core::{
    Candle, Column, FuturesOpportunity, FuturesStrategy, GridOpportunity, GridStrategy,
    IndicatorProfile, IndicatorSeries, SpotOpportunity, SpotStrategy, Strategy, Timeframe,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ScanConfig};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load market universe from {provider}: {source}")]
    Universe {
        provider: String,
        #[source]
        source: DataError,
    },

    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

/// Every strategy's view of one symbol. Absent strategies abstained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityBundle {
    pub symbol: String,
    pub spot: Option<SpotOpportunity>,
    pub futures: Option<FuturesOpportunity>,
    pub grid: Option<GridOpportunity>,
}

impl OpportunityBundle {
    /// Highest score across the strategies present, 0 when none are.
    pub fn best_score(&self) -> f64 {
        [
            self.spot.as_ref().map(|o| o.score),
            self.futures.as_ref().map(|o| o.score),
            self.grid.as_ref().map(|o| o.score),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.spot.is_none() && self.futures.is_none() && self.grid.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub symbols_scanned: usize,
    pub failures: Vec<SymbolFailure>,
    pub opportunities: Vec<OpportunityBundle>,
}

/// What happened to one symbol during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStatus {
    Opportunity,
    NoOpportunity,
    Failed,
}

/// Observer for scan progress. Called from worker threads.
pub trait ScanProgress: Send + Sync {
    fn on_start(&self, total: usize);

    fn on_symbol(&self, symbol: &str, status: SymbolStatus);

    fn on_finish(&self, report: &ScanReport);
}

/// Discards all progress events.
pub struct NoProgress;

impl ScanProgress for NoProgress {
    fn on_start(&self, _total: usize) {}
    fn on_symbol(&self, _symbol: &str, _status: SymbolStatus) {}
    fn on_finish(&self, _report: &ScanReport) {}
}

enum SymbolOutcome {
    Scored(Option<OpportunityBundle>),
    Failed(SymbolFailure),
}

pub struct Scanner {
    config: ScanConfig,
    universe: UniverseFilter,
    spot: SpotStrategy,
    futures: FuturesStrategy,
    grid: GridStrategy,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let leverage = config.leverage_estimator();
        Ok(Self {
            universe: config.universe_filter(),
            spot: SpotStrategy::new(config.spot),
            futures: FuturesStrategy::new(config.futures, leverage),
            grid: GridStrategy::new(config.grid, leverage),
            config,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The filtered markets a scan would visit, in exchange order.
    pub fn universe(&self, provider: &dyn MarketDataProvider) -> Result<Vec<Market>, ScanError> {
        let markets = provider.markets().map_err(|source| ScanError::Universe {
            provider: provider.name().to_string(),
            source,
        })?;
        let selected = self.universe.apply(&markets);
        info!(
            provider = provider.name(),
            listed = markets.len(),
            selected = selected.len(),
            "loaded market universe"
        );
        Ok(selected)
    }

    /// Score one symbol's candles under every strategy.
    ///
    /// Returns `None` when history is too short or every strategy abstains.
    pub fn analyze_symbol(&self, symbol: &str, candles: &[Candle]) -> Option<OpportunityBundle> {
        if candles.len() < MIN_HISTORY {
            debug!(
                symbol,
                candles = candles.len(),
                required = MIN_HISTORY,
                "skipping symbol with insufficient history"
            );
            return None;
        }

        let mut tables = TableCache::new(symbol, candles);
        let spot = self.spot.analyze(tables.get(&self.spot.profile()));
        let futures = self.futures.analyze(tables.get(&self.futures.profile()));
        let grid = self.grid.analyze(tables.get(&self.grid.profile()));

        let bundle = OpportunityBundle {
            symbol: symbol.to_string(),
            spot,
            futures,
            grid,
        };
        if bundle.is_empty() {
            None
        } else {
            Some(bundle)
        }
    }

    /// Run a full scan against `provider`.
    pub fn scan(
        &self,
        provider: &dyn MarketDataProvider,
        progress: &dyn ScanProgress,
    ) -> Result<ScanReport, ScanError> {
        let markets = self.universe(provider)?;
        progress.on_start(markets.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.scan.workers)
            .build()
            .map_err(|e| ScanError::Pool(e.to_string()))?;

        let outcomes: Vec<SymbolOutcome> = pool.install(|| {
            markets
                .par_iter()
                .map(|market| self.scan_market(provider, market, progress))
                .collect()
        });

        let mut failures = Vec::new();
        let mut opportunities = Vec::new();
        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Scored(Some(bundle)) => opportunities.push(bundle),
                SymbolOutcome::Scored(None) => {}
                SymbolOutcome::Failed(failure) => failures.push(failure),
            }
        }

        let report = ScanReport {
            generated_at: Utc::now(),
            timeframe: self.config.scan.timeframe,
            symbols_scanned: markets.len(),
            failures,
            opportunities,
        };
        info!(
            scanned = report.symbols_scanned,
            opportunities = report.opportunities.len(),
            failures = report.failures.len(),
            "scan complete"
        );
        progress.on_finish(&report);
        Ok(report)
    }

    fn scan_market(
        &self,
        provider: &dyn MarketDataProvider,
        market: &Market,
        progress: &dyn ScanProgress,
    ) -> SymbolOutcome {
        let symbol = market.symbol();
        let fetched = if provider.is_available() {
            provider.fetch_candles(market, self.config.scan.timeframe, self.config.scan.candle_limit)
        } else {
            Err(DataError::CircuitBreakerTripped)
        };

        match fetched {
            Ok(result) => {
                let bundle = self.analyze_symbol(&symbol, &result.candles);
                let status = if bundle.is_some() {
                    SymbolStatus::Opportunity
                } else {
                    SymbolStatus::NoOpportunity
                };
                progress.on_symbol(&symbol, status);
                SymbolOutcome::Scored(bundle)
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "failed to fetch candles");
                progress.on_symbol(&symbol, SymbolStatus::Failed);
                SymbolOutcome::Failed(SymbolFailure {
                    symbol,
                    error: e.to_string(),
                })
            }
        }
    }
}

/// Indicator tables for one symbol, shared between profiles with the same
/// column set.
struct TableCache<'a> {
    symbol: &'a str,
    candles: &'a [Candle],
    tables: Vec<(&'static [Column], IndicatorSeries)>,
}

impl<'a> TableCache<'a> {
    fn new(symbol: &'a str, candles: &'a [Candle]) -> Self {
        Self {
            symbol,
            candles,
            tables: Vec::with_capacity(2),
        }
    }

    fn get(&mut self, profile: &IndicatorProfile) -> &IndicatorSeries {
        let idx = match self.tables.iter().position(|(cols, _)| *cols == profile.columns) {
            Some(idx) => idx,
            None => {
                let series = IndicatorSeries::compute(self.symbol, self.candles, profile);
                self.tables.push((profile.columns, series));
                self.tables.len() - 1
            }
        };
        &self.tables[idx].1
    }
}
