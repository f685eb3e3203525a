//! ShibaMoon runner: scan orchestration on top of `shibamoon-core`.
//!
//! - TOML configuration with validated defaults
//! - The [`Scanner`]: universe filtering, a bounded worker pool, per-symbol
//!   scoring under every strategy
//! - A deterministic synthetic market data provider for offline runs
//! - JSON, text and CSV report generation

pub mod config;
pub mod reporting;
pub mod scanner;
pub mod synthetic;

pub use config::{ConfigError, ReportConfig, ScanConfig, ScanSettings};
pub use reporting::{ReportError, ReportGenerator, ReportPaths};
pub use scanner::{
    NoProgress, OpportunityBundle, ScanError, ScanProgress, ScanReport, Scanner, SymbolFailure,
    SymbolStatus,
};
pub use synthetic::SyntheticProvider;
