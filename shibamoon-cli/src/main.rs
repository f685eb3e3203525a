//! ShibaMoon CLI: scan the USDT market and score spot, futures and grid
//! opportunities.
//!
//! Commands:
//! - `scan`: score the filtered universe and write JSON/text/CSV reports
//! - `analyze`: score a single pair and print the result as JSON
//! - `universe`: list the pairs a scan would visit
//! - `config`: print the default configuration as TOML
//!
//! Logging goes to stderr and is filtered by `SHIBAMOON_LOG` (or
//! `RUST_LOG`); set `SHIBAMOON_LOG_JSON` for JSON lines.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use shibamoon_core::data::{BinanceProvider, CircuitBreaker, Market, MarketDataProvider};
use shibamoon_core::Timeframe;
use shibamoon_runner::{
    ReportGenerator, ScanConfig, ScanProgress, ScanReport, Scanner, SymbolStatus,
    SyntheticProvider,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "shibamoon",
    version,
    about = "ShibaMoon: multi-strategy crypto market scanner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use deterministic synthetic candles instead of Binance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the universe and write reports.
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// Candle interval (1m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 12h, 1d).
        #[arg(long)]
        timeframe: Option<Timeframe>,

        /// Maximum number of pairs to scan.
        #[arg(long)]
        max_symbols: Option<usize>,

        /// Worker threads for per-symbol scoring.
        #[arg(long)]
        workers: Option<usize>,

        /// Report directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip the detailed JSON report (also enabled by NO_JSON=1).
        #[arg(long, default_value_t = false)]
        no_json: bool,
    },
    /// Score one pair, e.g. `BTC/USDT`, and print the result as JSON.
    Analyze {
        symbol: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Candle interval.
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },
    /// List the pairs a scan would visit.
    Universe {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            source,
            timeframe,
            max_symbols,
            workers,
            output_dir,
            no_json,
        } => {
            let mut config = load_config(&source)?;
            if let Some(tf) = timeframe {
                config.scan.timeframe = tf;
            }
            if let Some(n) = max_symbols {
                config.scan.max_symbols = n;
            }
            if let Some(n) = workers {
                config.scan.workers = n;
            }
            if let Some(dir) = output_dir {
                config.report.dir = dir;
            }
            if no_json || env_flag("NO_JSON") {
                config.report.json = false;
            }
            run_scan(config, source.synthetic)
        }
        Commands::Analyze {
            symbol,
            source,
            timeframe,
        } => {
            let mut config = load_config(&source)?;
            if let Some(tf) = timeframe {
                config.scan.timeframe = tf;
            }
            run_analyze(config, &symbol, source.synthetic)
        }
        Commands::Universe { source } => {
            let config = load_config(&source)?;
            run_universe(config, source.synthetic)
        }
        Commands::Config => {
            print!("{}", ScanConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_env("SHIBAMOON_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("shibamoon=info"));

    if env_flag("SHIBAMOON_LOG_JSON") {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}

/// Set and not `0`/`false`.
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| {
            let v = v.trim();
            !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
        })
        .unwrap_or(false)
}

fn load_config(source: &SourceArgs) -> Result<ScanConfig> {
    match &source.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}

fn make_provider(config: &ScanConfig, synthetic: bool) -> Result<Box<dyn MarketDataProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider::new()));
    }
    let breaker = Arc::new(CircuitBreaker::default());
    let provider = BinanceProvider::new(config.scan.base_url.clone(), breaker)
        .context("creating Binance client")?;
    Ok(Box::new(provider))
}

fn run_scan(config: ScanConfig, synthetic: bool) -> Result<()> {
    let provider = make_provider(&config, synthetic)?;
    let generator = ReportGenerator::new(config.report.clone());
    let scanner = Scanner::new(config)?;

    info!(
        provider = provider.name(),
        timeframe = %scanner.config().scan.timeframe,
        workers = scanner.config().scan.workers,
        "starting scan"
    );

    let progress = BarProgress::new();
    let report = scanner.scan(provider.as_ref(), &progress)?;

    info!(
        opportunities = report.opportunities.len(),
        "found {} potential opportunities",
        report.opportunities.len()
    );
    if !report.failures.is_empty() {
        warn!(count = report.failures.len(), "some symbols could not be fetched");
        for failure in &report.failures {
            warn!(symbol = %failure.symbol, error = %failure.error, "fetch failed");
        }
    }

    let paths = generator.generate(&report).context("writing reports")?;
    if let Some(json) = &paths.detailed_json {
        println!("Detailed report: {}", json.display());
    }
    println!("Summary report:  {}", paths.summary.display());
    if let Some(csv) = &paths.csv {
        println!("Ranking CSV:     {}", csv.display());
    }
    Ok(())
}

fn run_analyze(config: ScanConfig, symbol: &str, synthetic: bool) -> Result<()> {
    let Some(market) = Market::parse(symbol) else {
        bail!("symbol must look like BASE/QUOTE, got '{symbol}'");
    };
    let provider = make_provider(&config, synthetic)?;
    let scanner = Scanner::new(config)?;
    let scan = &scanner.config().scan;

    let fetched = provider
        .fetch_candles(&market, scan.timeframe, scan.candle_limit)
        .with_context(|| format!("fetching candles for {}", market.symbol()))?;

    match scanner.analyze_symbol(&fetched.symbol, &fetched.candles) {
        Some(bundle) => println!("{}", serde_json::to_string_pretty(&bundle)?),
        None => println!("No opportunity for {}", fetched.symbol),
    }
    Ok(())
}

fn run_universe(config: ScanConfig, synthetic: bool) -> Result<()> {
    let provider = make_provider(&config, synthetic)?;
    let scanner = Scanner::new(config)?;
    let markets = scanner.universe(provider.as_ref())?;
    for market in &markets {
        println!("{}", market.symbol());
    }
    println!("{} pairs", markets.len());
    Ok(())
}

/// Terminal progress bar for scans.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(0);
        bar.set_style(style);
        Self { bar }
    }
}

impl ScanProgress for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_symbol(&self, symbol: &str, status: SymbolStatus) {
        if status == SymbolStatus::Failed {
            self.bar.set_message(format!("{symbol} (failed)"));
        } else {
            self.bar.set_message(symbol.to_string());
        }
        self.bar.inc(1);
    }

    fn on_finish(&self, report: &ScanReport) {
        self.bar.finish_with_message(format!(
            "{} opportunities from {} pairs",
            report.opportunities.len(),
            report.symbols_scanned
        ));
    }
}
