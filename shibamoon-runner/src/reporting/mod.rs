//! Scan reports: detailed JSON, a text summary and a CSV ranking.
//!
//! All files for one scan share the `YYYYmmdd_HHMMSS` local timestamp of
//! the scan, e.g. `summary_report_20240101_120000.txt`.

mod csv;
mod json;
mod summary;

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::config::ReportConfig;
use crate::scanner::ScanReport;

pub use self::csv::render_csv;
pub use self::json::{render_json, DetailedReport};
pub use self::summary::render_summary;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV report: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8,
}

/// Files written for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub detailed_json: Option<PathBuf>,
    pub summary: PathBuf,
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Write every enabled report into the report directory, creating it if
    /// needed.
    pub fn generate(&self, report: &ScanReport) -> Result<ReportPaths, ReportError> {
        let dir = &self.config.dir;
        std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.clone(),
            source,
        })?;

        let local = report.generated_at.with_timezone(&Local);
        let stamp = local.format(TIMESTAMP_FORMAT).to_string();

        let detailed_json = if self.config.json {
            let path = dir.join(format!("detailed_report_{stamp}.json"));
            write(&path, &render_json(&stamp, &report.opportunities)?)?;
            Some(path)
        } else {
            None
        };

        let summary = dir.join(format!("summary_report_{stamp}.txt"));
        let text = render_summary(
            &report.opportunities,
            self.config.top_n,
            self.config.display_threshold,
            local,
        );
        write(&summary, &text)?;

        let csv = if self.config.csv {
            let path = dir.join(format!("opportunities_{stamp}.csv"));
            write(&path, &render_csv(&report.opportunities)?)?;
            Some(path)
        } else {
            None
        };

        info!(dir = %dir.display(), stamp = %stamp, "reports written");
        Ok(ReportPaths {
            detailed_json,
            summary,
            csv,
        })
    }
}

fn write(path: &Path, contents: &str) -> Result<(), ReportError> {
    std::fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
