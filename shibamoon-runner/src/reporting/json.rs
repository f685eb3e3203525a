use serde::Serialize;

use crate::scanner::OpportunityBundle;

use super::ReportError;

/// Body of `detailed_report_<ts>.json`.
#[derive(Debug, Serialize)]
pub struct DetailedReport<'a> {
    pub timestamp: &'a str,
    pub opportunities: &'a [OpportunityBundle],
}

pub fn render_json(
    timestamp: &str,
    opportunities: &[OpportunityBundle],
) -> Result<String, ReportError> {
    let report = DetailedReport {
        timestamp,
        opportunities,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
