//! Fetches a wallet's reward events and exports the ones for a single tax year to CSV.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    lido_api::{RewardsQuery, RewardsSource},
    report::{self, ReportConfig},
};

#[derive(Clone, Debug)]
pub struct ExportParams {
    pub query: RewardsQuery,
    pub report: ReportConfig,
    /// Defaults to `<year>-report.csv` in the working directory.
    pub output: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub skipped: usize,
    pub negative_amounts: usize,
    pub total_incoming: String,
}

pub fn export_rewards_report(
    source: &impl RewardsSource,
    params: &ExportParams,
) -> anyhow::Result<ExportSummary> {
    info!(address = %params.query.address, year = %params.report.year, "fetching reward events");

    let response = source
        .fetch_rewards(&params.query)
        .context("failed to fetch reward events")?;

    let report = report::generate(&response.events, &params.report)
        .context("failed to generate report rows")?;

    let path = params
        .output
        .clone()
        .unwrap_or_else(|| report::default_report_path(params.report.year));

    info!(path = %path.display(), rows = report.rows.len(), "writing report");

    report::write_report_file(&path, &report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    if !report.skipped.is_empty() {
        warn!(
            skipped = report.skipped.len(),
            "left reward events with unreadable amounts out of the report"
        );
    }

    if report.negative_amounts > 0 {
        warn!(
            negative_amounts = report.negative_amounts,
            "report contains negative reward amounts, double check them"
        );
    }

    let summary = ExportSummary {
        path,
        rows: report.rows.len(),
        skipped: report.skipped.len(),
        negative_amounts: report.negative_amounts,
        total_incoming: report.total_incoming.to_fixed_string(),
    };

    info!(
        events = response.events.len(),
        rows = summary.rows,
        total = %summary.total_incoming,
        asset = %params.report.asset,
        "export rewards report completed"
    );

    Ok(summary)
}
