//! End-to-end report generation: load, aggregate, chart, compose, write.

use std::path::PathBuf;

use log::info;

use crate::charts::{render_distribution_chart, render_mean_chart};
use crate::config::ReportConfig;
use crate::dataset::load_records;
use crate::error::Result;
use crate::report::compose_report;
use crate::stats::{priority_statistics, PriorityStatistics};

/// What a successful run produced.
#[derive(Clone, Debug)]
pub struct ReportSummary {
    pub records: usize,
    pub statistics: Vec<PriorityStatistics>,
    pub boxplot_path: PathBuf,
    pub bar_chart_path: PathBuf,
    pub report_path: PathBuf,
    pub report_bytes: usize,
}

/// Runs the whole pipeline; the first failing step aborts the run.
pub fn run(config: &ReportConfig) -> Result<ReportSummary> {
    let records = load_records(config.input_path(), config.delimiter())?;
    let statistics = priority_statistics(&records);
    info!("Aggregated {} priority groups", statistics.len());

    let distribution = render_distribution_chart(&records, config.boxplot_path())?;
    let mean = render_mean_chart(&statistics, config.bar_chart_path())?;

    let report = compose_report(&statistics, &mean, &distribution)
        .finalize(config.report_path())?;

    Ok(ReportSummary {
        records: records.len(),
        statistics,
        boxplot_path: distribution.path,
        bar_chart_path: mean.path,
        report_path: report.path().to_path_buf(),
        report_bytes: report.bytes_written(),
    })
}
