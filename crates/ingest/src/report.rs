//! Result tables, plots and run summary written after a successful run.

use std::fs::File;
use std::path::{Path, PathBuf};

use callwatch_compute::{DualAnomalyReport, RunMetrics};
use callwatch_core::{CallwatchError, Result, ScoredCall, ScoredCaller};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::plot::{call_points, caller_points, write_scatter};

const CALLER_HEADERS: [&str; 8] = [
    "CallerID",
    "calls_per_hour",
    "avg_duration",
    "unique_receivers",
    "night_calls",
    "intl_calls",
    "AnomalyScore",
    "Anomaly",
];

const CALL_HEADERS: [&str; 9] = [
    "CallerID",
    "ReceiverID",
    "CallStartTime",
    "CallDuration",
    "Hour",
    "IsNightCall",
    "IsInternational",
    "AnomalyScore",
    "Anomaly",
];

/// Where each artifact of a run ended up.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPaths {
    pub caller_table: PathBuf,
    pub call_table: PathBuf,
    pub top_calls: PathBuf,
    pub summary: PathBuf,
    pub caller_plot: PathBuf,
    pub call_plot: PathBuf,
    pub top_plot: PathBuf,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    run_id: Uuid,
    logtime: &'a str,
    started_at: String,
    top_k: usize,
    metrics: &'a RunMetrics,
}

pub struct ReportWriter {
    output_dir: PathBuf,
    top_k: usize,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, top_k: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            top_k,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn top_calls_file_name(&self) -> String {
        format!("top_{}_suspicious_calls.csv", self.top_k)
    }

    pub fn top_plot_file_name(&self) -> String {
        format!("top_{}_plot.png", self.top_k)
    }

    /// Write every table of `report`, creating the output directory if needed.
    pub fn write(&self, report: &DualAnomalyReport, logtime: &str) -> Result<ReportPaths> {
        std::fs::create_dir_all(&self.output_dir)?;

        let paths = ReportPaths {
            caller_table: self.output_dir.join("caller_level_anomalies.csv"),
            call_table: self.output_dir.join("call_level_anomalies.csv"),
            top_calls: self.output_dir.join(self.top_calls_file_name()),
            summary: self.output_dir.join("run_summary.json"),
            caller_plot: self.output_dir.join("caller_plot.png"),
            call_plot: self.output_dir.join("call_plot.png"),
            top_plot: self.output_dir.join(self.top_plot_file_name()),
        };

        write_table::<ScoredCaller>(&paths.caller_table, &CALLER_HEADERS, &report.callers)?;
        write_table::<ScoredCall>(&paths.call_table, &CALL_HEADERS, &report.calls)?;
        write_table::<ScoredCall>(&paths.top_calls, &CALL_HEADERS, &report.top_calls)?;

        write_scatter(&paths.caller_plot, &caller_points(&report.callers))?;
        write_scatter(&paths.call_plot, &call_points(&report.calls))?;
        write_scatter(&paths.top_plot, &call_points(&report.top_calls))?;

        let summary = RunSummary {
            run_id: report.run_id,
            logtime,
            started_at: report.started_at.to_rfc3339(),
            top_k: self.top_k,
            metrics: &report.metrics,
        };
        let file = File::create(&paths.summary)?;
        serde_json::to_writer_pretty(file, &summary)
            .map_err(|e| CallwatchError::Serialize(e.to_string()))?;

        info!(
            output_dir = %self.output_dir.display(),
            callers = report.callers.len(),
            calls = report.calls.len(),
            top_calls = report.top_calls.len(),
            "reports written"
        );
        Ok(paths)
    }
}

/// The csv writer only emits a header alongside the first record, so the
/// header is written by hand and automatic headers are disabled.
fn write_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| CallwatchError::Csv(e.to_string()))?;
    writer
        .write_record(headers)
        .map_err(|e| CallwatchError::Csv(e.to_string()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| CallwatchError::Csv(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
