//! Per-call fetch timing

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which accessor produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    InlineSlices,
    CrosslineSlices,
    DepthSlices,
    Traces,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::InlineSlices => "inline slices",
            QueryKind::CrosslineSlices => "crossline slices",
            QueryKind::DepthSlices => "depth slices",
            QueryKind::Traces => "traces",
        };
        f.write_str(name)
    }
}

/// Timing of one completed fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub kind: QueryKind,
    pub count: usize,
    pub identifier: String,
    pub elapsed: Duration,
}

/// Receives one report per successful accessor call
pub trait MetricsSink: Send + Sync {
    fn record(&self, report: &FetchReport);
}

/// Emits each report as a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record(&self, report: &FetchReport) {
        tracing::info!(
            kind = %report.kind,
            count = report.count,
            identifier = %report.identifier,
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            "{} {} loaded in {:.2} sec",
            report.count,
            report.kind,
            report.elapsed.as_secs_f64()
        );
    }
}

/// Discards reports
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _report: &FetchReport) {}
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    reports: Mutex<Vec<FetchReport>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<FetchReport> {
        self.reports.lock().clone()
    }

    pub fn total_fetched(&self, kind: QueryKind) -> usize {
        self.reports
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.count)
            .sum()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, report: &FetchReport) {
        self.reports.lock().push(report.clone());
    }
}
