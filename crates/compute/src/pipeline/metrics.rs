use std::time::Duration;

use serde::Serialize;

/// Per-run stage timings and counts, filled in by the dual pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Records in the source table.
    pub records: usize,
    /// Distinct callers after aggregation.
    pub callers: usize,
    pub flagged_callers: usize,
    pub flagged_calls: usize,
    /// Rows in the exported top-K subset.
    pub top_calls: usize,

    /// Raw-score thresholds chosen from the contamination rate.
    pub caller_threshold: f64,
    pub call_threshold: f64,

    /// Feature derivation time in milliseconds.
    pub derive_ms: u64,
    /// Caller path (aggregate, scale, score, rank) in milliseconds.
    pub caller_path_ms: u64,
    /// Call path (scale, score, rank, select) in milliseconds.
    pub call_path_ms: u64,
}

impl RunMetrics {
    pub fn record_derive(&mut self, records: usize, elapsed: Duration) {
        self.records = records;
        self.derive_ms = elapsed.as_millis() as u64;
    }

    pub fn record_caller_path(
        &mut self,
        callers: usize,
        flagged: usize,
        threshold: f64,
        elapsed: Duration,
    ) {
        self.callers = callers;
        self.flagged_callers = flagged;
        self.caller_threshold = threshold;
        self.caller_path_ms = elapsed.as_millis() as u64;
    }

    pub fn record_call_path(
        &mut self,
        flagged: usize,
        top: usize,
        threshold: f64,
        elapsed: Duration,
    ) {
        self.flagged_calls = flagged;
        self.top_calls = top;
        self.call_threshold = threshold;
        self.call_path_ms = elapsed.as_millis() as u64;
    }

    pub fn total_ms(&self) -> u64 {
        self.derive_ms + self.caller_path_ms + self.call_path_ms
    }
}
