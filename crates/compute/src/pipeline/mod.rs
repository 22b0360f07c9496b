//! Dual anomaly pipeline orchestrator.
//!
//! Derives call features once, then runs two independent scoring paths over
//! the same table:
//!
//! - **Caller path**: aggregate per caller → standardize → isolation forest → rank.
//! - **Call path**: standardize raw call features → isolation forest → rank → top-K.
//!
//! Either both paths produce output or the run fails as a whole.

pub mod aggregate;
pub mod features;
pub mod matrix;
pub mod metrics;
pub mod ranking;
pub mod scaler;

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use callwatch_core::{
    CallRecord, CallwatchError, DerivedFeatures, DetectionConfig, Result, ScoredCall,
    ScoredCaller,
};

use crate::algorithms::isolation_forest::{fit_score, IsolationForestParams};

use self::aggregate::{aggregate_callers, caller_feature_matrix};
use self::features::{call_feature_matrix, FeatureDeriver};
use self::metrics::RunMetrics;
use self::ranking::{rank_by_score, top_flagged};
use self::scaler::StandardScaler;

/// Everything one run produces, handed to the persistence and alerting layers.
#[derive(Debug, Clone, Serialize)]
pub struct DualAnomalyReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// One row per distinct caller, ranked by score.
    pub callers: Vec<ScoredCaller>,
    /// One row per call, ranked by score.
    pub calls: Vec<ScoredCall>,
    /// Highest-scoring flagged calls, at most `top_k`.
    pub top_calls: Vec<ScoredCall>,
    pub metrics: RunMetrics,
}

impl DualAnomalyReport {
    pub fn flagged_callers(&self) -> impl Iterator<Item = &ScoredCaller> {
        self.callers.iter().filter(|c| c.anomaly)
    }

    pub fn flagged_calls(&self) -> impl Iterator<Item = &ScoredCall> {
        self.calls.iter().filter(|c| c.anomaly)
    }
}

/// Ranked rows of one path, plus the threshold that flagged them.
struct PathOutcome<T> {
    rows: Vec<T>,
    threshold: f64,
    flagged: usize,
}

/// Main orchestrator combining both analysis paths.
#[derive(Debug, Clone)]
pub struct DualPipeline {
    config: DetectionConfig,
    deriver: FeatureDeriver,
    params: IsolationForestParams,
}

impl DualPipeline {
    /// Create a pipeline, rejecting invalid configuration up front.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            deriver: FeatureDeriver::from_config(&config),
            params: IsolationForestParams::from(&config),
            config,
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run both paths over `records`.
    ///
    /// # Errors
    /// `Feature` for an empty table, `Parse` for the first malformed
    /// timestamp. No partial report is returned in either case.
    pub fn run(&self, records: &[CallRecord]) -> Result<DualAnomalyReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let mut metrics = RunMetrics::default();

        if records.is_empty() {
            return Err(CallwatchError::Feature(
                "input table has no call records".into(),
            ));
        }

        let start = Instant::now();
        let features = self.deriver.derive_all(records)?;
        metrics.record_derive(records.len(), start.elapsed());
        debug!(records = records.len(), "features derived");

        let start = Instant::now();
        let callers = self.caller_level(records, &features)?;
        metrics.record_caller_path(
            callers.rows.len(),
            callers.flagged,
            callers.threshold,
            start.elapsed(),
        );

        let start = Instant::now();
        let calls = self.call_level(records, &features)?;
        let top_calls = top_flagged(&calls.rows, self.config.top_k);
        metrics.record_call_path(calls.flagged, top_calls.len(), calls.threshold, start.elapsed());

        info!(
            %run_id,
            records = metrics.records,
            callers = metrics.callers,
            flagged_callers = metrics.flagged_callers,
            flagged_calls = metrics.flagged_calls,
            top_calls = metrics.top_calls,
            elapsed_ms = metrics.total_ms(),
            "dual anomaly run completed"
        );

        Ok(DualAnomalyReport {
            run_id,
            started_at,
            callers: callers.rows,
            calls: calls.rows,
            top_calls,
            metrics,
        })
    }

    /// Caller path: aggregate → standardize → score → rank.
    fn caller_level(
        &self,
        records: &[CallRecord],
        features: &[DerivedFeatures],
    ) -> Result<PathOutcome<ScoredCaller>> {
        let aggregates = aggregate_callers(records, features);
        let matrix = caller_feature_matrix(&aggregates)?;
        let (_, scaled) = StandardScaler::fit_transform(&matrix)?;
        let scores = fit_score(&scaled, &self.params)?;

        let flagged = scores.flagged_count();
        let mut rows: Vec<ScoredCaller> = aggregates
            .into_iter()
            .zip(scores.scores.iter().zip(&scores.flags))
            .map(|(agg, (&score, &flag))| ScoredCaller::new(agg, score, flag))
            .collect();
        rank_by_score(&mut rows);

        debug!(callers = rows.len(), flagged, "caller path scored");
        Ok(PathOutcome {
            rows,
            threshold: scores.threshold,
            flagged,
        })
    }

    /// Call path: standardize → score → rank.
    fn call_level(
        &self,
        records: &[CallRecord],
        features: &[DerivedFeatures],
    ) -> Result<PathOutcome<ScoredCall>> {
        let matrix = call_feature_matrix(records, features)?;
        let (_, scaled) = StandardScaler::fit_transform(&matrix)?;
        let scores = fit_score(&scaled, &self.params)?;

        let flagged = scores.flagged_count();
        let mut rows: Vec<ScoredCall> = records
            .iter()
            .zip(features)
            .zip(scores.scores.iter().zip(&scores.flags))
            .map(|((record, f), (&score, &flag))| {
                ScoredCall::new(record.clone(), *f, score, flag)
            })
            .collect();
        rank_by_score(&mut rows);

        debug!(calls = rows.len(), flagged, "call path scored");
        Ok(PathOutcome {
            rows,
            threshold: scores.threshold,
            flagged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(caller: &str, receiver: &str, start: &str, duration: f64) -> CallRecord {
        CallRecord {
            caller_id: caller.to_owned(),
            receiver_id: receiver.to_owned(),
            call_start_time: start.to_owned(),
            call_duration: duration,
        }
    }

    #[test]
    fn empty_table_is_feature_error() {
        let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
        assert!(matches!(pipeline.run(&[]), Err(CallwatchError::Feature(_))));
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = DetectionConfig {
            contamination: 0.0,
            ..DetectionConfig::default()
        };
        assert!(matches!(
            DualPipeline::new(cfg),
            Err(CallwatchError::Config(_))
        ));
    }

    #[test]
    fn malformed_timestamp_aborts_run() {
        let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
        let records = vec![
            call("A", "1", "2024-03-01 10:00:00", 60.0),
            call("B", "2", "not-a-date", 60.0),
        ];
        assert!(matches!(
            pipeline.run(&records),
            Err(CallwatchError::Parse { row: 2, .. })
        ));
    }

    #[test]
    fn outputs_are_ranked() {
        let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
        let records: Vec<CallRecord> = (0..30)
            .map(|i| {
                call(
                    &format!("C{}", i % 6),
                    &format!("R{i}"),
                    &format!("2024-03-01 {:02}:00:00", i % 24),
                    (i * 7 % 13) as f64 * 10.0,
                )
            })
            .collect();

        let report = pipeline.run(&records).unwrap();
        assert_eq!(report.callers.len(), 6);
        assert_eq!(report.calls.len(), 30);
        for pair in report.calls.windows(2) {
            assert!(pair[0].anomaly_score >= pair[1].anomaly_score);
        }
        for pair in report.callers.windows(2) {
            assert!(pair[0].anomaly_score >= pair[1].anomaly_score);
        }
        assert!(report.top_calls.iter().all(|c| c.anomaly));
        assert_eq!(report.metrics.records, 30);
    }

    #[test]
    fn report_serializes_with_table_column_names() {
        let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
        let records: Vec<CallRecord> = (0..12)
            .map(|i| call(&format!("C{}", i % 3), "+4420", "2024-03-01 02:00:00", i as f64))
            .collect();
        let report = pipeline.run(&records).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["run_id"], report.run_id.to_string());
        assert_eq!(json["metrics"]["records"], 12);
        assert_eq!(json["metrics"]["callers"], 3);

        let caller = &json["callers"][0];
        assert!(caller["CallerID"].is_string());
        assert!(caller["AnomalyScore"].is_f64());
        assert!(caller["Anomaly"] == 0 || caller["Anomaly"] == 1);

        let call = &json["calls"][0];
        assert_eq!(call["Hour"], 2);
        assert_eq!(call["IsNightCall"], 1);
        assert_eq!(call["IsInternational"], 1);
    }
}
