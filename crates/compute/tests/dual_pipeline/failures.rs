use callwatch_compute::DualPipeline;
use callwatch_core::{CallwatchError, DetectionConfig};

use crate::helpers::{make_call, quiet_callers_and_spammer};

#[test]
fn malformed_timestamp_produces_no_tables() {
    let mut records = quiet_callers_and_spammer();
    records.push(make_call("D", "5550003", "not-a-date", 30.0));

    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    match pipeline.run(&records) {
        Err(CallwatchError::Parse { row, message }) => {
            assert_eq!(row, records.len());
            assert!(message.contains("not-a-date"));
        }
        Err(other) => panic!("expected parse error, got {other}"),
        Ok(_) => panic!("expected parse error, got a report"),
    }
}

#[test]
fn empty_table_is_a_feature_error() {
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let err = pipeline.run(&[]).unwrap_err();
    assert!(matches!(err, CallwatchError::Feature(_)));
    assert_eq!(err.kind(), "feature");
}

#[test]
fn single_call_does_not_crash() {
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let report = pipeline
        .run(&[make_call("A", "1", "2024-03-01 10:00:00", 10.0)])
        .unwrap();
    assert_eq!(report.callers.len(), 1);
    assert_eq!(report.calls.len(), 1);
    assert!(report.top_calls.is_empty());
}

#[test]
fn bad_config_fails_before_running() {
    let config = DetectionConfig {
        n_trees: 0,
        ..DetectionConfig::default()
    };
    assert!(matches!(
        DualPipeline::new(config),
        Err(CallwatchError::Config(_))
    ));
}
