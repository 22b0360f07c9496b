use std::collections::HashSet;

use callwatch_compute::DualPipeline;
use callwatch_core::DetectionConfig;

use crate::helpers::{quiet_callers_and_spammer, synthetic_table};

#[test]
fn spammer_is_the_only_flagged_caller() {
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let report = pipeline.run(&quiet_callers_and_spammer()).unwrap();

    assert_eq!(report.callers.len(), 4);

    let flagged: Vec<&str> = report
        .flagged_callers()
        .map(|c| c.caller_id.as_str())
        .collect();
    assert_eq!(flagged, vec!["SPAM"]);

    // Ranked output: the spammer comes first with the highest score.
    let top = &report.callers[0];
    assert_eq!(top.caller_id, "SPAM");
    assert!(report.callers[1..]
        .iter()
        .all(|c| c.anomaly_score < top.anomaly_score));

    assert_eq!(top.calls_per_hour, 50);
    assert_eq!(top.unique_receivers, 50);
    assert_eq!(top.night_calls, 50);
    assert_eq!(top.intl_calls, 50);
}

#[test]
fn every_caller_and_call_appears_exactly_once() {
    let records = synthetic_table(600, 40, 9);
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let report = pipeline.run(&records).unwrap();

    let distinct: HashSet<&str> = records.iter().map(|r| r.caller_id.as_str()).collect();
    let out: Vec<&str> = report.callers.iter().map(|c| c.caller_id.as_str()).collect();
    let out_set: HashSet<&str> = out.iter().copied().collect();
    assert_eq!(out.len(), distinct.len());
    assert_eq!(out_set, distinct);

    assert_eq!(report.calls.len(), records.len());
    let mut input_keys: Vec<(String, String, String)> = records
        .iter()
        .map(|r| (r.caller_id.clone(), r.receiver_id.clone(), r.call_start_time.clone()))
        .collect();
    let mut output_keys: Vec<(String, String, String)> = report
        .calls
        .iter()
        .map(|c| (c.caller_id.clone(), c.receiver_id.clone(), c.call_start_time.clone()))
        .collect();
    input_keys.sort();
    output_keys.sort();
    assert_eq!(input_keys, output_keys);
}

#[test]
fn same_seed_same_scores() {
    let records = synthetic_table(300, 25, 21);
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();

    let a = pipeline.run(&records).unwrap();
    let b = pipeline.run(&records).unwrap();

    let scores = |r: &callwatch_compute::DualAnomalyReport| {
        (
            r.callers
                .iter()
                .map(|c| (c.caller_id.clone(), c.anomaly_score.to_bits()))
                .collect::<Vec<_>>(),
            r.calls
                .iter()
                .map(|c| c.anomaly_score.to_bits())
                .collect::<Vec<_>>(),
        )
    };
    assert_eq!(scores(&a), scores(&b));
    assert_ne!(a.run_id, b.run_id);
}

#[test]
fn derived_features_are_carried_into_call_rows() {
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let report = pipeline.run(&quiet_callers_and_spammer()).unwrap();

    for call in &report.calls {
        if call.caller_id == "SPAM" {
            assert_eq!(call.hour, 3);
            assert!(call.is_night_call);
            assert!(call.is_international);
        } else {
            assert!(!call.is_night_call);
            assert!(!call.is_international);
        }
    }
}
