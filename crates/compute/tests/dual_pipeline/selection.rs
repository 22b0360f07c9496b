use callwatch_compute::DualPipeline;
use callwatch_core::DetectionConfig;

use crate::helpers::synthetic_table;

#[test]
fn top_k_is_the_best_flagged_prefix() {
    let records = synthetic_table(1500, 80, 3);
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let report = pipeline.run(&records).unwrap();

    let flagged: Vec<_> = report.flagged_calls().collect();
    let k = pipeline.config().top_k;
    assert_eq!(report.top_calls.len(), k.min(flagged.len()));
    assert!(report.top_calls.iter().all(|c| c.anomaly));

    // The selection is exactly the first flagged rows of the ranking.
    for (selected, ranked) in report.top_calls.iter().zip(&flagged) {
        assert_eq!(selected, *ranked);
    }

    let lowest_selected = report
        .top_calls
        .iter()
        .map(|c| c.anomaly_score)
        .fold(f64::INFINITY, f64::min);
    for rest in flagged.iter().skip(report.top_calls.len()) {
        assert!(rest.anomaly_score <= lowest_selected);
    }

    // The full ranking is still exposed alongside the view.
    assert_eq!(report.calls.len(), records.len());
}

#[test]
fn small_k_bounds_the_selection() {
    let records = synthetic_table(400, 30, 17);
    let config = DetectionConfig {
        top_k: 3,
        ..DetectionConfig::default()
    };
    let pipeline = DualPipeline::new(config).unwrap();
    let report = pipeline.run(&records).unwrap();

    let flagged = report.flagged_calls().count();
    assert_eq!(report.top_calls.len(), 3.min(flagged));
    assert_eq!(report.metrics.top_calls, report.top_calls.len());
    assert_eq!(report.metrics.flagged_calls, flagged);
}

#[test]
fn flag_count_tracks_contamination_on_callers() {
    let records = synthetic_table(4000, 200, 5);
    let pipeline = DualPipeline::new(DetectionConfig::default()).unwrap();
    let report = pipeline.run(&records).unwrap();

    let n = report.callers.len() as f64;
    let expected = (0.05 * n).round() as i64;
    let got = report.flagged_callers().count() as i64;
    assert!((got - expected).abs() <= 1, "flagged {got}, expected {expected}");
}
