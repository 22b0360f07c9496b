mod helpers;

use callwatch_compute::DualPipeline;
use callwatch_core::{CallwatchError, DetectionConfig};
use callwatch_ingest::{import_table, ReportWriter};

use helpers::{spam_csv, temp_dir};

#[test]
fn csv_to_reports_end_to_end() {
    let dir = temp_dir();
    let input = dir.join("calls.csv");
    std::fs::write(&input, spam_csv()).unwrap();

    let records = import_table(&input).unwrap();
    assert_eq!(records.len(), 56);

    let report = DualPipeline::new(DetectionConfig::default())
        .unwrap()
        .run(&records)
        .unwrap();
    assert_eq!(report.callers[0].caller_id, "9999");

    let out = dir.join("output");
    let paths = ReportWriter::new(&out, 10).write(&report, "test").unwrap();
    let top = std::fs::read_to_string(paths.top_calls).unwrap();
    assert!(top.lines().count() <= 11);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_file_is_io_error() {
    let dir = temp_dir();
    let result = import_table(&dir.join("nope.csv"));
    assert!(matches!(result, Err(CallwatchError::Io(_))));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn negative_duration_rejected_with_row() {
    let dir = temp_dir();
    let input = dir.join("calls.csv");
    std::fs::write(
        &input,
        "CallerID,ReceiverID,CallStartTime,CallDuration\n1,2,2024-03-01 10:00:00,-5\n",
    )
    .unwrap();

    assert!(matches!(
        import_table(&input),
        Err(CallwatchError::Parse { row: 1, .. })
    ));
    std::fs::remove_dir_all(&dir).ok();
}
