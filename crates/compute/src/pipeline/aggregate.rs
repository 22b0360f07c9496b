use std::collections::{BTreeMap, HashSet};

use callwatch_core::{CallRecord, CallerAggregate, DerivedFeatures, Result};

use super::matrix::FeatureMatrix;

/// Column names of the caller-level feature matrix, in order.
pub const CALLER_FEATURE_COLUMNS: [&str; 5] = [
    "calls_per_hour",
    "avg_duration",
    "unique_receivers",
    "night_calls",
    "intl_calls",
];

/// Raw counters accumulated from records for a single caller.
#[derive(Default)]
struct CallerAccumulator<'a> {
    call_count: u64,
    duration_sum: f64,
    receivers: HashSet<&'a str>,
    night_calls: u64,
    intl_calls: u64,
}

impl CallerAccumulator<'_> {
    fn finish(self, caller_id: &str) -> CallerAggregate {
        let avg_duration = if self.call_count > 0 {
            self.duration_sum / self.call_count as f64
        } else {
            0.0
        };

        CallerAggregate {
            caller_id: caller_id.to_owned(),
            calls_per_hour: self.call_count,
            avg_duration,
            unique_receivers: self.receivers.len() as u64,
            night_calls: self.night_calls,
            intl_calls: self.intl_calls,
        }
    }
}

/// Collapse per-call records into one summary row per distinct caller.
///
/// `features[i]` must be the derived features of `records[i]`. Output is
/// ordered by caller id.
pub fn aggregate_callers(
    records: &[CallRecord],
    features: &[DerivedFeatures],
) -> Vec<CallerAggregate> {
    debug_assert_eq!(records.len(), features.len());

    let mut by_caller: BTreeMap<&str, CallerAccumulator<'_>> = BTreeMap::new();

    for (record, f) in records.iter().zip(features) {
        let acc = by_caller.entry(record.caller_id.as_str()).or_default();
        acc.call_count += 1;
        acc.duration_sum += record.call_duration;
        acc.receivers.insert(record.receiver_id.as_str());
        acc.night_calls += u64::from(f.is_night_call);
        acc.intl_calls += u64::from(f.is_international);
    }

    by_caller
        .into_iter()
        .map(|(caller_id, acc)| acc.finish(caller_id))
        .collect()
}

/// Produce the 5-dimensional feature vector for a caller.
pub fn caller_feature_vector(agg: &CallerAggregate) -> Vec<f64> {
    vec![
        agg.calls_per_hour as f64,
        agg.avg_duration,
        agg.unique_receivers as f64,
        agg.night_calls as f64,
        agg.intl_calls as f64,
    ]
}

pub fn caller_feature_matrix(aggregates: &[CallerAggregate]) -> Result<FeatureMatrix> {
    FeatureMatrix::from_static(
        &CALLER_FEATURE_COLUMNS,
        aggregates.iter().map(caller_feature_vector).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(caller: &str, receiver: &str, duration: f64) -> CallRecord {
        CallRecord {
            caller_id: caller.into(),
            receiver_id: receiver.into(),
            call_start_time: "2024-03-01 10:00:00".into(),
            call_duration: duration,
        }
    }

    fn feat(night: bool, intl: bool) -> DerivedFeatures {
        DerivedFeatures {
            hour: if night { 3 } else { 12 },
            is_night_call: night,
            is_international: intl,
        }
    }

    #[test]
    fn groups_and_summarizes() {
        let records = vec![
            call("B", "r1", 10.0),
            call("A", "r1", 20.0),
            call("B", "r2", 30.0),
            call("B", "r1", 50.0),
        ];
        let features = vec![
            feat(true, false),
            feat(false, true),
            feat(true, true),
            feat(false, false),
        ];

        let aggs = aggregate_callers(&records, &features);
        assert_eq!(aggs.len(), 2);

        let a = &aggs[0];
        assert_eq!(a.caller_id, "A");
        assert_eq!(a.calls_per_hour, 1);
        assert_eq!(a.avg_duration, 20.0);
        assert_eq!(a.intl_calls, 1);

        let b = &aggs[1];
        assert_eq!(b.caller_id, "B");
        assert_eq!(b.calls_per_hour, 3);
        assert!((b.avg_duration - 30.0).abs() < 1e-12);
        assert_eq!(b.unique_receivers, 2);
        assert_eq!(b.night_calls, 2);
        assert_eq!(b.intl_calls, 1);
    }

    #[test]
    fn empty_input_yields_no_callers() {
        assert!(aggregate_callers(&[], &[]).is_empty());
    }

    #[test]
    fn feature_vector_order() {
        let agg = CallerAggregate {
            caller_id: "X".into(),
            calls_per_hour: 4,
            avg_duration: 12.5,
            unique_receivers: 3,
            night_calls: 2,
            intl_calls: 1,
        };
        assert_eq!(caller_feature_vector(&agg), vec![4.0, 12.5, 3.0, 2.0, 1.0]);
        let m = caller_feature_matrix(&[agg]).unwrap();
        assert_eq!(m.n_cols(), CALLER_FEATURE_COLUMNS.len());
    }
}
