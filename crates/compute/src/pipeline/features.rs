use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use callwatch_core::{CallRecord, CallwatchError, DerivedFeatures, DetectionConfig, Result};

use super::matrix::FeatureMatrix;

/// Column names of the call-level feature matrix, in order.
pub const CALL_FEATURE_COLUMNS: [&str; 4] =
    ["CallDuration", "Hour", "IsNightCall", "IsInternational"];

/// Naive layouts tried after RFC 3339, most common first.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Layouts carrying an explicit UTC offset but not strictly RFC 3339.
/// `%#z` also takes hour-only offsets such as `+01`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Zone names accepted as a trailing word, all meaning UTC.
const UTC_NAMES: &[&str] = &["UTC", "GMT", "Z"];

/// Parse a call start time into its wall-clock value.
///
/// Offsets are honored only to the extent of reading the local time as
/// written: `03:00+05:00` is hour 3, never converted to UTC.
pub fn parse_call_start(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    parse_naive(s).or_else(|| parse_naive(strip_utc_name(s)?))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// `"2024-03-01 05:00:00 UTC"` -> `"2024-03-01 05:00:00"`.
fn strip_utc_name(s: &str) -> Option<&str> {
    let (head, zone) = s.rsplit_once(' ')?;
    UTC_NAMES
        .iter()
        .any(|name| zone.eq_ignore_ascii_case(name))
        .then(|| head.trim_end())
}

/// Turns raw call fields into hour, night-call and international signals.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    night_start_hour: u32,
    night_end_hour: u32,
    intl_prefix: String,
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl FeatureDeriver {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            night_start_hour: config.night_start_hour,
            night_end_hour: config.night_end_hour,
            intl_prefix: config.intl_prefix.clone(),
        }
    }

    pub fn is_night(&self, hour: u32) -> bool {
        hour < self.night_end_hour || hour > self.night_start_hour
    }

    pub fn is_international(&self, receiver_id: &str) -> bool {
        receiver_id.trim_start().starts_with(self.intl_prefix.as_str())
    }

    /// Derive features for one record. `row` is only used for error reporting.
    pub fn derive(&self, row: usize, record: &CallRecord) -> Result<DerivedFeatures> {
        let started = parse_call_start(&record.call_start_time).ok_or_else(|| {
            CallwatchError::parse(
                row,
                format!("invalid CallStartTime {:?}", record.call_start_time),
            )
        })?;
        let hour = started.hour();

        Ok(DerivedFeatures {
            hour,
            is_night_call: self.is_night(hour),
            is_international: self.is_international(&record.receiver_id),
        })
    }

    /// Derive features for the whole table. The first malformed record aborts.
    pub fn derive_all(&self, records: &[CallRecord]) -> Result<Vec<DerivedFeatures>> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| self.derive(i + 1, r))
            .collect()
    }
}

/// Build the 4-column call-level matrix: duration, hour, night flag, international flag.
pub fn call_feature_matrix(
    records: &[CallRecord],
    features: &[DerivedFeatures],
) -> Result<FeatureMatrix> {
    let rows = records
        .iter()
        .zip(features)
        .map(|(r, f)| {
            vec![
                r.call_duration,
                f64::from(f.hour),
                f64::from(u8::from(f.is_night_call)),
                f64::from(u8::from(f.is_international)),
            ]
        })
        .collect();
    FeatureMatrix::from_static(&CALL_FEATURE_COLUMNS, rows)
}
