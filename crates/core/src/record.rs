use serde::{Deserialize, Serialize};

/// One call-detail record as read from the source table.
///
/// Column names follow the source table headers so the same struct reads
/// and writes CSV without a mapping layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(rename = "CallerID")]
    pub caller_id: String,
    #[serde(rename = "ReceiverID")]
    pub receiver_id: String,
    /// Start time exactly as written in the source; parsed during feature derivation.
    #[serde(rename = "CallStartTime")]
    pub call_start_time: String,
    /// Duration in seconds.
    #[serde(rename = "CallDuration")]
    pub call_duration: f64,
}

/// Signals derived from a single [`CallRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// Wall-clock hour of the call start, 0-23.
    pub hour: u32,
    pub is_night_call: bool,
    pub is_international: bool,
}

/// Per-caller behavioral summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallerAggregate {
    pub caller_id: String,
    /// Raw number of calls placed by this caller in the batch (not a rate).
    pub calls_per_hour: u64,
    pub avg_duration: f64,
    pub unique_receivers: u64,
    pub night_calls: u64,
    pub intl_calls: u64,
}

/// Caller-level output row: the aggregate plus its anomaly verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCaller {
    #[serde(rename = "CallerID")]
    pub caller_id: String,
    pub calls_per_hour: u64,
    pub avg_duration: f64,
    pub unique_receivers: u64,
    pub night_calls: u64,
    pub intl_calls: u64,
    #[serde(rename = "AnomalyScore")]
    pub anomaly_score: f64,
    #[serde(rename = "Anomaly", with = "flag")]
    pub anomaly: bool,
}

impl ScoredCaller {
    pub fn new(aggregate: CallerAggregate, anomaly_score: f64, anomaly: bool) -> Self {
        Self {
            caller_id: aggregate.caller_id,
            calls_per_hour: aggregate.calls_per_hour,
            avg_duration: aggregate.avg_duration,
            unique_receivers: aggregate.unique_receivers,
            night_calls: aggregate.night_calls,
            intl_calls: aggregate.intl_calls,
            anomaly_score,
            anomaly,
        }
    }
}

/// Call-level output row: the original record, its derived features and the verdict.
///
/// Kept flat (no nested structs) because CSV writers cannot serialize nested maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCall {
    #[serde(rename = "CallerID")]
    pub caller_id: String,
    #[serde(rename = "ReceiverID")]
    pub receiver_id: String,
    #[serde(rename = "CallStartTime")]
    pub call_start_time: String,
    #[serde(rename = "CallDuration")]
    pub call_duration: f64,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "IsNightCall", with = "flag")]
    pub is_night_call: bool,
    #[serde(rename = "IsInternational", with = "flag")]
    pub is_international: bool,
    #[serde(rename = "AnomalyScore")]
    pub anomaly_score: f64,
    #[serde(rename = "Anomaly", with = "flag")]
    pub anomaly: bool,
}

impl ScoredCall {
    pub fn new(
        record: CallRecord,
        features: DerivedFeatures,
        anomaly_score: f64,
        anomaly: bool,
    ) -> Self {
        Self {
            caller_id: record.caller_id,
            receiver_id: record.receiver_id,
            call_start_time: record.call_start_time,
            call_duration: record.call_duration,
            hour: features.hour,
            is_night_call: features.is_night_call,
            is_international: features.is_international,
            anomaly_score,
            anomaly,
        }
    }
}

/// Serde adapter writing booleans as `0`/`1`, the convention of the result tables.
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "expected 0 or 1, got {other}"
            ))),
        }
    }
}
