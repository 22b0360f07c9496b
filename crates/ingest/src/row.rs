use serde::Deserialize;

use callwatch_core::{CallRecord, CallwatchError, Result};

/// A source row with every field still as text.
///
/// Parsing happens in [`RawCallRow::into_record`] so failures carry the row
/// number instead of a generic deserializer message.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCallRow {
    #[serde(rename = "CallerID")]
    pub caller_id: String,
    #[serde(rename = "ReceiverID")]
    pub receiver_id: String,
    #[serde(rename = "CallStartTime")]
    pub call_start_time: String,
    #[serde(rename = "CallDuration")]
    pub call_duration: String,
}

impl RawCallRow {
    /// Validate and convert. `row` is the 1-based data row number.
    pub fn into_record(self, row: usize) -> Result<CallRecord> {
        let caller_id = self.caller_id.trim();
        if caller_id.is_empty() {
            return Err(CallwatchError::parse(row, "empty CallerID"));
        }

        let raw = self.call_duration.trim();
        let call_duration: f64 = raw
            .parse()
            .map_err(|_| CallwatchError::parse(row, format!("invalid CallDuration {raw:?}")))?;
        if !call_duration.is_finite() || call_duration < 0.0 {
            return Err(CallwatchError::parse(
                row,
                format!("CallDuration must be a non-negative number, got {raw}"),
            ));
        }

        Ok(CallRecord {
            caller_id: caller_id.to_owned(),
            receiver_id: self.receiver_id.trim().to_owned(),
            call_start_time: self.call_start_time,
            call_duration,
        })
    }
}
