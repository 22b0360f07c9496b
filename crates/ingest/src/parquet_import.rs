use std::path::Path;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use callwatch_core::{CallRecord, CallwatchError, Result};
use tracing::info;

use crate::row::RawCallRow;

const REQUIRED_COLUMNS: [&str; 4] = ["CallerID", "ReceiverID", "CallStartTime", "CallDuration"];

pub struct ParquetImporter;

impl ParquetImporter {
    pub fn import(path: &Path) -> Result<Vec<CallRecord>> {
        let file = std::fs::File::open(path).map_err(CallwatchError::Io)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| CallwatchError::Parquet(e.to_string()))?;

        let reader = builder
            .build()
            .map_err(|e| CallwatchError::Parquet(e.to_string()))?;

        let mut records = Vec::new();
        let mut row_offset = 0;

        for batch_result in reader {
            let batch = batch_result.map_err(|e| CallwatchError::Parquet(e.to_string()))?;
            let columns = text_columns(&batch)?;

            for row_idx in 0..batch.num_rows() {
                let cell = |col: usize| -> String {
                    let arr = &columns[col];
                    if arr.is_null(row_idx) {
                        String::new()
                    } else {
                        arr.value(row_idx).to_owned()
                    }
                };
                let raw = RawCallRow {
                    caller_id: cell(0),
                    receiver_id: cell(1),
                    call_start_time: cell(2),
                    call_duration: cell(3),
                };
                records.push(raw.into_record(row_offset + row_idx + 1)?);
            }
            row_offset += batch.num_rows();
        }

        info!("Imported {} call records from {}", records.len(), path.display());
        Ok(records)
    }
}

/// Pull the four call columns out of a batch as text, whatever their
/// physical type. Numeric IDs and durations are stringified so the
/// row validation is shared with the CSV path.
fn text_columns(batch: &RecordBatch) -> Result<Vec<StringArray>> {
    REQUIRED_COLUMNS
        .iter()
        .map(|name| {
            let column: &ArrayRef = batch.column_by_name(name).ok_or_else(|| {
                CallwatchError::Parquet(format!("missing required column {name}"))
            })?;
            let utf8 = cast(column, &DataType::Utf8)
                .map_err(|e| CallwatchError::Parquet(format!("column {name}: {e}")))?;
            utf8.as_any()
                .downcast_ref::<StringArray>()
                .cloned()
                .ok_or_else(|| CallwatchError::Parquet(format!("column {name} is not text")))
        })
        .collect()
}
