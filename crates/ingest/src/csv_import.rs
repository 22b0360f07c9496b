use std::io::Read;
use std::path::Path;

use callwatch_core::{CallRecord, CallwatchError, Result};
use tracing::info;

use crate::row::RawCallRow;

pub struct CsvImporter;

impl CsvImporter {
    pub fn import(path: &Path) -> Result<Vec<CallRecord>> {
        let file = std::fs::File::open(path).map_err(CallwatchError::Io)?;
        let records = Self::import_reader(file)?;
        info!("Imported {} call records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Read a headered CSV. Columns other than the four call fields are ignored.
    pub fn import_reader<R: Read>(reader: R) -> Result<Vec<CallRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut records = Vec::new();
        for (i, result) in rdr.deserialize::<RawCallRow>().enumerate() {
            let row = i + 1;
            let raw = result.map_err(|e| CallwatchError::Csv(format!("row {row}: {e}")))?;
            records.push(raw.into_record(row)?);
        }
        Ok(records)
    }
}
