pub mod csv_import;
pub mod parquet_import;
pub mod plot;
pub mod report;
mod row;

use std::path::Path;

use callwatch_core::{CallRecord, Result};

pub use csv_import::CsvImporter;
pub use parquet_import::ParquetImporter;
pub use report::{ReportPaths, ReportWriter};

/// Load a call table, choosing the reader from the file extension.
/// Anything that is not `.parquet` is read as CSV.
pub fn import_table(path: &Path) -> Result<Vec<CallRecord>> {
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        ParquetImporter::import(path)
    } else {
        CsvImporter::import(path)
    }
}
