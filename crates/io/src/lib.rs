// File I/O operations

pub mod csv;
pub mod error;
pub mod raw;
pub mod xlsx;

use std::path::Path;

pub use error::FileError;
pub use raw::RawTable;

/// Per-load overrides. Unset fields fall back to sniffing / the first sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Field delimiter for delimited text.
    pub delimiter: Option<u8>,
    /// Worksheet name for workbooks.
    pub sheet: Option<String>,
}

/// Load a file into a raw table, dispatching on the file extension.
pub fn load(path: &Path, options: &LoadOptions) -> Result<RawTable, FileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let raw = match ext.as_str() {
        "csv" | "txt" => crate::csv::import(path, options.delimiter)?,
        "tsv" | "tab" => crate::csv::import(path, Some(options.delimiter.unwrap_or(b'\t')))?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::import(path, options.sheet.as_deref())?,
        _ => return Err(FileError::UnsupportedFormat(ext)),
    };

    log::info!(
        "loaded {}: {} header(s), {} row(s)",
        path.display(),
        raw.headers.len(),
        raw.row_count()
    );
    Ok(raw)
}
