use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("file contains no data")]
    Empty,

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("unsupported file format: '{0}'")]
    UnsupportedFormat(String),
}
