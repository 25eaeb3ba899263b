use thiserror::Error;

/// Errors from addressing a cell or column that does not exist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("row {row} is out of range for column '{column}' ({len} rows)")]
    RowOutOfRange { column: String, row: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("percentile requires a parameter in [0, 1]")]
    MissingPercentile,

    #[error("percentile {0} is outside [0, 1]")]
    InvalidPercentile(f64),
}

/// Data-quality findings recorded while building a table.
///
/// None of these abort construction: the table is built from whatever
/// overlaps and the findings are kept for the caller to report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataShapeError {
    /// A row was shorter than the widest row; its trailing columns got no value.
    #[error("row {row} has {len} value(s), expected {width}")]
    RaggedRow { row: usize, len: usize, width: usize },

    /// More data columns than headers; the extra columns were dropped.
    #[error("{columns} data column(s) but only {headers} header(s); extra columns dropped")]
    UnnamedColumns { headers: usize, columns: usize },

    /// More headers than data columns; the extra headers were not bound.
    #[error("{headers} header(s) but only {columns} data column(s); extra headers ignored")]
    UnboundHeaders { headers: usize, columns: usize },

    /// A header label repeated; the later column replaced the earlier one.
    #[error("duplicate header '{name}' at position {position}; later column wins")]
    DuplicateHeader { name: String, position: usize },
}
