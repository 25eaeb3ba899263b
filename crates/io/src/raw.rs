use tabula_engine::{RawValue, Table};

/// Loader output: a header row plus row-major raw cells, exactly as read.
///
/// Rows may be ragged; `into_table` leaves that for the table to report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, in cells.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn into_table(self) -> Table {
        Table::from_raw(self.headers, self.rows)
    }
}
