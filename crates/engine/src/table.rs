//! Columnar table built from row-major loader output.
//!
//! Key invariants:
//! - Column order is header order
//! - Column names are unique (a repeated header replaces the earlier column's data)
//! - Rectangular input gives every column exactly `row_count` cells
//! - Ragged input is never padded: short rows simply contribute nothing to
//!   their missing trailing columns, so those columns end up shorter
//! - Construction never fails; shape problems are recorded as `DataShapeError`s

use std::collections::HashMap;

use serde::Serialize;

use crate::cell::{CellValue, RawValue};
use crate::error::{DataShapeError, TableError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    /// Declared row count: the number of input rows
    row_count: usize,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip)]
    shape_issues: Vec<DataShapeError>,
}

impl Table {
    /// Build a table from header labels and row-major raw rows.
    ///
    /// Every raw cell is normalized, rows are transposed into columns, and
    /// headers are bound positionally to the transposed columns. Only the
    /// overlapping prefix of headers and columns is kept.
    pub fn from_raw<H, S>(headers: H, rows: Vec<Vec<RawValue>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row_count = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut shape_issues: Vec<DataShapeError> = rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.len() < width)
            .map(|(row, cells)| DataShapeError::RaggedRow { row, len: cells.len(), width })
            .collect();

        let normalized: Vec<Vec<CellValue>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(CellValue::from_raw).collect())
            .collect();
        let data = transpose(normalized);

        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        if headers.len() > data.len() {
            shape_issues.push(DataShapeError::UnboundHeaders { headers: headers.len(), columns: data.len() });
        } else if headers.len() < data.len() {
            shape_issues.push(DataShapeError::UnnamedColumns { headers: headers.len(), columns: data.len() });
        }

        let mut table = Table {
            columns: Vec::with_capacity(headers.len().min(data.len())),
            row_count,
            index: HashMap::new(),
            shape_issues,
        };

        for (position, (name, cells)) in headers.into_iter().zip(data).enumerate() {
            table.bind(position, Column { name, cells });
        }

        if !table.shape_issues.is_empty() {
            log::warn!("table built with {} shape issue(s)", table.shape_issues.len());
            for issue in &table.shape_issues {
                log::debug!("shape issue: {issue}");
            }
        }
        log::debug!("table built: {} column(s) x {} row(s)", table.columns.len(), row_count);

        table
    }

    /// Build a table from already-typed columns. Cells are taken as they
    /// are, without normalization. The row count is the longest column.
    pub(crate) fn from_columns(columns: Vec<Column>) -> Self {
        let mut table = Table {
            columns: Vec::with_capacity(columns.len()),
            row_count: columns.iter().map(|c| c.cells.len()).max().unwrap_or(0),
            index: HashMap::new(),
            shape_issues: Vec::new(),
        };
        for (position, column) in columns.into_iter().enumerate() {
            table.bind(position, column);
        }
        table
    }

    /// Append a column. A repeated name keeps the first position and takes
    /// the new cells.
    fn bind(&mut self, position: usize, column: Column) {
        match self.index.get(&column.name) {
            Some(&existing) => {
                self.shape_issues.push(DataShapeError::DuplicateHeader { name: column.name.clone(), position });
                if let Some(slot) = self.columns.get_mut(existing) {
                    slot.cells = column.cells;
                }
            }
            None => {
                self.index.insert(column.name.clone(), self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when every column holds exactly `row_count` cells.
    pub fn is_rectangular(&self) -> bool {
        self.columns.iter().all(|c| c.cells.len() == self.row_count)
    }

    pub fn shape_issues(&self) -> &[DataShapeError] {
        &self.shape_issues
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// All columns in header order. This is the read view front ends bind to.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[CellValue])> {
        self.columns.iter().map(|c| (c.name.as_str(), c.cells.as_slice()))
    }

    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.index
            .get(name)
            .and_then(|&i| self.columns.get(i))
            .map(|c| c.cells.as_slice())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, column: &str, row: usize) -> Option<&CellValue> {
        self.column(column).and_then(|cells| cells.get(row))
    }

    /// Row-major view for display and export. Cells missing from short
    /// (ragged) columns come back as `None`.
    pub fn rows(&self) -> Vec<Vec<Option<&CellValue>>> {
        (0..self.row_count)
            .map(|row| self.columns.iter().map(|c| c.cells.get(row)).collect())
            .collect()
    }

    /// Overwrite one cell and return the previous value.
    ///
    /// Only the edit session writes cells; everything else reads.
    pub(crate) fn set(&mut self, column: &str, row: usize, value: CellValue) -> Result<CellValue, TableError> {
        let cells = self.column_cells_mut(column)?;
        let len = cells.len();
        match cells.get_mut(row) {
            Some(cell) => Ok(std::mem::replace(cell, value)),
            None => Err(TableError::RowOutOfRange { column: column.to_string(), row, len }),
        }
    }

    /// Sort one column's cells in place (numbers before text, stable).
    ///
    /// Only this column moves: row `i` of this column no longer lines up
    /// with row `i` of the others afterwards.
    pub fn sort_column(&mut self, name: &str) -> Result<(), TableError> {
        let cells = self.column_cells_mut(name)?;
        cells.sort_by(CellValue::sort_cmp);
        Ok(())
    }

    /// Sort every column independently.
    ///
    /// This is a per-column summary view, NOT a row sort. Row correspondence
    /// across columns is lost: after this call row `i` of one column and row
    /// `i` of another generally come from different input records.
    pub fn sort_all(&mut self) {
        for column in &mut self.columns {
            column.cells.sort_by(CellValue::sort_cmp);
        }
        log::debug!("sorted {} column(s) independently", self.columns.len());
    }

    fn column_cells_mut(&mut self, name: &str) -> Result<&mut Vec<CellValue>, TableError> {
        self.index
            .get(name)
            .copied()
            .and_then(|i| self.columns.get_mut(i))
            .map(|c| &mut c.cells)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }
}

/// Convert row-major data into column-major data.
///
/// The output has as many columns as the longest input row. Column `c`
/// collects position `c` of every row that has one, in row order; shorter
/// rows contribute nothing and nothing is padded. For rectangular input,
/// transposing twice gives back the original.
pub fn transpose<T>(rows: Vec<Vec<T>>) -> Vec<Vec<T>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let height = rows.len();
    let mut columns: Vec<Vec<T>> = (0..width).map(|_| Vec::with_capacity(height)).collect();

    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    columns
}
