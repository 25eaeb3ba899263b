// Excel workbook import (xlsx, xlsm, xls, xlsb, ods)
//
// One sheet is read into a raw table. The first row of the sheet's used
// range is the header row.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use tabula_engine::RawValue;

use crate::error::FileError;
use crate::raw::RawTable;

/// Import one sheet. `sheet` of `None` takes the first sheet in the workbook.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<RawTable, FileError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| FileError::SheetNotFound(name.to_string()))?,
        None => sheet_names.first().cloned().ok_or(FileError::NoSheets)?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let (height, width) = range.get_size();
    log::debug!("xlsx: sheet '{}' is {}x{}", sheet_name, height, width);

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(header_label).collect(),
        None => return Err(FileError::Empty),
    };

    let rows: Vec<Vec<RawValue>> = rows
        .map(|row| row.iter().map(raw_value).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, FileError> {
    let workbook: Sheets<_> = open_workbook_auto(path)?;
    Ok(workbook.sheet_names().to_vec())
}

fn raw_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Empty,
        Data::String(s) if s.is_empty() => RawValue::Empty,
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Float(n) => RawValue::Number(*n),
        Data::Int(n) => RawValue::Integer(*n),
        Data::Bool(b) => RawValue::Bool(*b),
        // Error cells keep their error text so they surface as text, not as numbers
        Data::Error(e) => RawValue::Text(format!("#{:?}", e)),
        // Dates are carried as their serial number
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}

/// Header cells become labels; numbers print without a trailing `.0`.
fn header_label(cell: &Data) -> String {
    match raw_value(cell) {
        RawValue::Empty => String::new(),
        RawValue::Text(s) => s,
        RawValue::Integer(n) => n.to_string(),
        RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        RawValue::Number(n) => n.to_string(),
        RawValue::Bool(b) => if b { "TRUE" } else { "FALSE" }.to_string(),
    }
}
