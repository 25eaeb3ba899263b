// CSV/TSV import/export

use std::io::{Read, Write};
use std::path::Path;

use tabula_engine::{RawValue, Table};

use crate::error::FileError;
use crate::raw::RawTable;

/// Import a delimited file. The first record is the header row.
///
/// `delimiter` of `None` sniffs the delimiter from the first lines.
pub fn import(path: &Path, delimiter: Option<u8>) -> Result<RawTable, FileError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    import_from_str(&content, delimiter)
}

/// Delimiters tried when none is given, in tie-break order.
const DELIMITER_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];

/// Lines looked at when guessing the delimiter.
const SNIFF_LINES: usize = 10;

/// Guess the delimiter of a text table from its opening lines.
///
/// The header line fixes the expected width for each candidate. A candidate
/// that leaves the header as a single field is not considered. The rest are
/// scored by how many sampled lines share the header width, times that
/// width. Comma is the answer when no candidate splits the header.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(SNIFF_LINES).collect();
    let Some((header, body)) = sample.split_first() else {
        return b',';
    };

    let mut chosen = (b',', 0usize);
    for delimiter in DELIMITER_CANDIDATES {
        let width = field_count(header, delimiter);
        if width < 2 {
            continue;
        }
        let agreeing = 1 + body.iter().filter(|line| field_count(line, delimiter) == width).count();
        let score = agreeing * width;
        if score > chosen.1 {
            chosen = (delimiter, score);
        }
    }
    chosen.0
}

/// Fields on one line, honoring quotes. Unreadable lines count as one field.
fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Read a text table into a string. Bytes that are not UTF-8 are decoded as
/// Windows-1252 and a leading byte order mark is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, FileError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// Parse delimited text. Records may have different lengths; they are kept
/// as-is for the table to report.
pub fn import_from_str(content: &str, delimiter: u8) -> Result<RawTable, FileError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Err(FileError::Empty),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        rows.push(record.iter().map(raw_field).collect());
    }

    log::debug!("csv: {} header(s), {} row(s)", headers.len(), rows.len());
    Ok(RawTable { headers, rows })
}

fn raw_field(field: &str) -> RawValue {
    if field.is_empty() {
        RawValue::Empty
    } else {
        RawValue::Text(field.to_string())
    }
}

pub fn export(table: &Table, path: &Path) -> Result<(), FileError> {
    let file = std::fs::File::create(path)?;
    write_table(table, file, b',')
}

/// Write the header row followed by every row. Cells missing from short
/// columns are written as empty fields.
pub fn write_table<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<(), FileError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(writer);

    writer.write_record(table.column_names())?;
    for row in table.rows() {
        let record: Vec<String> = row
            .iter()
            .map(|cell| cell.map(|v| v.raw_display()).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
