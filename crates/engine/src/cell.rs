use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A cell exactly as a loader produced it, before normalization.
///
/// CSV readers only ever produce `Text`; workbook readers hand over typed
/// values. Nothing outside table construction should hold on to these.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Number(f64),
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Integer(n)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

/// Normalized cell content: a number or a piece of text, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl CellValue {
    /// Normalize a raw value. Numeric interpretation is tried first and text
    /// is the fallback, so this never fails.
    pub fn from_raw(raw: RawValue) -> Self {
        match raw {
            RawValue::Number(n) => CellValue::Number(n),
            RawValue::Integer(n) => CellValue::Number(n as f64),
            RawValue::Text(s) => match parse_number(&s) {
                Some(n) => CellValue::Number(n),
                None => CellValue::Text(s),
            },
            // Stored as TRUE/FALSE text
            RawValue::Bool(b) => CellValue::Text(if b { "TRUE" } else { "FALSE" }.to_string()),
            RawValue::Empty => CellValue::Text(String::new()),
        }
    }

    /// Normalize user-typed input, e.g. the new value of an edited cell.
    pub fn from_input(input: &str) -> Self {
        match parse_number(input) {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(input.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Number(_) => None,
            CellValue::Text(s) => Some(s),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Total order used by column sorts.
    ///
    /// Numbers sort before text. Numbers compare by value (NaN last), text
    /// compares lexicographically by code point. Never panics.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    fn sort_key(&self) -> SortKey<'_> {
        match self {
            CellValue::Number(n) => SortKey::Number(OrderedFloat(*n)),
            CellValue::Text(s) => SortKey::Text(s),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_display())
    }
}

/// Variant order is the type rank: Number < Text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Number(OrderedFloat<f64>),
    Text(&'a str),
}

/// Interpret text as a double. Surrounding whitespace is ignored; `inf`,
/// `nan` and other non-finite spellings stay text.
fn parse_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
