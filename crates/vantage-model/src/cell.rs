//! The loosely typed cell model.
//!
//! Values are stored as a tagged sum; the semantic type of a column is a
//! property of the column (see [`crate::enums::ColumnType`]), never of the
//! individual cell. Parsers are free to emit whichever variant decodes most
//! naturally, and the cleaning stages interpret cells against the detected
//! column type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl CellValue {
    /// Builds a cell from a raw textual field: empty or whitespace-only input
    /// becomes [`CellValue::Null`], everything else is kept as trimmed text.
    pub fn from_raw(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell. Textual cells are parsed so that columns
    /// detected as numeric but decoded as text still participate in
    /// statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Text(s) => parse_f64(s),
            _ => None,
        }
    }

    /// Canonical display form. Null renders as the empty string; floats are
    /// rendered without trailing zeros.
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(v) => v.to_string(),
            CellValue::Float(v) => format_numeric(*v),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

/// Parses a string as i64, returning None for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<i64>().ok()
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_maps_blank_to_null() {
        assert_eq!(CellValue::from_raw(""), CellValue::Null);
        assert_eq!(CellValue::from_raw("   "), CellValue::Null);
        assert_eq!(
            CellValue::from_raw(" hello "),
            CellValue::Text("hello".to_string())
        );
    }

    #[test]
    fn as_f64_parses_text() {
        assert_eq!(CellValue::Text("42.5".to_string()).as_f64(), Some(42.5));
        assert_eq!(CellValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(CellValue::Text("abc".to_string()).as_f64(), None);
        assert_eq!(CellValue::Null.as_f64(), None);
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(CellValue::Float(10.0).display(), "10");
        assert_eq!(CellValue::Float(10.50).display(), "10.5");
        assert_eq!(CellValue::Null.display(), "");
    }

    #[test]
    fn serde_roundtrip() {
        let cell = CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let json = serde_json::to_string(&cell).unwrap();
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(cell, back);
    }
}
