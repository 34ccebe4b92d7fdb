//! In-memory row records and tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// One parsed record of a source file.
///
/// Row numbers are 1-based and contiguous within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub row_number: u64,
    pub cells: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(row_number: u64) -> Self {
        Self {
            row_number,
            cells: BTreeMap::new(),
        }
    }

    /// Cell for a column, treating an absent entry as null.
    pub fn cell(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&CellValue::Null)
    }

    pub fn set(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }
}

/// An ordered set of records with an explicit column order.
///
/// The column order is the source file's own order; the per-record cell maps
/// are keyed by column name so that sparse records (JSON, XML) do not force
/// positional alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl SourceTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Record) {
        self.rows.push(row);
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// All cells of one column in row order. Missing entries read as null.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> {
        self.rows.iter().map(move |row| row.cell(column))
    }

    /// Total null cells across the declared columns.
    pub fn null_count(&self) -> u64 {
        let mut count = 0;
        for row in &self.rows {
            for column in &self.columns {
                if row.cell(column).is_null() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Null cells in a single column.
    pub fn column_null_count(&self, column: &str) -> u64 {
        self.column_values(column)
            .filter(|cell| cell.is_null())
            .count() as u64
    }

    /// Reassigns contiguous 1-based row numbers after rows were removed.
    pub fn renumber(&mut self) {
        for (idx, row) in self.rows.iter_mut().enumerate() {
            row.row_number = (idx as u64) + 1;
        }
    }
}
