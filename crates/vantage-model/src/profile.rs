//! Column profiles produced by the type detector.
//!
//! A profile carries the inferred semantic type together with the summary
//! statistics the cleaning stages need for imputation and outlier detection.

use serde::{Deserialize, Serialize};

use crate::enums::ColumnType;

/// Inferred type and summary statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    /// Total cells, including nulls.
    pub count: u64,
    pub null_count: u64,
    pub unique_count: u64,
    /// Unique values over non-null values.
    pub unique_ratio: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    /// Most frequent non-null value, for non-numeric columns.
    pub mode: Option<String>,
    /// Up to five example values.
    pub samples: Vec<String>,
}

impl ColumnProfile {
    pub fn non_null_count(&self) -> u64 {
        self.count - self.null_count
    }
}

/// Profiles for every column of a table, in column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableProfile {
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    pub fn get(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|profile| profile.name == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.get(name).map(|profile| profile.column_type)
    }

    pub fn has_date_column(&self) -> bool {
        self.columns
            .iter()
            .any(|profile| profile.column_type == ColumnType::Date)
    }
}
