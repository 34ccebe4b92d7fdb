//! Column type detection and summary statistics.
//!
//! Classification skips null cells and applies the rules in a fixed
//! priority order; the first matching rule wins:
//!
//! 1. `text_id` when the unique-value ratio exceeds 0.95
//! 2. `numeric` when at least 80% of values parse as integer or float
//! 3. `date` when at least 60% match a recognised date format
//! 4. `phone` when at least 70% match a 10-15 digit phone pattern
//! 5. `email` when at least 70% look like addresses
//! 6. `boolean` when at least 90% come from the closed true/false set
//! 7. `categorical` when the unique-value ratio is below 0.05
//! 8. `text` otherwise

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use vantage_model::{CellValue, ColumnProfile, ColumnType, SourceTable, TableProfile};

const TEXT_ID_UNIQUE_RATIO: f64 = 0.95;
const NUMERIC_SHARE: f64 = 0.80;
const DATE_SHARE: f64 = 0.60;
const PHONE_SHARE: f64 = 0.70;
const EMAIL_SHARE: f64 = 0.70;
const BOOLEAN_SHARE: f64 = 0.90;
const CATEGORICAL_UNIQUE_RATIO: f64 = 0.05;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-().]{7,20}$").expect("phone pattern"));
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
});

/// Date formats the detector recognises.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y"];
const DATETIME_FORMATS: [&str; 1] = ["%Y-%m-%d %H:%M:%S"];

/// Profiling knobs.
#[derive(Debug, Clone, Copy)]
pub struct ProfileOptions {
    /// Maximum number of example values to keep per column.
    pub sample_limit: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self { sample_limit: 5 }
    }
}

/// Profiles every declared column of a table.
pub fn profile_table(table: &SourceTable) -> TableProfile {
    profile_table_with(table, ProfileOptions::default())
}

pub fn profile_table_with(table: &SourceTable, options: ProfileOptions) -> TableProfile {
    let columns = table
        .columns
        .iter()
        .map(|name| profile_column(table, name, options))
        .collect();
    TableProfile { columns }
}

fn profile_column(table: &SourceTable, name: &str, options: ProfileOptions) -> ColumnProfile {
    let count = table.height() as u64;
    let non_null: Vec<&CellValue> = table
        .column_values(name)
        .filter(|cell| !cell.is_null())
        .collect();
    let null_count = count - non_null.len() as u64;

    let mut unique = std::collections::BTreeSet::new();
    let mut samples = Vec::new();
    for cell in &non_null {
        let display = cell.display();
        if unique.insert(display.clone()) && samples.len() < options.sample_limit {
            samples.push(display);
        }
    }
    let unique_count = unique.len() as u64;
    let unique_ratio = if non_null.is_empty() {
        0.0
    } else {
        unique_count as f64 / non_null.len() as f64
    };

    let column_type = detect_type(&non_null, unique_ratio);

    let numeric_values: Vec<f64> = non_null.iter().filter_map(|cell| cell.as_f64()).collect();
    let (min, max, mean, median, std_dev, q1, q3) =
        if column_type == ColumnType::Numeric && !numeric_values.is_empty() {
            numeric_summary(&numeric_values)
        } else {
            (None, None, None, None, None, None, None)
        };

    let mode = if column_type == ColumnType::Numeric {
        None
    } else {
        mode_value(&non_null)
    };

    ColumnProfile {
        name: name.to_string(),
        column_type,
        count,
        null_count,
        unique_count,
        unique_ratio,
        min,
        max,
        mean,
        median,
        std_dev,
        q1,
        q3,
        mode,
        samples,
    }
}

fn detect_type(non_null: &[&CellValue], unique_ratio: f64) -> ColumnType {
    if non_null.is_empty() {
        return ColumnType::Text;
    }
    let total = non_null.len() as f64;
    if unique_ratio > TEXT_ID_UNIQUE_RATIO {
        return ColumnType::TextId;
    }
    let numeric = non_null.iter().filter(|c| c.as_f64().is_some()).count() as f64;
    if numeric / total >= NUMERIC_SHARE {
        return ColumnType::Numeric;
    }
    let dates = non_null.iter().filter(|c| is_date_cell(c)).count() as f64;
    if dates / total >= DATE_SHARE {
        return ColumnType::Date;
    }
    let phones = non_null.iter().filter(|c| is_phone(&c.display())).count() as f64;
    if phones / total >= PHONE_SHARE {
        return ColumnType::Phone;
    }
    let emails = non_null
        .iter()
        .filter(|c| EMAIL_PATTERN.is_match(c.display().trim()))
        .count() as f64;
    if emails / total >= EMAIL_SHARE {
        return ColumnType::Email;
    }
    let booleans = non_null
        .iter()
        .filter(|c| is_boolean_token(&c.display()))
        .count() as f64;
    if booleans / total >= BOOLEAN_SHARE {
        return ColumnType::Boolean;
    }
    if unique_ratio < CATEGORICAL_UNIQUE_RATIO {
        return ColumnType::Categorical;
    }
    ColumnType::Text
}

fn is_date_cell(cell: &CellValue) -> bool {
    match cell {
        CellValue::Date(_) => true,
        CellValue::Text(s) => parse_known_date(s).is_some(),
        _ => false,
    }
}

/// Parses one of the recognised date formats.
pub fn parse_known_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(datetime.date());
        }
    }
    None
}

fn is_phone(value: &str) -> bool {
    let trimmed = value.trim();
    if !PHONE_PATTERN.is_match(trimmed) {
        return false;
    }
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits)
}

fn is_boolean_token(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "0" | "1" | "y" | "n"
    )
}

fn mode_value(non_null: &[&CellValue]) -> Option<String> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (order, cell) in non_null.iter().enumerate() {
        let entry = counts.entry(cell.display()).or_insert((0, order));
        entry.0 += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| {
            // Highest count wins; earliest first occurrence breaks ties.
            a.1.0.cmp(&b.1.0).then(b.1.1.cmp(&a.1.1))
        })
        .map(|(value, _)| value)
}

type Summary = (
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

fn numeric_summary(values: &[f64]) -> Summary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len() as f64;
    let min = sorted.first().copied();
    let max = sorted.last().copied();
    let mean = sorted.iter().sum::<f64>() / n;
    let median = quantile(&sorted, 0.5);
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    (
        min,
        max,
        Some(mean),
        Some(median),
        Some(variance.sqrt()),
        Some(q1),
        Some(q3),
    )
}

/// Linear-interpolation quantile over a sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = q * (sorted.len() - 1) as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let weight = position - low as f64;
        sorted[low] * (1.0 - weight) + sorted[high] * weight
    }
}
