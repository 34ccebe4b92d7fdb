//! Value standardisation.
//!
//! The last stage re-emits values in canonical formats. Unparseable values
//! remain unchanged and are counted per column.

use serde_json::json;

use vantage_model::{
    CellValue, CleaningOperation, Result, SourceTable, StandardizationRule,
};

use crate::datetime;
use crate::stage::{CleaningStage, StageContext, StageOutcome};

pub struct StandardizationStage;

impl CleaningStage for StandardizationStage {
    fn operation(&self) -> CleaningOperation {
        CleaningOperation::Standardization
    }

    fn config_snapshot(&self, ctx: &StageContext<'_>) -> serde_json::Value {
        json!({ "standardization": ctx.config.standardization })
    }

    fn apply(&self, table: &mut SourceTable, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();
        for (column, rule) in &ctx.config.standardization {
            if !table.columns.iter().any(|name| name == column) {
                continue;
            }
            let mut failures = 0u64;
            for row in &mut table.rows {
                let cell = row.cell(column).clone();
                if cell.is_null() {
                    continue;
                }
                match standardize_cell(&cell, *rule, ctx.default_country_code) {
                    Outcome::Changed(new_cell) => {
                        row.set(column.clone(), new_cell);
                        outcome.cells_changed += 1;
                    }
                    Outcome::Unchanged => {}
                    Outcome::Failed => failures += 1,
                }
            }
            if failures > 0 {
                outcome
                    .standardization_failures
                    .insert(column.clone(), failures);
            }
        }
        Ok(outcome)
    }
}

enum Outcome {
    Changed(CellValue),
    Unchanged,
    Failed,
}

fn standardize_cell(cell: &CellValue, rule: StandardizationRule, country_code: &str) -> Outcome {
    match rule {
        StandardizationRule::E164 => standardize_phone(&cell.display(), country_code),
        StandardizationRule::Lowercase => match cell {
            CellValue::Text(s) => {
                let lowered = s.trim().to_lowercase();
                if &lowered == s {
                    Outcome::Unchanged
                } else {
                    Outcome::Changed(CellValue::Text(lowered))
                }
            }
            _ => Outcome::Unchanged,
        },
        StandardizationRule::Iso8601 => match cell {
            // Date cells already render canonically.
            CellValue::Date(_) => Outcome::Unchanged,
            other => match datetime::parse_flexible(&other.display()) {
                Some(date) => Outcome::Changed(CellValue::Date(date)),
                None => Outcome::Failed,
            },
        },
        StandardizationRule::Number => standardize_number(cell),
    }
}

/// Re-emits a phone number as `+<country>-<XXXXX>-<XXXXX>`, using the
/// deployment-wide default country code when the number carries none.
fn standardize_phone(raw: &str, default_country: &str) -> Outcome {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(10..=15).contains(&digits.len()) {
        return Outcome::Failed;
    }
    let (country, rest) = if digits.len() == 10 {
        (default_country.to_string(), digits.as_str())
    } else {
        let split = digits.len() - 10;
        (digits[..split].to_string(), &digits[split..])
    };
    let formatted = format!("+{country}-{}-{}", &rest[..5], &rest[5..]);
    if formatted == raw {
        Outcome::Unchanged
    } else {
        Outcome::Changed(CellValue::Text(formatted))
    }
}

/// Re-emits a numeric string as a canonical decimal with two fractional
/// digits. Grouping separators follow the en-US convention.
fn standardize_number(cell: &CellValue) -> Outcome {
    let value = match cell {
        CellValue::Int(v) => *v as f64,
        CellValue::Float(v) => *v,
        CellValue::Text(s) => {
            let cleaned = s.trim().replace(',', "");
            match cleaned.parse::<f64>() {
                Ok(v) => v,
                Err(_) => return Outcome::Failed,
            }
        }
        _ => return Outcome::Failed,
    };
    Outcome::Changed(CellValue::Text(format!("{value:.2}")))
}
