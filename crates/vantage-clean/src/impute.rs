//! Null imputation.

use std::collections::BTreeMap;

use serde_json::json;

use vantage_model::{
    CellValue, CleaningOperation, ImputationStrategy, Result, SourceTable,
};

use crate::stage::{CleaningStage, StageContext, StageOutcome};

pub struct ImputationStage;

impl CleaningStage for ImputationStage {
    fn operation(&self) -> CleaningOperation {
        CleaningOperation::Imputation
    }

    fn config_snapshot(&self, ctx: &StageContext<'_>) -> serde_json::Value {
        json!({ "imputation": ctx.config.imputation })
    }

    fn apply(&self, table: &mut SourceTable, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();
        for (column, strategy) in &ctx.config.imputation {
            let Some(strategy) = strategy else {
                // A null entry skips the column.
                continue;
            };
            if !table.columns.iter().any(|name| name == column) {
                continue;
            }
            match strategy {
                ImputationStrategy::Median => impute_median(table, column, &mut outcome),
                ImputationStrategy::Mode => impute_mode(table, column, &mut outcome),
                ImputationStrategy::ForwardFill => impute_forward_fill(table, column, &mut outcome),
            }
        }
        Ok(outcome)
    }
}

/// Replaces nulls with the median of the non-null numeric values in the
/// current snapshot.
fn impute_median(table: &mut SourceTable, column: &str, outcome: &mut StageOutcome) {
    let mut values: Vec<f64> = table
        .column_values(column)
        .filter_map(|cell| cell.as_f64())
        .collect();
    if values.is_empty() {
        return;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = median_of_sorted(&values);
    for row in &mut table.rows {
        if row.cell(column).is_null() {
            row.set(column, CellValue::Float(median));
            outcome.cells_changed += 1;
        }
    }
}

/// Replaces nulls with the most frequent non-null value; ties break by the
/// value first encountered in row order.
fn impute_mode(table: &mut SourceTable, column: &str, outcome: &mut StageOutcome) {
    let mut counts: BTreeMap<String, (usize, usize, CellValue)> = BTreeMap::new();
    for (order, cell) in table.column_values(column).enumerate() {
        if cell.is_null() {
            continue;
        }
        let entry = counts
            .entry(cell.display())
            .or_insert_with(|| (0, order, cell.clone()));
        entry.0 += 1;
    }
    let Some(mode) = counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, cell)| cell)
    else {
        return;
    };
    for row in &mut table.rows {
        if row.cell(column).is_null() {
            row.set(column, mode.clone());
            outcome.cells_changed += 1;
        }
    }
}

/// Replaces a null with the previous row's value in the same column.
/// Leading nulls remain null and are reported.
fn impute_forward_fill(table: &mut SourceTable, column: &str, outcome: &mut StageOutcome) {
    let mut last: Option<CellValue> = None;
    let mut leading = 0u64;
    for row in &mut table.rows {
        if row.cell(column).is_null() {
            match &last {
                Some(value) => {
                    row.set(column, value.clone());
                    outcome.cells_changed += 1;
                }
                None => leading += 1,
            }
        } else {
            last = Some(row.cell(column).clone());
        }
    }
    if leading > 0 {
        outcome.leading_nulls.insert(column.to_string(), leading);
    }
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_model::{CleaningConfig, Record, TableProfile};

    fn table_of(column: &str, values: &[&str]) -> SourceTable {
        let mut table = SourceTable::new(vec![column.to_string()]);
        for (idx, value) in values.iter().enumerate() {
            let mut record = Record::new((idx as u64) + 1);
            record.set(column, CellValue::from_raw(value));
            table.push_row(record);
        }
        table
    }

    fn run(table: &mut SourceTable, column: &str, strategy: ImputationStrategy) -> StageOutcome {
        let mut config = CleaningConfig::default();
        config
            .imputation
            .insert(column.to_string(), Some(strategy));
        let profile = TableProfile::default();
        let ctx = StageContext {
            config: &config,
            profile: &profile,
            default_country_code: "1",
        };
        ImputationStage.apply(table, &ctx).unwrap()
    }

    #[test]
    fn median_fills_from_current_snapshot() {
        let mut table = table_of("v", &["1", "", "3", "10", ""]);
        let outcome = run(&mut table, "v", ImputationStrategy::Median);
        assert_eq!(outcome.cells_changed, 2);
        // Median of {1, 3, 10} is 3.
        assert_eq!(table.rows[1].cell("v").display(), "3");
        assert_eq!(table.rows[4].cell("v").display(), "3");
    }

    #[test]
    fn mode_breaks_ties_by_first_row() {
        let mut table = table_of("c", &["b", "a", "b", "a", ""]);
        run(&mut table, "c", ImputationStrategy::Mode);
        assert_eq!(table.rows[4].cell("c").display(), "b");
    }

    #[test]
    fn forward_fill_reports_leading_nulls() {
        let mut table = table_of(
            "date",
            &["", "2024-01-02", "", "2024-01-05", ""],
        );
        let outcome = run(&mut table, "date", ImputationStrategy::ForwardFill);
        let values: Vec<String> = table
            .column_values("date")
            .map(|cell| cell.display())
            .collect();
        assert_eq!(
            values,
            vec!["", "2024-01-02", "2024-01-02", "2024-01-05", "2024-01-05"]
        );
        assert_eq!(outcome.leading_nulls.get("date"), Some(&1));
    }

    #[test]
    fn all_null_column_is_left_alone() {
        let mut table = table_of("v", &["", "", ""]);
        let outcome = run(&mut table, "v", ImputationStrategy::Median);
        assert_eq!(outcome.cells_changed, 0);
        assert_eq!(table.column_null_count("v"), 3);
    }

    #[test]
    fn skip_entry_leaves_nulls() {
        let mut table = table_of("id", &["a", "", "c"]);
        let mut config = CleaningConfig::default();
        config.imputation.insert("id".to_string(), None);
        let profile = TableProfile::default();
        let ctx = StageContext {
            config: &config,
            profile: &profile,
            default_country_code: "1",
        };
        ImputationStage.apply(&mut table, &ctx).unwrap();
        assert_eq!(table.column_null_count("id"), 1);
    }
}
