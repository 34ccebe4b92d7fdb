//! IQR outlier detection.

use serde_json::json;

use vantage_model::{CleaningOperation, ColumnType, Result, SourceTable};

use crate::stage::{CleaningStage, StageContext, StageOutcome};

pub struct OutlierStage;

impl CleaningStage for OutlierStage {
    fn operation(&self) -> CleaningOperation {
        CleaningOperation::OutlierDetection
    }

    fn config_snapshot(&self, ctx: &StageContext<'_>) -> serde_json::Value {
        json!({ "outliers": ctx.config.outliers })
    }

    fn apply(&self, table: &mut SourceTable, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();
        let settings = &ctx.config.outliers;
        if !settings.enabled {
            return Ok(outcome);
        }
        let k = settings.threshold;

        for column in table.columns.clone() {
            if ctx.profile.column_type(&column) != Some(ColumnType::Numeric) {
                continue;
            }
            let mut values: Vec<(u64, f64)> = Vec::new();
            for row in &table.rows {
                if let Some(value) = row.cell(&column).as_f64() {
                    values.push((row.row_number, value));
                }
            }
            if values.len() < 4 {
                continue;
            }
            let mut sorted: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let q1 = quantile(&sorted, 0.25);
            let q3 = quantile(&sorted, 0.75);
            let iqr = q3 - q1;
            let lower = q1 - k * iqr;
            let upper = q3 + k * iqr;
            for (row_number, value) in values {
                if value < lower || value > upper {
                    outcome.flagged_rows.insert(row_number);
                }
            }
        }

        if settings.remove && !outcome.flagged_rows.is_empty() {
            let flagged = outcome.flagged_rows.clone();
            let before = table.height() as u64;
            table.rows.retain(|row| !flagged.contains(&row.row_number));
            table.renumber();
            outcome.rows_removed = before - table.height() as u64;
        }
        Ok(outcome)
    }
}

/// Linear-interpolation quantile over a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
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

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_model::{
        CellValue, CleaningConfig, ColumnProfile, Record, TableProfile,
    };

    fn numeric_profile(column: &str, unique_count: u64) -> TableProfile {
        TableProfile {
            columns: vec![ColumnProfile {
                name: column.to_string(),
                column_type: ColumnType::Numeric,
                count: 9,
                null_count: 0,
                unique_count,
                unique_ratio: 0.5,
                min: None,
                max: None,
                mean: None,
                median: None,
                std_dev: None,
                q1: None,
                q3: None,
                mode: None,
                samples: Vec::new(),
            }],
        }
    }

    fn table_of(column: &str, values: &[&str]) -> SourceTable {
        let mut table = SourceTable::new(vec![column.to_string()]);
        for (idx, value) in values.iter().enumerate() {
            let mut record = Record::new((idx as u64) + 1);
            record.set(column, CellValue::from_raw(value));
            table.push_row(record);
        }
        table
    }

    fn run(table: &mut SourceTable, remove: bool) -> StageOutcome {
        let mut config = CleaningConfig::default();
        config.outliers.enabled = true;
        config.outliers.remove = remove;
        let profile = numeric_profile("v", 5);
        let ctx = StageContext {
            config: &config,
            profile: &profile,
            default_country_code: "1",
        };
        OutlierStage.apply(table, &ctx).unwrap()
    }

    #[test]
    fn flags_without_removing_by_default() {
        let mut table = table_of("v", &["1", "2", "2", "3", "3", "3", "4", "4", "100"]);
        let outcome = run(&mut table, false);
        // Q1=2, Q3=4, IQR=2: bounds are [-1, 7], so only 100 is out.
        assert_eq!(outcome.flagged_rows.len(), 1);
        assert!(outcome.flagged_rows.contains(&9));
        assert_eq!(table.height(), 9);
    }

    #[test]
    fn remove_drops_flagged_rows_and_renumbers() {
        let mut table = table_of("v", &["1", "2", "2", "3", "3", "3", "4", "4", "100"]);
        let outcome = run(&mut table, true);
        assert_eq!(outcome.rows_removed, 1);
        assert_eq!(table.height(), 8);
        assert_eq!(table.rows.last().unwrap().row_number, 8);
    }

    #[test]
    fn disabled_stage_is_a_no_op() {
        let mut table = table_of("v", &["1", "2", "3", "1000"]);
        let config = CleaningConfig::default();
        let profile = numeric_profile("v", 4);
        let ctx = StageContext {
            config: &config,
            profile: &profile,
            default_country_code: "1",
        };
        let outcome = OutlierStage.apply(&mut table, &ctx).unwrap();
        assert!(outcome.flagged_rows.is_empty());
    }

    #[test]
    fn non_numeric_columns_are_ignored() {
        let mut table = table_of("v", &["a", "b", "c", "d", "e"]);
        let mut config = CleaningConfig::default();
        config.outliers.enabled = true;
        let profile = TableProfile {
            columns: vec![ColumnProfile {
                column_type: ColumnType::Text,
                ..numeric_profile("v", 5).columns[0].clone()
            }],
        };
        let ctx = StageContext {
            config: &config,
            profile: &profile,
            default_country_code: "1",
        };
        let outcome = OutlierStage.apply(&mut table, &ctx).unwrap();
        assert!(outcome.flagged_rows.is_empty());
    }
}
