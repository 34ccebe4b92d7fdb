//! Default cleaning configuration synthesis.
//!
//! Detected column types map onto stage settings:
//!
//! | type        | imputation   | standardisation | outliers          |
//! |-------------|--------------|-----------------|-------------------|
//! | numeric     | MEDIAN       | none            | when unique > 10  |
//! | date        | FORWARD-FILL | ISO 8601        | off               |
//! | phone       | MODE         | E.164           | off               |
//! | email       | MODE         | lowercase       | off               |
//! | boolean     | MODE         | none            | off               |
//! | categorical | MODE         | none            | off               |
//! | text_id     | skip         | none            | off               |
//! | text        | none         | none            | off               |
//!
//! Deduplication is enabled whenever an exact duplicate row exists in a
//! sample of the first 1000 rows.

use vantage_model::{
    CleaningConfig, ColumnType, ImputationStrategy, SourceTable, StandardizationRule,
    TableProfile,
};

/// Rows sampled for the duplicate check.
const DEDUP_SAMPLE_ROWS: usize = 1000;

/// Unique-count floor above which a numeric column turns outlier detection
/// on.
const OUTLIER_UNIQUE_FLOOR: u64 = 10;

/// Synthesises the default configuration for a profiled table. The result
/// is a pure function of the profile and the sampled rows, so repeated
/// calls yield identical configurations.
pub fn build_auto_config(table: &SourceTable, profile: &TableProfile) -> CleaningConfig {
    let mut config = CleaningConfig::default();

    for column in &profile.columns {
        match column.column_type {
            ColumnType::Numeric => {
                config
                    .imputation
                    .insert(column.name.clone(), Some(ImputationStrategy::Median));
                if column.unique_count > OUTLIER_UNIQUE_FLOOR {
                    config.outliers.enabled = true;
                }
            }
            ColumnType::Date => {
                config
                    .imputation
                    .insert(column.name.clone(), Some(ImputationStrategy::ForwardFill));
                config
                    .standardization
                    .insert(column.name.clone(), StandardizationRule::Iso8601);
            }
            ColumnType::Phone => {
                config
                    .imputation
                    .insert(column.name.clone(), Some(ImputationStrategy::Mode));
                config
                    .standardization
                    .insert(column.name.clone(), StandardizationRule::E164);
            }
            ColumnType::Email => {
                config
                    .imputation
                    .insert(column.name.clone(), Some(ImputationStrategy::Mode));
                config
                    .standardization
                    .insert(column.name.clone(), StandardizationRule::Lowercase);
            }
            ColumnType::Boolean | ColumnType::Categorical => {
                config
                    .imputation
                    .insert(column.name.clone(), Some(ImputationStrategy::Mode));
            }
            ColumnType::TextId => {
                // Identifiers are never imputed; the null entry records the
                // decision explicitly.
                config.imputation.insert(column.name.clone(), None);
            }
            ColumnType::Text => {}
        }
    }

    config.deduplication.enabled = has_exact_duplicates(table);
    config
}

/// Fills the gaps of a user-supplied configuration from the auto-derived
/// defaults. Only per-column entries are inherited: a column the user
/// never mentioned gets the detector's strategy, while an explicit `null`
/// entry keeps its skip meaning.
pub fn merge_with_defaults(mut user: CleaningConfig, defaults: &CleaningConfig) -> CleaningConfig {
    for (column, strategy) in &defaults.imputation {
        user.imputation
            .entry(column.clone())
            .or_insert_with(|| *strategy);
    }
    for (column, rule) in &defaults.standardization {
        user.standardization.entry(column.clone()).or_insert(*rule);
    }
    user
}

/// True when the first sampled rows contain at least one exact duplicate.
pub fn has_exact_duplicates(table: &SourceTable) -> bool {
    let mut seen = std::collections::BTreeSet::new();
    for row in table.rows.iter().take(DEDUP_SAMPLE_ROWS) {
        let mut key = String::new();
        let mut any_value = false;
        for column in &table.columns {
            let display = row.cell(column).display();
            if !display.is_empty() {
                any_value = true;
            }
            key.push_str(&display);
            key.push('\u{1f}');
        }
        if any_value && !seen.insert(key) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_model::{CellValue, ColumnProfile, Record};

    fn profile_of(columns: &[(&str, ColumnType, u64)]) -> TableProfile {
        TableProfile {
            columns: columns
                .iter()
                .map(|(name, column_type, unique_count)| ColumnProfile {
                    name: (*name).to_string(),
                    column_type: *column_type,
                    count: 100,
                    null_count: 0,
                    unique_count: *unique_count,
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
                })
                .collect(),
        }
    }

    fn empty_table(columns: &[&str]) -> SourceTable {
        SourceTable::new(columns.iter().map(|c| (*c).to_string()).collect())
    }

    #[test]
    fn type_mapping_matches_the_contract() {
        let profile = profile_of(&[
            ("amount", ColumnType::Numeric, 50),
            ("joined", ColumnType::Date, 30),
            ("phone", ColumnType::Phone, 40),
            ("email", ColumnType::Email, 40),
            ("active", ColumnType::Boolean, 2),
            ("tier", ColumnType::Categorical, 3),
            ("id", ColumnType::TextId, 100),
            ("note", ColumnType::Text, 90),
        ]);
        let table = empty_table(&[
            "amount", "joined", "phone", "email", "active", "tier", "id", "note",
        ]);
        let config = build_auto_config(&table, &profile);

        assert_eq!(
            config.imputation.get("amount"),
            Some(&Some(ImputationStrategy::Median))
        );
        assert_eq!(
            config.imputation.get("joined"),
            Some(&Some(ImputationStrategy::ForwardFill))
        );
        assert_eq!(
            config.imputation.get("phone"),
            Some(&Some(ImputationStrategy::Mode))
        );
        assert_eq!(config.imputation.get("id"), Some(&None));
        assert_eq!(config.imputation.get("note"), None);

        assert_eq!(
            config.standardization.get("joined"),
            Some(&StandardizationRule::Iso8601)
        );
        assert_eq!(
            config.standardization.get("phone"),
            Some(&StandardizationRule::E164)
        );
        assert_eq!(
            config.standardization.get("email"),
            Some(&StandardizationRule::Lowercase)
        );
        assert_eq!(config.standardization.get("amount"), None);

        assert!(config.outliers.enabled);
        assert!(!config.outliers.remove);
    }

    #[test]
    fn outliers_stay_off_for_low_cardinality_numerics() {
        let profile = profile_of(&[("score", ColumnType::Numeric, 5)]);
        let table = empty_table(&["score"]);
        let config = build_auto_config(&table, &profile);
        assert!(!config.outliers.enabled);
    }

    #[test]
    fn duplicate_sample_enables_dedup() {
        let mut table = empty_table(&["a"]);
        for (idx, value) in ["x", "y", "x"].iter().enumerate() {
            let mut record = Record::new((idx as u64) + 1);
            record.set("a", CellValue::from_raw(value));
            table.push_row(record);
        }
        let profile = profile_of(&[("a", ColumnType::Text, 2)]);
        let config = build_auto_config(&table, &profile);
        assert!(config.deduplication.enabled);
    }

    #[test]
    fn merge_keeps_explicit_entries_and_fills_gaps() {
        let profile = profile_of(&[
            ("amount", ColumnType::Numeric, 50),
            ("joined", ColumnType::Date, 30),
        ]);
        let table = empty_table(&["amount", "joined"]);
        let defaults = build_auto_config(&table, &profile);

        let mut user = CleaningConfig::default();
        user.imputation.insert("amount".to_string(), None);
        let merged = merge_with_defaults(user, &defaults);

        // The explicit skip survives; the untouched column inherits.
        assert_eq!(merged.imputation.get("amount"), Some(&None));
        assert_eq!(
            merged.imputation.get("joined"),
            Some(&Some(ImputationStrategy::ForwardFill))
        );
        assert_eq!(
            merged.standardization.get("joined"),
            Some(&StandardizationRule::Iso8601)
        );
    }

    #[test]
    fn auto_config_is_idempotent() {
        let mut table = empty_table(&["v"]);
        for idx in 0..20u64 {
            let mut record = Record::new(idx + 1);
            record.set("v", CellValue::Int(idx as i64));
            table.push_row(record);
        }
        let profile = profile_of(&[("v", ColumnType::Numeric, 20)]);
        let first = build_auto_config(&table, &profile);
        let second = build_auto_config(&table, &profile);
        assert_eq!(first, second);
    }
}
