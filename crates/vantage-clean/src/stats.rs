//! Snapshot statistics computation.

use vantage_model::{SnapshotStats, SourceTable, TableProfile};

use crate::dedupe::row_signature;

/// Computes the aggregate statistics of one table snapshot.
///
/// The duplicate count uses the same normalised key encoding as the
/// deduplication stage over all columns, so the number reported before
/// dedup matches the rows that stage will remove.
pub fn snapshot(table: &SourceTable, profile: &TableProfile, flagged_outliers: u64) -> SnapshotStats {
    let mut seen = std::collections::BTreeSet::new();
    let mut duplicates = 0u64;
    for row in &table.rows {
        let Some(key) = row_signature(row, &table.columns, profile) else {
            continue;
        };
        if !seen.insert(key) {
            duplicates += 1;
        }
    }
    SnapshotStats {
        total_rows: table.height() as u64,
        total_columns: table.width() as u64,
        null_count: table.null_count(),
        duplicate_count: duplicates,
        flagged_outliers,
        leading_nulls: Default::default(),
        standardization_failures: Default::default(),
    }
}
