//! The stage abstraction shared by the four cleaning operations.

use std::collections::{BTreeMap, BTreeSet};

use vantage_model::{CleaningConfig, CleaningOperation, Result, SourceTable, TableProfile};

/// Read-only context handed to every stage.
pub struct StageContext<'a> {
    pub config: &'a CleaningConfig,
    /// Profile of the table as it entered the pipeline; column types are
    /// stable across stages.
    pub profile: &'a TableProfile,
    /// Deployment-wide country code used when a phone number has none.
    pub default_country_code: &'a str,
}

/// Per-stage findings folded into the after-statistics.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    /// Nulls forward-fill could not replace, per column.
    pub leading_nulls: BTreeMap<String, u64>,
    /// Values a standardisation rule left unchanged, per column.
    pub standardization_failures: BTreeMap<String, u64>,
    /// Row numbers flagged as outliers.
    pub flagged_rows: BTreeSet<u64>,
    pub rows_removed: u64,
    pub cells_changed: u64,
}

/// One cleaning stage. Stages are pure over the table snapshot: they read
/// the current rows, mutate them in place, and report what they did.
pub trait CleaningStage {
    fn operation(&self) -> CleaningOperation;

    /// The slice of the configuration this stage ran with, recorded in the
    /// audit log.
    fn config_snapshot(&self, ctx: &StageContext<'_>) -> serde_json::Value;

    fn apply(&self, table: &mut SourceTable, ctx: &StageContext<'_>) -> Result<StageOutcome>;
}
